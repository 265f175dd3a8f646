//! Progress reporting and cancellation.
//!
//! Long-running imports report a completion fraction in `[0, 1]` to a
//! [`ProgressSink`]. A sink answers each report with
//! [`ControlFlow::Continue`] or [`ControlFlow::Break`]; a break aborts the
//! import with `DecodeError::Cancelled`.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives completion fractions from an import.
pub trait ProgressSink {
    /// Called with a fraction in `[0, 1]`. Fractions never decrease during
    /// one import and the last one reported on success is exactly `1.0`.
    fn report(&mut self, fraction: f32) -> ControlFlow<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(f32) -> ControlFlow<()>,
{
    fn report(&mut self, fraction: f32) -> ControlFlow<()> {
        self(fraction)
    }
}

/// Discards all reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f32) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Sink adapter for closures that never cancel. See [`from_fn`].
#[derive(Clone, Debug)]
pub struct FnProgress<F>(F);

impl<F: FnMut(f32)> ProgressSink for FnProgress<F> {
    fn report(&mut self, fraction: f32) -> ControlFlow<()> {
        (self.0)(fraction);
        ControlFlow::Continue(())
    }
}

/// Wrap an observer closure that has no say in cancellation.
pub fn from_fn<F: FnMut(f32)>(f: F) -> FnProgress<F> {
    FnProgress(f)
}

/// Maps `[0, 1]` onto `[lo, hi]` of an outer sink.
///
/// Used when an import is one stage of a larger job.
#[derive(Debug)]
pub struct ProgressRange<'a, S: ProgressSink + ?Sized> {
    inner: &'a mut S,
    lo: f32,
    hi: f32,
}

impl<'a, S: ProgressSink + ?Sized> ProgressRange<'a, S> {
    pub fn new(inner: &'a mut S, lo: f32, hi: f32) -> Self {
        Self { inner, lo, hi }
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for ProgressRange<'_, S> {
    fn report(&mut self, fraction: f32) -> ControlFlow<()> {
        let fraction = fraction.clamp(0.0, 1.0);
        self.inner.report(self.lo + (self.hi - self.lo) * fraction)
    }
}

/// Shared flag that asks a running import to stop.
///
/// Clones share the flag, so one clone can be handed to another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// A sink that forwards to `inner` until the token is cancelled.
    pub fn wrap<'a, S: ProgressSink + ?Sized>(&self, inner: &'a mut S) -> Cancellable<'a, S> {
        Cancellable {
            token: self.clone(),
            inner,
        }
    }
}

impl ProgressSink for CancelToken {
    fn report(&mut self, _fraction: f32) -> ControlFlow<()> {
        if self.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// See [`CancelToken::wrap`].
#[derive(Debug)]
pub struct Cancellable<'a, S: ProgressSink + ?Sized> {
    token: CancelToken,
    inner: &'a mut S,
}

impl<S: ProgressSink + ?Sized> ProgressSink for Cancellable<'_, S> {
    fn report(&mut self, fraction: f32) -> ControlFlow<()> {
        if self.token.is_cancelled() {
            return ControlFlow::Break(());
        }
        self.inner.report(fraction)
    }
}

/// Logs progress at `info` level every tenth of the way.
#[derive(Debug)]
pub struct LogProgress {
    label: String,
    next_step: u32,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next_step: 0,
        }
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, fraction: f32) -> ControlFlow<()> {
        let step = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
        if step >= self.next_step {
            log::info!("{}: {:>3}%", self.label, step * 10);
            self.next_step = step + 1;
        }
        ControlFlow::Continue(())
    }
}
