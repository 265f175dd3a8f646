//! Record decoding into a [`GaussianScene`].

use std::ops::ControlFlow;

use gsx_math::{Vec3, Vec4};

use super::error::{DecodeError, DecodeResult};
use super::layout::{RestOrder, ShLayout};
use super::schema::{rest_property_name, VertexSchema};
use super::view::RecordView;
use crate::progress::ProgressSink;
use crate::scene::GaussianScene;

/// Byte offsets of every attribute within one record, resolved once per file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldOffsets {
    pub position: [usize; 3],
    pub opacity: usize,
    pub scale: [usize; 3],
    pub rotation: [usize; 4],
    /// `[coefficient][channel]`, coefficient 0 is the DC term
    pub coefficients: Vec<[usize; 3]>,
}

impl FieldOffsets {
    /// Look up every attribute by name in declared order.
    pub fn resolve(
        schema: &VertexSchema,
        layout: &ShLayout,
        order: RestOrder,
    ) -> DecodeResult<Self> {
        let offset = |name: &str| {
            schema.byte_offset(name).ok_or_else(|| {
                DecodeError::unsupported(format!("vertex element is missing \"{}\"", name))
            })
        };

        let mut coefficients = Vec::with_capacity(layout.coefficients_per_channel());
        coefficients.push([offset("f_dc_0")?, offset("f_dc_1")?, offset("f_dc_2")?]);
        for j in 1..layout.coefficients_per_channel() {
            let mut channels = [0usize; 3];
            for (k, slot) in channels.iter_mut().enumerate() {
                *slot = offset(&rest_property_name(layout.rest_index(order, j, k)))?;
            }
            coefficients.push(channels);
        }

        Ok(Self {
            position: [offset("x")?, offset("y")?, offset("z")?],
            opacity: offset("opacity")?,
            scale: [offset("scale_0")?, offset("scale_1")?, offset("scale_2")?],
            rotation: [
                offset("rot_0")?,
                offset("rot_1")?,
                offset("rot_2")?,
                offset("rot_3")?,
            ],
            coefficients,
        })
    }
}

/// Decode every record of `view` into `scene`.
///
/// `scene` must already be sized for `view.len()` records with the same
/// coefficient count as `offsets`. Progress goes out as `0.0` first, then
/// `(i + 1) / count` every `progress_interval` records, then exactly `1.0`.
/// A `Break` from the sink stops decoding with [`DecodeError::Cancelled`].
pub fn decode_records<S: ProgressSink + ?Sized>(
    view: &RecordView<'_>,
    offsets: &FieldOffsets,
    scene: &mut GaussianScene,
    progress_interval: usize,
    progress: &mut S,
) -> DecodeResult<()> {
    let count = view.len();
    let cpc = offsets.coefficients.len();
    debug_assert_eq!(scene.len(), count);
    debug_assert_eq!(scene.sh_coefficients_count(), cpc);

    let interval = progress_interval.max(1);
    report(progress, 0.0)?;

    for i in 0..count {
        let record = view.record(i)?;
        let vec3 = |o: &[usize; 3]| -> DecodeResult<Vec3> {
            Ok(Vec3::new(
                record.f32_at(o[0])?,
                record.f32_at(o[1])?,
                record.f32_at(o[2])?,
            ))
        };

        scene.positions[i] = vec3(&offsets.position)?;
        scene.opacities[i] = record.f32_at(offsets.opacity)?;
        scene.scales[i] = vec3(&offsets.scale)?;
        scene.rotations[i] = Vec4::new(
            record.f32_at(offsets.rotation[0])?,
            record.f32_at(offsets.rotation[1])?,
            record.f32_at(offsets.rotation[2])?,
            record.f32_at(offsets.rotation[3])?,
        );
        for (j, channels) in offsets.coefficients.iter().enumerate() {
            scene.sh_coefficients[i * cpc + j] = vec3(channels)?;
        }

        let done = i + 1;
        if done % interval == 0 && done < count {
            report(progress, (done as f64 / count as f64) as f32)?;
        }
    }

    report(progress, 1.0)
}

fn report<S: ProgressSink + ?Sized>(progress: &mut S, fraction: f32) -> DecodeResult<()> {
    match progress.report(fraction) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(DecodeError::Cancelled),
    }
}
