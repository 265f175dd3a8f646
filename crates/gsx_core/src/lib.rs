//! GSX Core - Gaussian-splat scene import.
//!
//! This crate provides:
//!
//! - **PLY decoding**: header parsing, vertex schema discovery, spherical
//!   harmonics layout derivation and bounds-checked record decoding
//! - **Scene types**: `GaussianScene` (structure-of-arrays) with an
//!   array-of-records adapter
//! - **GPU packing**: `PackedScene`, vec4-aligned buffers ready for upload
//! - **Progress and cancellation**: `ProgressSink`, `ProgressRange`, `CancelToken`
//!
//! # Example
//!
//! ```ignore
//! use gsx_core::import::import_ply;
//!
//! let scene = import_ply("garden.ply")?;
//! println!("Loaded {} gaussians, SH degree {}",
//!     scene.len(),
//!     scene.sh_dim());
//! ```

pub mod gpu;
pub mod import;
pub mod ply;
pub mod progress;
pub mod scene;

// Re-export commonly used types
pub use gpu::{PackError, PackedScene};
pub use import::{decode_ply, decode_ply_bytes, import_ply, import_ply_with, ImportError, ImportOptions};
pub use ply::{DecodeError, ErrorKind, RestOrder, ShLayout};
pub use progress::{CancelToken, NoProgress, ProgressRange, ProgressSink};
pub use scene::{GaussianRecord, GaussianScene};
