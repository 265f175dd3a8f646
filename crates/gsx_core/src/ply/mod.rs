//! Binary PLY support for Gaussian-splat scenes.
//!
//! The decoder is a linear pipeline:
//!
//! 1. [`parse_header`] reads the ASCII header (format, elements, properties)
//! 2. [`VertexSchema`] validates the `vertex` element and computes byte offsets
//! 3. [`ShLayout`] derives the spherical harmonics layout from the `f_rest_*` count
//! 4. [`decode_records`] walks the record section through a [`RecordView`]
//!
//! ## Supported
//!
//! - `binary_little_endian` and `binary_big_endian`
//! - Any vertex property order; extra scalar properties are skipped
//! - Fixed-size elements declared before `vertex`
//!
//! ## Not Supported
//!
//! - `ascii` PLY
//! - List properties on the vertex element

mod decoder;
mod error;
mod header;
mod layout;
mod schema;
mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use decoder::*;
pub use error::*;
pub use header::*;
pub use layout::*;
pub use schema::*;
pub use view::*;
