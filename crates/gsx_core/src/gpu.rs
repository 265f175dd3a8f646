//! GPU-ready packing of a [`GaussianScene`].
//!
//! Every attribute is padded to a `vec4<f32>` so the buffers can be bound
//! as storage buffers without std430 stride surprises.

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use thiserror::Error;

use crate::scene::GaussianScene;

/// Errors from packing a scene for upload.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackError {
    #[error("{field} of {value} does not fit in a u32 shader constant")]
    TooLarge { field: &'static str, value: usize },
}

/// Scene constants for a shader uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SceneParams {
    pub count: u32,
    pub sh_dim: u32,
    pub sh_coefficients_count: u32,
    pub _pad: u32,
}

impl SceneParams {
    /// Fails when a count does not fit in 32 bits.
    pub fn new(
        count: usize,
        sh_dim: u32,
        sh_coefficients_count: usize,
    ) -> Result<Self, PackError> {
        let narrow = |field: &'static str, value: usize| {
            u32::try_from(value).map_err(|_| PackError::TooLarge { field, value })
        };
        Ok(Self {
            count: narrow("count", count)?,
            sh_dim,
            sh_coefficients_count: narrow("sh_coefficients_count", sh_coefficients_count)?,
            _pad: 0,
        })
    }
}

/// Vec4-packed attribute buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedScene {
    pub params: SceneParams,
    /// xyz = position, w = opacity
    pub position_opacity: Vec<[f32; 4]>,
    /// Quaternion in file order
    pub rotation: Vec<[f32; 4]>,
    /// xyz = scale, w = 0
    pub scale: Vec<[f32; 4]>,
    /// rgb per coefficient, w = 0; `count * sh_coefficients_count` entries
    pub sh_coefficients: Vec<[f32; 4]>,
}

impl PackedScene {
    /// Pack a scene. Attributes are packed in parallel.
    pub fn pack(scene: &GaussianScene) -> Result<Self, PackError> {
        let params = SceneParams::new(scene.len(), scene.sh_dim(), scene.sh_coefficients_count())?;

        let position_opacity = scene
            .positions()
            .par_iter()
            .zip(scene.opacities().par_iter())
            .map(|(p, &o)| [p.x, p.y, p.z, o])
            .collect();
        let rotation = scene.rotations().par_iter().map(|r| r.to_array()).collect();
        let scale = scene
            .scales()
            .par_iter()
            .map(|s| s.extend(0.0).to_array())
            .collect();
        let sh_coefficients = scene
            .sh_coefficients()
            .par_iter()
            .map(|c| c.extend(0.0).to_array())
            .collect();

        log::debug!(
            "Packed {} gaussians for GPU ({} SH coefficients each)",
            params.count,
            params.sh_coefficients_count
        );

        Ok(Self {
            params,
            position_opacity,
            rotation,
            scale,
            sh_coefficients,
        })
    }

    pub fn params_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    pub fn position_opacity_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.position_opacity)
    }

    pub fn rotation_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rotation)
    }

    pub fn scale_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.scale)
    }

    pub fn sh_coefficients_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sh_coefficients)
    }

    /// Total size of all attribute buffers in bytes.
    pub fn total_bytes(&self) -> usize {
        self.position_opacity_bytes().len()
            + self.rotation_bytes().len()
            + self.scale_bytes().len()
            + self.sh_coefficients_bytes().len()
    }
}
