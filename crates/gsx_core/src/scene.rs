//! Gaussian-splat scene types.
//!
//! [`GaussianScene`] stores every attribute in its own contiguous array
//! (structure-of-arrays), the shape GPU consumers upload. [`GaussianRecord`]
//! is the per-point view for code that prefers array-of-structs.

use gsx_math::{Aabb, Vec3, Vec4};
use thiserror::Error;

use crate::ply::ShLayout;

/// Errors from assembling a scene out of records.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("Record {index} has {found} coefficients on channel {channel}, expected {expected}")]
    InconsistentCoefficients {
        index: usize,
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Records must carry at least the DC coefficient")]
    NoCoefficients,
}

/// One Gaussian as a self-contained record.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianRecord {
    pub position: Vec3,

    /// Opacity as stored (typically a logit)
    pub opacity: f32,

    /// Per-axis scale as stored (typically log-space)
    pub scale: Vec3,

    /// Rotation quaternion components in file order, not normalized
    pub rotation: Vec4,

    /// SH coefficients, `[channel][coefficient]`; coefficient 0 is DC
    pub coefficients: [Vec<f32>; 3],
}

impl GaussianRecord {
    pub fn coefficients_per_channel(&self) -> usize {
        self.coefficients[0].len()
    }

    /// DC term of each channel as (r, g, b).
    pub fn dc(&self) -> Vec3 {
        let c = |k: usize| self.coefficients[k].first().copied().unwrap_or(0.0);
        Vec3::new(c(0), c(1), c(2))
    }
}

/// A decoded Gaussian-splat scene in structure-of-arrays form.
///
/// Every per-point array holds exactly [`len`](Self::len) entries and
/// `sh_coefficients` holds `len * sh_coefficients_count` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianScene {
    pub(crate) name: String,
    pub(crate) layout: ShLayout,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) scales: Vec<Vec3>,
    pub(crate) rotations: Vec<Vec4>,
    pub(crate) opacities: Vec<f32>,
    pub(crate) sh_coefficients: Vec<Vec3>,
}

impl GaussianScene {
    /// Zero-filled scene sized for `count` points.
    pub(crate) fn allocate(name: impl Into<String>, layout: ShLayout, count: usize) -> Self {
        Self {
            name: name.into(),
            layout,
            positions: vec![Vec3::ZERO; count],
            scales: vec![Vec3::ZERO; count],
            rotations: vec![Vec4::ZERO; count],
            opacities: vec![0.0; count],
            sh_coefficients: vec![Vec3::ZERO; count * layout.coefficients_per_channel()],
        }
    }

    /// Build a scene from records. All records must share one coefficient count.
    pub fn from_records(
        name: impl Into<String>,
        records: &[GaussianRecord],
    ) -> Result<Self, SceneError> {
        let cpc = records.first().map_or(1, |r| r.coefficients_per_channel());
        let layout = ShLayout::from_coefficients_per_channel(cpc).ok_or(SceneError::NoCoefficients)?;

        let mut scene = Self::allocate(name, layout, records.len());
        for (i, record) in records.iter().enumerate() {
            for (channel, coefficients) in record.coefficients.iter().enumerate() {
                if coefficients.len() != cpc {
                    return Err(SceneError::InconsistentCoefficients {
                        index: i,
                        channel,
                        expected: cpc,
                        found: coefficients.len(),
                    });
                }
            }
            scene.positions[i] = record.position;
            scene.opacities[i] = record.opacity;
            scene.scales[i] = record.scale;
            scene.rotations[i] = record.rotation;
            for j in 0..cpc {
                scene.sh_coefficients[i * cpc + j] = Vec3::new(
                    record.coefficients[0][j],
                    record.coefficients[1][j],
                    record.coefficients[2][j],
                );
            }
        }
        Ok(scene)
    }

    /// Scene name (usually the file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of Gaussians.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn layout(&self) -> ShLayout {
        self.layout
    }

    /// SH degree, `round(sqrt(sh_coefficients_count)) - 1`.
    ///
    /// Exact only when the coefficient count is a perfect square.
    pub fn sh_dim(&self) -> u32 {
        self.layout.sh_dim()
    }

    /// Coefficients per colour channel, DC included.
    pub fn sh_coefficients_count(&self) -> usize {
        self.layout.coefficients_per_channel()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn scales(&self) -> &[Vec3] {
        &self.scales
    }

    pub fn rotations(&self) -> &[Vec4] {
        &self.rotations
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    /// Flattened coefficients, indexed `[point * sh_coefficients_count + coefficient]`.
    pub fn sh_coefficients(&self) -> &[Vec3] {
        &self.sh_coefficients
    }

    /// Coefficients of one point as (r, g, b) triples.
    pub fn point_sh(&self, index: usize) -> Option<&[Vec3]> {
        let cpc = self.sh_coefficients_count();
        let start = index.checked_mul(cpc)?;
        self.sh_coefficients.get(start..start + cpc)
    }

    /// One point as a [`GaussianRecord`].
    pub fn record(&self, index: usize) -> Option<GaussianRecord> {
        (index < self.len()).then(|| self.record_at(index))
    }

    fn record_at(&self, index: usize) -> GaussianRecord {
        let cpc = self.sh_coefficients_count();
        let sh = &self.sh_coefficients[index * cpc..(index + 1) * cpc];
        let channel = |k: usize| sh.iter().map(|c| c[k]).collect::<Vec<f32>>();
        GaussianRecord {
            position: self.positions[index],
            opacity: self.opacities[index],
            scale: self.scales[index],
            rotation: self.rotations[index],
            coefficients: [channel(0), channel(1), channel(2)],
        }
    }

    /// Iterate over all points as records.
    pub fn records(&self) -> impl ExactSizeIterator<Item = GaussianRecord> + '_ {
        (0..self.len()).map(move |i| self.record_at(i))
    }

    /// Convert to the array-of-records form.
    pub fn to_records(&self) -> Vec<GaussianRecord> {
        self.records().collect()
    }

    /// Bounding box of all positions (empty for an empty scene).
    pub fn bounds(&self) -> Aabb {
        Aabb::enclosing(&self.positions)
    }
}
