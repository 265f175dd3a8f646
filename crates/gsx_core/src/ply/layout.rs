//! Spherical harmonics coefficient layout.
//!
//! The header never states the SH degree. It is inferred from the number of
//! `f_rest_*` columns: each colour channel has one DC term (`f_dc_k`) plus
//! `rest / 3` higher-order terms.

use serde::{Deserialize, Serialize};

use super::error::{DecodeError, DecodeResult};

/// How the `f_rest_*` columns are ordered within a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestOrder {
    /// `r1 g1 b1 r2 g2 b2 ...`: three floats per coefficient, one per channel.
    #[default]
    Interleaved,
    /// `r1 r2 ... g1 g2 ... b1 b2 ...`: one run per channel.
    ChannelMajor,
}

/// Derived SH layout of a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShLayout {
    rest_coefficient_count: usize,
    coefficients_per_channel: usize,
    sh_dim: u32,
}

impl ShLayout {
    /// Colour channels per coefficient (R, G, B).
    pub const CHANNELS: usize = 3;

    /// Derive the layout from the number of `f_rest*` properties.
    ///
    /// `sh_dim` is `round(sqrt(coefficients_per_channel)) - 1`. That is
    /// exact only for square counts (1, 4, 9, 16, 25); other counts give an
    /// approximate degree. The degree is informational and decoding never
    /// depends on it.
    pub fn from_rest_count(rest_count: usize) -> DecodeResult<Self> {
        if rest_count % Self::CHANNELS != 0 {
            return Err(DecodeError::InvalidShLayout { rest_count });
        }
        let coefficients_per_channel = rest_count / Self::CHANNELS + 1;
        Ok(Self {
            rest_coefficient_count: rest_count,
            coefficients_per_channel,
            sh_dim: approximate_degree(coefficients_per_channel),
        })
    }

    /// Layout for a known number of coefficients per channel (DC included).
    pub fn from_coefficients_per_channel(coefficients_per_channel: usize) -> Option<Self> {
        if coefficients_per_channel == 0 {
            return None;
        }
        Some(Self {
            rest_coefficient_count: (coefficients_per_channel - 1) * Self::CHANNELS,
            coefficients_per_channel,
            sh_dim: approximate_degree(coefficients_per_channel),
        })
    }

    pub fn rest_coefficient_count(&self) -> usize {
        self.rest_coefficient_count
    }

    /// Coefficients per colour channel, DC term included.
    pub fn coefficients_per_channel(&self) -> usize {
        self.coefficients_per_channel
    }

    pub fn sh_dim(&self) -> u32 {
        self.sh_dim
    }

    /// True when `sh_dim` is an exact SH degree.
    pub fn is_exact_degree(&self) -> bool {
        let degree = self.sh_dim as usize + 1;
        degree * degree == self.coefficients_per_channel
    }

    /// Index `n` of the `f_rest_n` column holding coefficient `coefficient`
    /// (1-based, 0 is DC) of `channel`.
    pub fn rest_index(&self, order: RestOrder, coefficient: usize, channel: usize) -> usize {
        debug_assert!(coefficient >= 1 && coefficient < self.coefficients_per_channel);
        debug_assert!(channel < Self::CHANNELS);
        match order {
            RestOrder::Interleaved => (coefficient - 1) * Self::CHANNELS + channel,
            RestOrder::ChannelMajor => channel * (self.coefficients_per_channel - 1) + coefficient - 1,
        }
    }
}

fn approximate_degree(coefficients_per_channel: usize) -> u32 {
    ((coefficients_per_channel as f64).sqrt().round() as u32).saturating_sub(1)
}
