use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum InitialConditions {
    /// Uniform noise of amplitude `noise_strength` on both quadratures
    Disordered {
        #[serde(default = "default_noise_strength")]
        noise_strength: f64,
    },

    /// ψ = sqrt(1 - V_ext), zero where V_ext > 1. Requires a `[potential]` table.
    ThomasFermi,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum PotentialParameters {
    /// Harmonic trap centered in the box with Thomas-Fermi radius `r_tf`
    Harmonic { r_tf: f64 },

    /// A gaussian bump of height `strength` and width `size` at `position`
    GaussianStirrer {
        size: f64,
        strength: f64,
        position: Vec<f64>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum DissipationParameters {
    /// Calm bulk, dissipative rectangular frame at distance (wx, wy, wz) from the
    /// center with interface width `d`
    Frame {
        #[serde(default = "default_frame_width")]
        d: f64,
        #[serde(default)]
        wx: f64,
        #[serde(default)]
        wy: f64,
        #[serde(default)]
        wz: f64,
    },
}

/// Exponential time differencing scheme
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Etd2rk,
    Etd4rk,
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Etd4rk
    }
}

fn default_noise_strength() -> f64 {
    DEFAULT_NOISE_STRENGTH
}

fn default_frame_width() -> f64 {
    DEFAULT_FRAME_WIDTH
}
