use num::Complex;

use crate::utils::{grid::Mesh, Field};

const I: Complex<f64> = Complex::new(0.0, 1.0);

/// Linear part of the dGPE right-hand side, diagonal in Fourier space
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LinearOperator {
    /// ω(k) = (i + γ)(1 - k²/2) for a uniform dissipation γ
    Standard { gamma: Complex<f64> },

    /// ω(k) = i(1 - k²/2) + v ∂ₓ, the frame moving with velocity v along x.
    /// Dissipation is carried by the nonlinear term in this regime.
    Comoving { velocity: f64 },
}

/// Builds ω(k) on every Fourier mode of the mesh
pub fn linear_operator(mesh: &Mesh, operator: LinearOperator) -> Field {
    match operator {
        LinearOperator::Standard { gamma } => {
            mesh.map_modes(|k| (I + gamma) * (1.0 - 0.5 * squared_norm(k)))
        }
        LinearOperator::Comoving { velocity } => mesh.map_modes(|k| {
            I * (1.0 - 0.5 * squared_norm(k)) + velocity * Complex::new(0.0, k[0])
        }),
    }
}

fn squared_norm(k: &[f64]) -> f64 {
    k.iter().map(|k| k * k).sum()
}
