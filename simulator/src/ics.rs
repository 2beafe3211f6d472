use ndarray::Zip;
use num::Complex;
use rand::Rng;

use crate::utils::{error::RuntimeError, grid::Mesh, Field, RealField};

/// This function produces a disordered state: uniform noise in [-0.5, 0.5) on both the
/// real and imaginary part, scaled by `noise_strength`.
pub fn disordered<R: Rng + ?Sized>(mesh: &Mesh, noise_strength: f64, rng: &mut R) -> Field {
    Field::from_shape_simple_fn(mesh.shape(), || {
        let re = rng.gen::<f64>() - 0.5;
        let im = rng.gen::<f64>() - 0.5;
        Complex::new(re, im) * noise_strength
    })
}

/// Thomas-Fermi profile ψ = sqrt(1 - V), with ψ = 0 wherever V > 1.
///
/// This is only an approximation of the ground state; relax the result to get the real one.
pub fn thomas_fermi(potential: &RealField) -> Field {
    potential.mapv(|v| {
        if v > 1.0 {
            Complex::new(0.0, 0.0)
        } else {
            Complex::new(1.0 - v, 0.0).sqrt()
        }
    })
}

/// V = |x - x_mid|² / R_tf², a harmonic trap centered in the box.
pub fn harmonic_potential(mesh: &Mesh, r_tf: f64) -> Result<RealField, RuntimeError> {
    if !(r_tf > 0.0) {
        return Err(RuntimeError::InvalidParameter {
            msg: format!("Thomas-Fermi radius must be positive, got {r_tf}"),
        });
    }

    let trapping_strength = 1.0 / (r_tf * r_tf);
    Ok(mesh.map_points(|x| {
        let r2: f64 = x
            .iter()
            .zip(&mesh.midpoints)
            .map(|(x, mid)| (x - mid).powi(2))
            .sum();
        trapping_strength * r2
    }))
}

/// V = strength · exp(-|x - position|² / size²)
pub fn gaussian_stirring_potential(
    mesh: &Mesh,
    size: f64,
    strength: f64,
    position: &[f64],
) -> Result<RealField, RuntimeError> {
    if position.len() != mesh.dimension() {
        return Err(RuntimeError::InvalidParameter {
            msg: format!(
                "stirrer position has {} components, the grid has {} axes",
                position.len(),
                mesh.dimension()
            ),
        });
    }
    if !(size > 0.0) {
        return Err(RuntimeError::InvalidParameter {
            msg: format!("stirrer size must be positive, got {size}"),
        });
    }

    let size2 = size * size;
    Ok(mesh.map_points(|x| {
        let r2: f64 = x
            .iter()
            .zip(position)
            .map(|(x, p)| (x - p).powi(2))
            .sum();
        strength * (-r2 / size2).exp()
    }))
}

/// Dissipation that equals `gamma0` in the bulk and rises by one over an interface of
/// width `d` placed at a distance `w` from the center, on every axis. The profile is the
/// pointwise maximum over the axes, which gives a rectangular frame.
///
/// Only defined for 2 and 3 dimensions.
pub fn dissipation_frame(
    mesh: &Mesh,
    gamma0: f64,
    d: f64,
    w: [f64; 3],
) -> Result<RealField, RuntimeError> {
    let dims = mesh.dimension();
    if !(dims == 2 || dims == 3) {
        return Err(RuntimeError::UnsupportedDimension { dims });
    }
    if !(d > 0.0) {
        return Err(RuntimeError::InvalidParameter {
            msg: format!("frame interface width must be positive, got {d}"),
        });
    }

    let step = |x: f64, mid: f64, w: f64| {
        gamma0 + 0.5 * (2.0 + ((x - mid - w) / d).tanh() - ((x - mid + w) / d).tanh())
    };
    Ok(mesh.map_points(|x| {
        x.iter()
            .zip(&mesh.midpoints)
            .zip(w)
            .map(|((&x, &mid), w)| step(x, mid, w))
            .fold(f64::NEG_INFINITY, f64::max)
    }))
}

/// ψ with a phase winding of `charge` around `center` and a core of size ~1, in 2D.
///
/// The amplitude is tanh(r), close to the healing profile of a single vortex. The phase
/// jumps where the minimum-image displacement wraps, half a box away from `center`.
pub fn vortex(mesh: &Mesh, center: [f64; 2], charge: i32) -> Result<Field, RuntimeError> {
    let dims = mesh.dimension();
    if dims != 2 {
        return Err(RuntimeError::UnsupportedDimension { dims });
    }

    Ok(mesh.map_points(|x| {
        let dx = mesh.periodic_displacement(0, x[0], center[0]);
        let dy = mesh.periodic_displacement(1, x[1], center[1]);
        let r = dx.hypot(dy);
        Complex::from_polar(r.tanh(), charge as f64 * dy.atan2(dx))
    }))
}

/// Pointwise product, used to superpose vortices
pub fn superpose(fields: &[Field]) -> Option<Field> {
    let (first, rest) = fields.split_first()?;
    let mut product = first.clone();
    for field in rest {
        Zip::from(&mut product)
            .and(field)
            .for_each(|p, &f| *p *= f);
    }
    Some(product)
}
