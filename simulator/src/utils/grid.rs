use ndarray::{Array1, ArrayD, IxDyn};
use num::Complex;
use std::f64::consts::PI;

use super::{error::RuntimeError, Field, RealField};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd)]
pub enum Dimensions {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Dimensions {
    pub fn from_usize(dims: usize) -> Result<Dimensions, RuntimeError> {
        match dims {
            1 => Ok(Dimensions::One),
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            dims => Err(RuntimeError::UnsupportedDimension { dims }),
        }
    }
}

/// A periodic, cell-centered box with per-axis coordinates and wavenumbers.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub dims: Dimensions,
    /// Number of grid points per axis
    pub resolution: Vec<usize>,
    /// Cell size per axis
    pub spacing: Vec<f64>,
    /// Lower corner of the box
    pub origin: Vec<f64>,
    /// x, y, z coordinates
    pub coordinates: Vec<Array1<f64>>,
    /// Center of the box per axis
    pub midpoints: Vec<f64>,
    /// Angular wavenumbers per axis, in FFT order
    pub wavenumbers: Vec<Array1<f64>>,
}

impl Mesh {
    pub fn new(
        resolution: &[usize],
        spacing: &[f64],
        origin: &[f64],
    ) -> Result<Self, RuntimeError> {
        let dims = Dimensions::from_usize(resolution.len())?;

        if spacing.len() != resolution.len() || origin.len() != resolution.len() {
            return Err(RuntimeError::InvalidParameter {
                msg: format!(
                    "resolution, spacing and origin need one entry per axis (got {}, {}, {})",
                    resolution.len(),
                    spacing.len(),
                    origin.len()
                ),
            });
        }
        if resolution.iter().any(|&n| n == 0) {
            return Err(RuntimeError::InvalidParameter {
                msg: format!("resolution must be positive, got {resolution:?}"),
            });
        }
        if spacing.iter().any(|&dx| !(dx > 0.0)) {
            return Err(RuntimeError::InvalidParameter {
                msg: format!("spacing must be positive, got {spacing:?}"),
            });
        }

        let coordinates = resolution
            .iter()
            .zip(spacing)
            .zip(origin)
            .map(|((&n, &dx), &x0)| Array1::from_shape_fn(n, |i| x0 + i as f64 * dx))
            .collect();
        let midpoints = resolution
            .iter()
            .zip(spacing)
            .zip(origin)
            .map(|((&n, &dx), &x0)| x0 + n as f64 * dx / 2.0)
            .collect();
        let wavenumbers = resolution
            .iter()
            .zip(spacing)
            .map(|(&n, &dx)| get_kgrid(n, dx))
            .collect();

        Ok(Mesh {
            dims,
            resolution: resolution.to_vec(),
            spacing: spacing.to_vec(),
            origin: origin.to_vec(),
            coordinates,
            midpoints,
            wavenumbers,
        })
    }

    /// Unit spacing, box starting at the origin
    pub fn uniform(resolution: &[usize]) -> Result<Self, RuntimeError> {
        Mesh::new(
            resolution,
            &vec![1.0; resolution.len()],
            &vec![0.0; resolution.len()],
        )
    }

    pub fn dimension(&self) -> usize {
        self.dims as usize
    }

    pub fn shape(&self) -> &[usize] {
        &self.resolution
    }

    pub fn n_points(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Physical length of the box along `axis`
    pub fn length(&self, axis: usize) -> f64 {
        self.resolution[axis] as f64 * self.spacing[axis]
    }

    pub fn volume_element(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// Evaluates `f` at the coordinates of every grid point
    pub fn map_points<T, F>(&self, f: F) -> ArrayD<T>
    where
        F: Fn(&[f64]) -> T,
    {
        map_axes(&self.resolution, &self.coordinates, f)
    }

    /// Evaluates `f` at the wavevector of every Fourier mode
    pub fn map_modes<T, F>(&self, f: F) -> ArrayD<T>
    where
        F: Fn(&[f64]) -> T,
    {
        map_axes(&self.resolution, &self.wavenumbers, f)
    }

    /// k^2 for every Fourier mode
    pub fn k2(&self) -> RealField {
        self.map_modes(|k| k.iter().map(|k| k * k).sum())
    }

    /// Spectral first derivative along `axis`, i.e. i k_axis
    pub fn dif(&self, axis: usize) -> Field {
        self.map_modes(|k| Complex::new(0.0, k[axis]))
    }

    /// Minimum-image displacement x - x0 along `axis`
    pub fn periodic_displacement(&self, axis: usize, x: f64, x0: f64) -> f64 {
        let length = self.length(axis);
        let d = x - x0;
        d - length * (d / length).round()
    }

    /// Maps a coordinate back into [origin, origin + length) along `axis`
    pub fn wrap(&self, axis: usize, x: f64) -> f64 {
        let length = self.length(axis);
        let offset = (x - self.origin[axis]).rem_euclid(length);
        // rem_euclid may round up to `length` itself
        self.origin[axis] + if offset < length { offset } else { 0.0 }
    }
}

fn map_axes<T, F>(resolution: &[usize], axes: &[Array1<f64>], f: F) -> ArrayD<T>
where
    F: Fn(&[f64]) -> T,
{
    let d = resolution.len();
    ArrayD::from_shape_fn(IxDyn(resolution), |idx: IxDyn| {
        let mut point = [0.0; 3];
        for (axis, p) in point.iter_mut().take(d).enumerate() {
            *p = axes[axis][idx[axis]];
        }
        f(&point[..d])
    })
}

/// Angular wavenumbers 2π m / (n dx) in FFT order: m = 0, 1, ..., then negative
pub fn get_kgrid(n: usize, dx: f64) -> Array1<f64> {
    let length = n as f64 * dx;
    Array1::from_shape_fn(n, |i| {
        let m = if i <= (n - 1) / 2 {
            i as f64
        } else {
            i as f64 - n as f64
        };
        2.0 * PI * m / length
    })
}
