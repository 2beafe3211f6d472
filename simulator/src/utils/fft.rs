use ndarray::Axis;
use num::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::{error::RuntimeError, Field};

/// This struct is intended to be initialized at the
/// beginning of a simulation. It holds one forward and
/// one inverse plan per axis of the grid.
///
/// `forward` is unnormalized and `inverse` divides by the number
/// of grid points, so that `inverse(forward(ψ)) == ψ`.
pub struct FftObject {
    // Forward operation per axis
    fwd: Vec<Arc<dyn Fft<f64>>>,
    // Inverse operation per axis
    inv: Vec<Arc<dyn Fft<f64>>>,
    // Keep shape on record
    shape: Vec<usize>,
    // 1 / number of points
    norm_factor: f64,
}

impl FftObject {
    /// Plans the transforms for arrays of the given shape
    pub fn new(shape: &[usize]) -> Self {
        // Create planner and per-axis plans
        let mut planner = FftPlanner::<f64>::new();
        let fwd = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inv = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();

        let norm_factor = 1.0 / shape.iter().product::<usize>() as f64;

        FftObject {
            fwd,
            inv,
            shape: shape.to_vec(),
            norm_factor,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn forward(&self, data: &Field) -> Result<Field, RuntimeError> {
        let mut out = data.clone();
        self.forward_inplace(&mut out)?;
        Ok(out)
    }

    pub fn inverse(&self, data: &Field) -> Result<Field, RuntimeError> {
        let mut out = data.clone();
        self.inverse_inplace(&mut out)?;
        Ok(out)
    }

    pub fn forward_inplace(&self, data: &mut Field) -> Result<(), RuntimeError> {
        self.check_shape(data)?;
        process_lanes(data, &self.fwd);
        Ok(())
    }

    pub fn inverse_inplace(&self, data: &mut Field) -> Result<(), RuntimeError> {
        self.check_shape(data)?;
        process_lanes(data, &self.inv);

        // Inverse needs division
        let norm_factor = self.norm_factor;
        data.mapv_inplace(|z| z * norm_factor);
        Ok(())
    }

    fn check_shape(&self, data: &Field) -> Result<(), RuntimeError> {
        if data.shape() != self.shape.as_slice() {
            return Err(RuntimeError::ShapeMismatch {
                expected: self.shape.clone(),
                found: data.shape().to_vec(),
            });
        }
        Ok(())
    }
}

/// Applies the 1D plan of every axis along all lanes of that axis
fn process_lanes(data: &mut Field, plans: &[Arc<dyn Fft<f64>>]) {
    let mut buffer: Vec<Complex<f64>> = Vec::new();

    for (axis, plan) in plans.iter().enumerate() {
        let mut scratch = vec![Complex::new(0.0, 0.0); plan.get_inplace_scratch_len()];

        for mut lane in data.lanes_mut(Axis(axis)) {
            match lane.as_slice_mut() {
                // Contiguous lanes (last axis) are transformed in place
                Some(slice) => plan.process_with_scratch(slice, &mut scratch),

                // Strided lanes go through a buffer
                None => {
                    buffer.clear();
                    buffer.extend(lane.iter().copied());
                    plan.process_with_scratch(&mut buffer, &mut scratch);
                    lane.iter_mut()
                        .zip(&buffer)
                        .for_each(|(z, &b)| *z = b);
                }
            }
        }
    }
}
