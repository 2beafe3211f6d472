use ndarray::Zip;
use num::Complex;

use crate::{
    simulation_object::{Dissipation, Potential},
    utils::{error::RuntimeError, fft::FftObject, Field, RealField},
};

const I: Complex<f64> = Complex::new(0.0, 1.0);

/// The part of the right-hand side that is not diagonal in Fourier space.
pub trait NonlinearTerm {
    /// Returns the Fourier transform of the nonlinear term for the real-space field `ψ`
    /// at time `time`.
    fn evaluate(&mut self, ψ: &Field, time: f64) -> Result<Field, RuntimeError>;
}

impl<F> NonlinearTerm for F
where
    F: FnMut(&Field, f64) -> Result<Field, RuntimeError>,
{
    fn evaluate(&mut self, ψ: &Field, time: f64) -> Result<Field, RuntimeError> {
        self(ψ, time)
    }
}

/// (i + γ)(-V - |ψ|²)ψ, transformed. Uniform γ, potential fixed for the whole call.
pub struct StaticPotential<'a> {
    fft: &'a FftObject,
    gamma: Complex<f64>,
    potential: &'a Potential,
}

impl<'a> StaticPotential<'a> {
    pub fn new(fft: &'a FftObject, gamma: Complex<f64>, potential: &'a Potential) -> Self {
        StaticPotential {
            fft,
            gamma,
            potential,
        }
    }
}

impl NonlinearTerm for StaticPotential<'_> {
    fn evaluate(&mut self, ψ: &Field, _time: f64) -> Result<Field, RuntimeError> {
        let coefficient = I + self.gamma;
        let mut term = match self.potential {
            Potential::Zero => ψ.mapv(|ψ| coefficient * (-ψ.norm_sqr()) * ψ),
            Potential::Static(v) => dgpe_term(coefficient, ψ, v),
        };
        self.fft.forward_inplace(&mut term)?;
        Ok(term)
    }
}

/// Same term as [`StaticPotential`], with V = V(t) recomputed at every stage time.
///
/// The most recent V(t) is held by the evaluator itself, so one evaluator belongs to one
/// evolution call. [`TimeDependentPotential::into_potential`] hands it back afterwards.
pub struct TimeDependentPotential<'a, F>
where
    F: FnMut(f64) -> RealField,
{
    fft: &'a FftObject,
    gamma: Complex<f64>,
    potential_fn: F,
    current: Option<RealField>,
}

impl<'a, F> TimeDependentPotential<'a, F>
where
    F: FnMut(f64) -> RealField,
{
    pub fn new(fft: &'a FftObject, gamma: Complex<f64>, potential_fn: F) -> Self {
        TimeDependentPotential {
            fft,
            gamma,
            potential_fn,
            current: None,
        }
    }

    /// The potential of the last evaluated stage, if any
    pub fn into_potential(self) -> Option<RealField> {
        self.current
    }
}

impl<F> NonlinearTerm for TimeDependentPotential<'_, F>
where
    F: FnMut(f64) -> RealField,
{
    fn evaluate(&mut self, ψ: &Field, time: f64) -> Result<Field, RuntimeError> {
        let v = (self.potential_fn)(time);
        if v.shape() != ψ.shape() {
            return Err(RuntimeError::ShapeMismatch {
                expected: ψ.shape().to_vec(),
                found: v.shape().to_vec(),
            });
        }

        let mut term = dgpe_term(I + self.gamma, ψ, &v);
        self.fft.forward_inplace(&mut term)?;
        self.current = Some(v);
        Ok(term)
    }
}

/// Nonlinear term for a spatially varying γ:
///
///   -(i + γ)(V + |ψ|²)ψ + γψ + ½γ∇²ψ
///
/// The linear dissipative pieces live here because γ(x) does not commute with ∇².
/// The three pieces are summed in real space and transformed once.
pub struct Comoving<'a> {
    fft: &'a FftObject,
    gamma: Field,
    potential: RealField,
    minus_k2: Field,
}

impl<'a> Comoving<'a> {
    pub fn new(
        fft: &'a FftObject,
        dissipation: &Dissipation,
        potential: &Potential,
        k2: &RealField,
    ) -> Self {
        let shape = fft.shape();
        Comoving {
            fft,
            gamma: dissipation.to_field(shape),
            potential: potential.to_field(shape),
            minus_k2: k2.mapv(|k2| Complex::new(-k2, 0.0)),
        }
    }
}

impl NonlinearTerm for Comoving<'_> {
    fn evaluate(&mut self, ψ: &Field, _time: f64) -> Result<Field, RuntimeError> {
        // ∇²ψ
        let mut laplacian = self.fft.forward(ψ)?;
        laplacian *= &self.minus_k2;
        self.fft.inverse_inplace(&mut laplacian)?;

        let mut term = Zip::from(ψ)
            .and(&laplacian)
            .and(&self.gamma)
            .and(&self.potential)
            .map_collect(|&ψ, &laplacian, &gamma, &v| {
                -(I + gamma) * (v + ψ.norm_sqr()) * ψ + gamma * ψ + 0.5 * gamma * laplacian
            });
        self.fft.forward_inplace(&mut term)?;
        Ok(term)
    }
}

fn dgpe_term(coefficient: Complex<f64>, ψ: &Field, v: &RealField) -> Field {
    Zip::from(ψ)
        .and(v)
        .map_collect(|&ψ, &v| coefficient * (-v - ψ.norm_sqr()) * ψ)
}
