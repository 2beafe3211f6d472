//! Exponential time differencing Runge-Kutta schemes (Cox & Matthews).
//!
//! The linear part of the equation is diagonal in Fourier space, ∂ₜψ̂ = ω(k)ψ̂ + N̂(ψ, t),
//! so it is integrated exactly through the tables built here. Only the nonlinear term
//! is treated with Runge-Kutta stages.

use dgpe_common::Scheme;
use log::{debug, trace};
use ndarray::Zip;
use num::Complex;

use crate::{
    nonlinear::NonlinearTerm,
    simulation_object::SimulationGrid,
    utils::{complex::check_complex_for_nans, error::RuntimeError, fft::FftObject, Field},
};

/// Below this |z| the φ-functions are summed from their Taylor series
const SERIES_THRESHOLD: f64 = 1.0;
const SERIES_TERMS: usize = 24;

/// φₖ(z) = Σₙ zⁿ / (n + k)!, i.e. φ₀ = eᶻ, φ₁ = (eᶻ - 1)/z, φ₂ = (eᶻ - 1 - z)/z², ...
///
/// Close to z = 0 the closed forms cancel catastrophically, so the series is used there.
pub fn phi(k: usize, z: Complex<f64>) -> Complex<f64> {
    if z.norm() < SERIES_THRESHOLD {
        // 1/(n+k)! for n = 0..SERIES_TERMS
        let mut coefficients = [0.0; SERIES_TERMS];
        let mut c = 1.0 / (1..=k).map(|j| j as f64).product::<f64>();
        for (n, coefficient) in coefficients.iter_mut().enumerate() {
            *coefficient = c;
            c /= (n + k + 1) as f64;
        }

        // Horner
        coefficients
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c)
    } else {
        // φⱼ = (φⱼ₋₁ - 1/(j-1)!) / z
        let mut value = z.exp();
        let mut inverse_factorial = 1.0;
        for j in 1..=k {
            value = (value - inverse_factorial) / z;
            inverse_factorial /= j as f64;
        }
        value
    }
}

/// Integrating factors of the second order scheme
pub struct Etd2rkCoefficients {
    dt: f64,
    /// e^{ωΔt}
    pub propagator: Field,
    /// Δt φ₁(ωΔt)
    pub phi1: Field,
    /// Δt φ₂(ωΔt)
    pub phi2: Field,
}

/// Integrating factors of the fourth order scheme
pub struct Etd4rkCoefficients {
    dt: f64,
    /// e^{ωΔt/2}
    pub half_propagator: Field,
    /// (Δt/2) φ₁(ωΔt/2)
    pub half_phi1: Field,
    /// e^{ωΔt}
    pub propagator: Field,
    /// Δt (φ₁ - 3φ₂ + 4φ₃), weight of the first stage
    pub f1: Field,
    /// 2Δt (φ₂ - 2φ₃), weight of the two midpoint stages
    pub f2: Field,
    /// Δt (-φ₂ + 4φ₃), weight of the last stage
    pub f3: Field,
}

/// The coefficient table of one evolution call. It is only valid for the ω(k) and Δt it
/// was built from.
pub enum IntegratingFactors {
    Etd2rk(Etd2rkCoefficients),
    Etd4rk(Etd4rkCoefficients),
}

impl Etd2rkCoefficients {
    pub fn new(omega: &Field, dt: f64) -> Self {
        let z = omega.mapv(|w| w * dt);
        Etd2rkCoefficients {
            dt,
            propagator: z.mapv(|z| z.exp()),
            phi1: z.mapv(|z| phi(1, z) * dt),
            phi2: z.mapv(|z| phi(2, z) * dt),
        }
    }

    /// One step. Evaluates the nonlinear term at t and t + Δt.
    pub fn step<N: NonlinearTerm + ?Sized>(
        &self,
        nonlinear: &mut N,
        fft: &FftObject,
        grid: &mut SimulationGrid,
        time: f64,
    ) -> Result<(), RuntimeError> {
        let n0 = nonlinear.evaluate(&grid.ψ, time)?;

        let mut a_k = Zip::from(&self.propagator)
            .and(&grid.ψk)
            .and(&self.phi1)
            .and(&n0)
            .map_collect(|&e, &ψk, &p1, &n0| e * ψk + p1 * n0);
        let a = fft.inverse(&a_k)?;

        let na = nonlinear.evaluate(&a, time + self.dt)?;
        Zip::from(&mut a_k)
            .and(&self.phi2)
            .and(&na)
            .and(&n0)
            .for_each(|a_k, &p2, &na, &n0| *a_k += p2 * (na - n0));

        grid.ψ = fft.inverse(&a_k)?;
        grid.ψk = a_k;
        Ok(())
    }
}

impl Etd4rkCoefficients {
    pub fn new(omega: &Field, dt: f64) -> Self {
        let z = omega.mapv(|w| w * dt);
        let half_dt = 0.5 * dt;

        let f1 = z.mapv(|z| dt * (phi(1, z) - 3.0 * phi(2, z) + 4.0 * phi(3, z)));
        let f2 = z.mapv(|z| 2.0 * dt * (phi(2, z) - 2.0 * phi(3, z)));
        let f3 = z.mapv(|z| dt * (4.0 * phi(3, z) - phi(2, z)));

        Etd4rkCoefficients {
            dt,
            half_propagator: z.mapv(|z| (0.5 * z).exp()),
            half_phi1: z.mapv(|z| phi(1, 0.5 * z) * half_dt),
            propagator: z.mapv(|z| z.exp()),
            f1,
            f2,
            f3,
        }
    }

    /// One step. Evaluates the nonlinear term at t, t + Δt/2 (twice) and t + Δt.
    pub fn step<N: NonlinearTerm + ?Sized>(
        &self,
        nonlinear: &mut N,
        fft: &FftObject,
        grid: &mut SimulationGrid,
        time: f64,
    ) -> Result<(), RuntimeError> {
        let half_time = time + 0.5 * self.dt;

        // Stage a
        let n0 = nonlinear.evaluate(&grid.ψ, time)?;
        let a_k = Zip::from(&self.half_propagator)
            .and(&grid.ψk)
            .and(&self.half_phi1)
            .and(&n0)
            .map_collect(|&e2, &ψk, &h1, &n0| e2 * ψk + h1 * n0);
        let a = fft.inverse(&a_k)?;

        // Stage b
        let na = nonlinear.evaluate(&a, half_time)?;
        let b_k = Zip::from(&self.half_propagator)
            .and(&grid.ψk)
            .and(&self.half_phi1)
            .and(&na)
            .map_collect(|&e2, &ψk, &h1, &na| e2 * ψk + h1 * na);
        let b = fft.inverse(&b_k)?;

        // Stage c
        let nb = nonlinear.evaluate(&b, half_time)?;
        let c_k = Zip::from(&self.half_propagator)
            .and(&a_k)
            .and(&self.half_phi1)
            .and(&nb)
            .and(&n0)
            .map_collect(|&e2, &a_k, &h1, &nb, &n0| e2 * a_k + h1 * (2.0 * nb - n0));
        let c = fft.inverse(&c_k)?;

        let nc = nonlinear.evaluate(&c, time + self.dt)?;

        // Combine, in two passes since a Zip holds at most six producers
        let mut ψk = Zip::from(&self.propagator)
            .and(&grid.ψk)
            .and(&self.f1)
            .and(&n0)
            .map_collect(|&e, &ψk, &f1, &n0| e * ψk + f1 * n0);
        Zip::from(&mut ψk)
            .and(&self.f2)
            .and(&na)
            .and(&nb)
            .and(&self.f3)
            .and(&nc)
            .for_each(|ψk, &f2, &na, &nb, &f3, &nc| *ψk += f2 * (na + nb) + f3 * nc);

        grid.ψ = fft.inverse(&ψk)?;
        grid.ψk = ψk;
        Ok(())
    }
}

impl IntegratingFactors {
    pub fn new(scheme: Scheme, omega: &Field, dt: f64) -> Result<Self, RuntimeError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(RuntimeError::InvalidParameter {
                msg: format!("time step must be positive, got {dt}"),
            });
        }

        debug!(
            "Building {scheme:?} integrating factors for {} modes, dt = {dt}",
            omega.len()
        );
        Ok(match scheme {
            Scheme::Etd2rk => IntegratingFactors::Etd2rk(Etd2rkCoefficients::new(omega, dt)),
            Scheme::Etd4rk => IntegratingFactors::Etd4rk(Etd4rkCoefficients::new(omega, dt)),
        })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            IntegratingFactors::Etd2rk(_) => Scheme::Etd2rk,
            IntegratingFactors::Etd4rk(_) => Scheme::Etd4rk,
        }
    }

    pub fn dt(&self) -> f64 {
        match self {
            IntegratingFactors::Etd2rk(c) => c.dt,
            IntegratingFactors::Etd4rk(c) => c.dt,
        }
    }

    pub fn step<N: NonlinearTerm + ?Sized>(
        &self,
        nonlinear: &mut N,
        fft: &FftObject,
        grid: &mut SimulationGrid,
        time: f64,
    ) -> Result<(), RuntimeError> {
        match self {
            IntegratingFactors::Etd2rk(c) => c.step(nonlinear, fft, grid, time),
            IntegratingFactors::Etd4rk(c) => c.step(nonlinear, fft, grid, time),
        }
    }
}

/// Takes `steps` steps, advancing `time` by Δt after each one.
///
/// With `check_finite` set, a step that leaves a NaN or Inf in ψ stops the loop with
/// [`RuntimeError::NanOrInf`] carrying the (1-based) step number.
pub fn evolve<N: NonlinearTerm + ?Sized>(
    factors: &IntegratingFactors,
    nonlinear: &mut N,
    fft: &FftObject,
    grid: &mut SimulationGrid,
    steps: usize,
    time: &mut f64,
    check_finite: bool,
) -> Result<(), RuntimeError> {
    let dt = factors.dt();
    for step in 1..=steps {
        factors.step(nonlinear, fft, grid, *time)?;
        *time += dt;

        if check_finite && !check_complex_for_nans(&grid.ψ) {
            return Err(RuntimeError::NanOrInf { step });
        }
        trace!("{:?} step {step}/{steps} done, t = {time:.4}", factors.scheme());
    }
    Ok(())
}
