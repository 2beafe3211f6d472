use dgpe_common::{
    DefectParameters, DissipationParameters, InitialConditions, PotentialParameters,
    RunParameters, Scheme, TomlParameters,
};
use log::{debug, info};
use ndarray::Zip;
use num::Complex;
use rand::{rngs::StdRng, SeedableRng};
use std::fmt::Display;
use std::time::Instant;

use crate::{
    defects::{self, VortexNode},
    etd::{evolve, IntegratingFactors},
    ics,
    nonlinear::{Comoving, StaticPotential, TimeDependentPotential},
    spectral::{linear_operator, LinearOperator},
    utils::{
        complex::{imag_part, real_part},
        error::RuntimeError,
        fft::FftObject,
        grid::{Dimensions, Mesh},
        Field, RealField,
    },
};

/// γ = 1 - i turns the dGPE into imaginary time gradient flow, since i + γ = 1
pub const RELAX_GAMMA: Complex<f64> = Complex::new(1.0, -1.0);

/// This struct holds the grids which store the wavefunction and its Fourier transform
#[derive(Clone, Debug)]
pub struct SimulationGrid {
    /// The array which stores the wavefunction
    pub ψ: Field,

    /// Fourier space
    pub ψk: Field,
}

impl SimulationGrid {
    pub fn new(ψ: Field, fft: &FftObject) -> Result<Self, RuntimeError> {
        let ψk = fft.forward(&ψ)?;
        Ok(SimulationGrid { ψ, ψk })
    }
}

/// The dissipation coefficient γ
#[derive(Clone, Debug, PartialEq)]
pub enum Dissipation {
    /// Same damping everywhere. Complex so that it can hold the relaxation value 1 - i.
    Uniform(Complex<f64>),
    /// Spatially varying damping, one value per grid point
    Field(RealField),
}

impl Dissipation {
    pub fn uniform(&self) -> Option<Complex<f64>> {
        match self {
            Dissipation::Uniform(gamma) => Some(*gamma),
            Dissipation::Field(_) => None,
        }
    }

    /// γ on every grid point
    pub fn to_field(&self, shape: &[usize]) -> Field {
        match self {
            Dissipation::Uniform(gamma) => Field::from_elem(shape, *gamma),
            Dissipation::Field(gamma) => gamma.mapv(|g| Complex::new(g, 0.0)),
        }
    }
}

/// The external potential
#[derive(Clone, Debug, PartialEq)]
pub enum Potential {
    Zero,
    Static(RealField),
}

impl Potential {
    /// V on every grid point
    pub fn to_field(&self, shape: &[usize]) -> RealField {
        match self {
            Potential::Zero => RealField::zeros(shape),
            Potential::Static(v) => v.clone(),
        }
    }
}

/// This `Parameters` struct stores simulations parameters
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    // Grid Parameters
    /// Number of grid points per axis
    pub resolution: Vec<usize>,
    /// Cell size per axis
    pub spacing: Vec<f64>,
    /// Lower corner of the box
    pub origin: Vec<f64>,

    // Temporal Parameters
    /// Timestep
    pub dt: f64,
    /// Check every step for NaN/Inf
    pub check_finite: bool,

    // Physical Parameters
    /// Uniform dissipation (also the bulk value of a dissipation frame)
    pub gamma: f64,
    pub initial_conditions: InitialConditions,
    pub potential: Option<PotentialParameters>,
    pub dissipation: Option<DissipationParameters>,

    // What to do
    pub run: RunParameters,
    pub defects: DefectParameters,

    // Metadata
    /// Simulation name
    pub sim_name: String,
    /// Seed of the disordered initial state
    pub seed: Option<u64>,
}

impl SimulationParameters {
    /// Unit spacing, zero potential, uniform dissipation and a disordered start
    pub fn new(sim_name: impl Into<String>, resolution: &[usize], dt: f64, gamma: f64) -> Self {
        SimulationParameters {
            resolution: resolution.to_vec(),
            spacing: vec![1.0; resolution.len()],
            origin: vec![0.0; resolution.len()],
            dt,
            check_finite: true,
            gamma,
            initial_conditions: InitialConditions::Disordered {
                noise_strength: dgpe_common::DEFAULT_NOISE_STRENGTH,
            },
            potential: None,
            dissipation: None,
            run: RunParameters::default(),
            defects: DefectParameters::default(),
            sim_name: sim_name.into(),
            seed: None,
        }
    }

    /// Parameters of one stream. With a seed the stream is named `{sim_name}-stream{seed:05}`.
    pub fn from_toml(toml: &TomlParameters, seed: Option<u64>) -> Result<Self, RuntimeError> {
        let dims = toml.grid.resolution.len();
        let sim_name = match seed {
            Some(seed) => format!("{}-stream{:05}", toml.sim_name, seed),
            None => toml.sim_name.clone(),
        };

        let parameters = SimulationParameters {
            resolution: toml.grid.resolution.clone(),
            spacing: toml.grid.spacing.clone().unwrap_or_else(|| vec![1.0; dims]),
            origin: toml.grid.origin.clone().unwrap_or_else(|| vec![0.0; dims]),
            dt: toml.dt,
            check_finite: toml.check_finite,
            gamma: toml.gamma,
            initial_conditions: toml.initial_conditions.clone(),
            potential: toml.potential.clone(),
            dissipation: toml.dissipation.clone(),
            run: toml.run.clone(),
            defects: toml.defects,
            sim_name,
            seed,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks everything that can be checked before building the grid
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let invalid = |msg: String| Err(RuntimeError::InvalidParameter { msg });

        Dimensions::from_usize(self.resolution.len())?;
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return invalid(format!("dt must be positive, got {}", self.dt));
        }
        if !self.gamma.is_finite() {
            return invalid(format!("gamma must be finite, got {}", self.gamma));
        }
        if self.initial_conditions == InitialConditions::ThomasFermi && self.potential.is_none() {
            return invalid("a Thomas-Fermi initial condition needs a potential".to_string());
        }
        if self.dissipation.is_some() && self.run.steps > 0 && self.run.comoving_velocity.is_none()
        {
            return invalid(
                "a dissipation frame can only be evolved in the comoving frame".to_string(),
            );
        }
        if self.run.comoving_velocity.is_some() && self.run.scheme == Scheme::Etd2rk {
            return invalid("the comoving evolver only runs ETD4RK".to_string());
        }
        if !(self.defects.charge_tolerance >= 0.0 && self.defects.ball_radius >= 0.0) {
            return invalid(format!("invalid defect parameters {:?}", self.defects));
        }
        Ok(())
    }
}

impl Display for SimulationParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "resolution     = {:?}", self.resolution)?;
        writeln!(f, "spacing        = {:?}", self.spacing)?;
        writeln!(f, "origin         = {:?}", self.origin)?;
        writeln!(f, "dt             = {}", self.dt)?;
        writeln!(f, "gamma          = {}", self.gamma)?;
        writeln!(f, "relax_steps    = {}", self.run.relax_steps)?;
        writeln!(f, "steps          = {}", self.run.steps)?;
        writeln!(f, "scheme         = {:?}", self.run.scheme)?;
        if let Some(velocity) = self.run.comoving_velocity {
            writeln!(f, "velocity       = {velocity}")?;
        }
        if let Some(seed) = self.seed {
            writeln!(f, "seed           = {seed}")?;
        }
        writeln!(f, "sim_name       = {}", self.sim_name)?;
        writeln!(f, "{}", "-".repeat(40))?;
        Ok(())
    }
}

/// This stores a `SimulationGrid` which has the wavefunction and its Fourier transform,
/// together with the mesh, the FFT plans, the dissipation and the external potential.
pub struct SimulationObject {
    /// This has the wavefunction and its Fourier transform
    grid: SimulationGrid,

    /// This has the simulation parameters
    pub parameters: SimulationParameters,

    mesh: Mesh,
    fft: FftObject,
    k2: RealField,

    gamma: Dissipation,
    v_ext: Potential,

    /// Set by the first time-dependent evolution
    time: Option<f64>,
}

impl SimulationObject {
    /// Builds an object around a given wavefunction
    pub fn new(ψ: Field, parameters: SimulationParameters) -> Result<Self, RuntimeError> {
        parameters.validate()?;
        let mesh = Mesh::new(&parameters.resolution, &parameters.spacing, &parameters.origin)?;
        check_shape(mesh.shape(), ψ.shape())?;

        let fft = FftObject::new(mesh.shape());
        let grid = SimulationGrid::new(ψ, &fft)?;
        let k2 = mesh.k2();

        Ok(SimulationObject {
            grid,
            gamma: Dissipation::Uniform(Complex::new(parameters.gamma, 0.0)),
            parameters,
            mesh,
            fft,
            k2,
            v_ext: Potential::Zero,
            time: None,
        })
    }

    /// Builds the potential, dissipation and initial condition the parameters ask for
    pub fn new_from_params(parameters: SimulationParameters) -> Result<Self, RuntimeError> {
        let ψ = Field::zeros(parameters.resolution.as_slice());
        let mut simulation_object = SimulationObject::new(ψ, parameters)?;

        if let Some(potential) = simulation_object.parameters.potential.clone() {
            let v = match potential {
                PotentialParameters::Harmonic { r_tf } => {
                    simulation_object.harmonic_potential(r_tf)?
                }
                PotentialParameters::GaussianStirrer {
                    size,
                    strength,
                    position,
                } => simulation_object.gaussian_stirring_potential(size, strength, &position)?,
            };
            simulation_object.set_potential(v)?;
        }

        if let Some(DissipationParameters::Frame { d, wx, wy, wz }) =
            simulation_object.parameters.dissipation
        {
            simulation_object.set_spatially_varying_gamma(d, wx, wy, wz)?;
        }

        match simulation_object.parameters.initial_conditions {
            InitialConditions::Disordered { noise_strength } => {
                let seed = simulation_object.parameters.seed.unwrap_or(0);
                simulation_object.set_initial_condition_disordered(noise_strength, seed)?
            }
            InitialConditions::ThomasFermi => {
                simulation_object.set_initial_condition_thomas_fermi()?
            }
        }

        Ok(simulation_object)
    }

    pub fn grid(&self) -> &SimulationGrid {
        &self.grid
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn gamma(&self) -> &Dissipation {
        &self.gamma
    }

    pub fn potential(&self) -> &Potential {
        &self.v_ext
    }

    /// Simulation time of the time-dependent pathway, `None` before its first use
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Replaces ψ and recomputes its transform
    pub fn set_wavefunction(&mut self, ψ: Field) -> Result<(), RuntimeError> {
        check_shape(self.mesh.shape(), ψ.shape())?;
        self.grid = SimulationGrid::new(ψ, &self.fft)?;
        Ok(())
    }

    pub fn set_initial_condition_disordered(
        &mut self,
        noise_strength: f64,
        seed: u64,
    ) -> Result<(), RuntimeError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.set_wavefunction(ics::disordered(&self.mesh, noise_strength, &mut rng))
    }

    /// ψ = sqrt(1 - V_ext). Relax afterwards to reach the ground state.
    pub fn set_initial_condition_thomas_fermi(&mut self) -> Result<(), RuntimeError> {
        let v = self.v_ext.to_field(self.mesh.shape());
        self.set_wavefunction(ics::thomas_fermi(&v))
    }

    pub fn set_potential(&mut self, v: RealField) -> Result<(), RuntimeError> {
        check_shape(self.mesh.shape(), v.shape())?;
        self.v_ext = Potential::Static(v);
        Ok(())
    }

    pub fn harmonic_potential(&self, r_tf: f64) -> Result<RealField, RuntimeError> {
        ics::harmonic_potential(&self.mesh, r_tf)
    }

    pub fn gaussian_stirring_potential(
        &self,
        size: f64,
        strength: f64,
        position: &[f64],
    ) -> Result<RealField, RuntimeError> {
        ics::gaussian_stirring_potential(&self.mesh, size, strength, position)
    }

    /// Calm bulk with the current uniform γ, dissipative frame near the edges.
    /// γ is left untouched on error.
    pub fn set_spatially_varying_gamma(
        &mut self,
        d: f64,
        wx: f64,
        wy: f64,
        wz: f64,
    ) -> Result<(), RuntimeError> {
        let gamma0 = match &self.gamma {
            Dissipation::Uniform(gamma) => gamma.re,
            Dissipation::Field(_) => self.parameters.gamma,
        };
        let gamma = ics::dissipation_frame(&self.mesh, gamma0, d, [wx, wy, wz])?;
        self.gamma = Dissipation::Field(gamma);
        Ok(())
    }

    /// ETD2RK with a static potential
    pub fn evolve_dgpe(&mut self, number_of_steps: usize) -> Result<(), RuntimeError> {
        self.evolve_static(Scheme::Etd2rk, number_of_steps)
    }

    /// ETD4RK with a static potential
    pub fn evolve_dgpe_etd4rk(&mut self, number_of_steps: usize) -> Result<(), RuntimeError> {
        self.evolve_static(Scheme::Etd4rk, number_of_steps)
    }

    /// ETD2RK with the potential V(t) given by `potential_fn`
    pub fn evolve_time_dependent<F>(
        &mut self,
        number_of_steps: usize,
        potential_fn: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(f64) -> RealField,
    {
        self.evolve_time_dependent_with(Scheme::Etd2rk, number_of_steps, potential_fn)
    }

    /// ETD4RK with the potential V(t) given by `potential_fn`
    pub fn evolve_time_dependent_etd4rk<F>(
        &mut self,
        number_of_steps: usize,
        potential_fn: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(f64) -> RealField,
    {
        self.evolve_time_dependent_with(Scheme::Etd4rk, number_of_steps, potential_fn)
    }

    /// Imaginary time relaxation towards the ground state. γ is restored afterwards.
    pub fn evolve_relax(&mut self, number_of_steps: usize) -> Result<(), RuntimeError> {
        let gamma0 = std::mem::replace(&mut self.gamma, Dissipation::Uniform(RELAX_GAMMA));
        let result = self.evolve_dgpe_etd4rk(number_of_steps);
        self.gamma = gamma0;
        result
    }

    /// ETD4RK in the frame moving with `velocity` along x. Supports spatially varying γ.
    pub fn evolve_comoving_dgpe(
        &mut self,
        number_of_steps: usize,
        velocity: f64,
    ) -> Result<(), RuntimeError> {
        let omega = linear_operator(&self.mesh, LinearOperator::Comoving { velocity });
        let factors = IntegratingFactors::new(Scheme::Etd4rk, &omega, self.parameters.dt)?;
        let mut nonlinear = Comoving::new(&self.fft, &self.gamma, &self.v_ext, &self.k2);

        info!(
            "{}: {number_of_steps} comoving steps at velocity {velocity}",
            self.parameters.sim_name
        );
        let start = Instant::now();
        let mut time = self.time.unwrap_or(0.0);
        evolve(
            &factors,
            &mut nonlinear,
            &self.fft,
            &mut self.grid,
            number_of_steps,
            &mut time,
            self.parameters.check_finite,
        )?;
        info!("Finished in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    fn evolve_static(
        &mut self,
        scheme: Scheme,
        number_of_steps: usize,
    ) -> Result<(), RuntimeError> {
        let gamma = self
            .gamma
            .uniform()
            .ok_or(RuntimeError::NonUniformDissipation)?;
        let omega = linear_operator(&self.mesh, LinearOperator::Standard { gamma });
        let factors = IntegratingFactors::new(scheme, &omega, self.parameters.dt)?;
        let mut nonlinear = StaticPotential::new(&self.fft, gamma, &self.v_ext);

        info!(
            "{}: {number_of_steps} {scheme:?} steps with gamma = {gamma}",
            self.parameters.sim_name
        );
        let start = Instant::now();
        // The static pathway does not advance the simulation time
        let mut time = self.time.unwrap_or(0.0);
        evolve(
            &factors,
            &mut nonlinear,
            &self.fft,
            &mut self.grid,
            number_of_steps,
            &mut time,
            self.parameters.check_finite,
        )?;
        info!("Finished in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    fn evolve_time_dependent_with<F>(
        &mut self,
        scheme: Scheme,
        number_of_steps: usize,
        potential_fn: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(f64) -> RealField,
    {
        let gamma = self
            .gamma
            .uniform()
            .ok_or(RuntimeError::NonUniformDissipation)?;
        let omega = linear_operator(&self.mesh, LinearOperator::Standard { gamma });
        let factors = IntegratingFactors::new(scheme, &omega, self.parameters.dt)?;
        let mut nonlinear = TimeDependentPotential::new(&self.fft, gamma, potential_fn);

        let mut time = *self.time.get_or_insert(0.0);
        info!(
            "{}: {number_of_steps} time-dependent {scheme:?} steps from t = {time}",
            self.parameters.sim_name
        );
        let result = evolve(
            &factors,
            &mut nonlinear,
            &self.fft,
            &mut self.grid,
            number_of_steps,
            &mut time,
            self.parameters.check_finite,
        );

        // Hand the potential of the last stage back to the object
        self.time = Some(time);
        if let Some(v) = nonlinear.into_potential() {
            self.v_ext = Potential::Static(v);
        }
        result
    }

    /// F = ∫ ½|∇ψ|² - |ψ|² + V|ψ|² + ½|ψ|⁴ dV, non-increasing under relaxation
    pub fn free_energy(&self) -> f64 {
        let dv = self.mesh.volume_element();

        // Parseval: Σₓ|∇ψ|² = Σₖ k²|ψₖ|² / N
        let gradient = Zip::from(&self.grid.ψk)
            .and(&self.k2)
            .fold(0.0, |acc, ψk, &k2| acc + k2 * ψk.norm_sqr())
            / self.mesh.n_points() as f64;

        let local = match &self.v_ext {
            Potential::Zero => self
                .grid
                .ψ
                .iter()
                .map(|ψ| {
                    let n = ψ.norm_sqr();
                    -n + 0.5 * n * n
                })
                .sum::<f64>(),
            Potential::Static(v) => Zip::from(&self.grid.ψ).and(v).fold(0.0, |acc, ψ, &v| {
                let n = ψ.norm_sqr();
                acc - n + v * n + 0.5 * n * n
            }),
        };

        dv * (0.5 * gradient + local)
    }

    /// Topological charge density of ψ (2D only)
    pub fn vortex_density(&self) -> Result<RealField, RuntimeError> {
        defects::defect_density(
            &self.mesh,
            &self.fft,
            [&real_part(&self.grid.ψ), &imag_part(&self.grid.ψ)],
        )
    }

    /// Vortices of ψ, with the tolerance and ball radius from the parameters (2D only)
    pub fn vortex_nodes(&self) -> Result<Vec<VortexNode>, RuntimeError> {
        let rho = self.vortex_density()?;
        defects::vortex_nodes(
            &self.mesh,
            &rho,
            self.parameters.defects.charge_tolerance,
            self.parameters.defects.ball_radius,
        )
    }

    /// Relaxes, evolves and, in 2D, extracts the vortices of the final state
    pub fn run(&mut self) -> Result<Option<Vec<VortexNode>>, RuntimeError> {
        let run = self.parameters.run.clone();
        debug!("Running {}\n{}", self.parameters.sim_name, self.parameters);

        if run.relax_steps > 0 {
            self.evolve_relax(run.relax_steps)?;
        }
        match (run.comoving_velocity, run.scheme) {
            (Some(velocity), _) => self.evolve_comoving_dgpe(run.steps, velocity)?,
            (None, Scheme::Etd2rk) => self.evolve_dgpe(run.steps)?,
            (None, Scheme::Etd4rk) => self.evolve_dgpe_etd4rk(run.steps)?,
        }

        if self.mesh.dims == Dimensions::Two {
            Ok(Some(self.vortex_nodes()?))
        } else {
            Ok(None)
        }
    }
}

fn check_shape(expected: &[usize], found: &[usize]) -> Result<(), RuntimeError> {
    if expected != found {
        return Err(RuntimeError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::utils::complex::complex_constant;

    #[test]
    fn test_new_grid() {
        let parameters = SimulationParameters::new("grid", &[32], 0.1, 0.1);
        let ψ = complex_constant(Complex::new(1.0, 2.0), &[32]);
        let simulation_object = SimulationObject::new(ψ, parameters).unwrap();

        let ψk = &simulation_object.grid().ψk;
        assert_abs_diff_eq!(ψk[[0]].re, 32.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ψk[[0]].im, 64.0, epsilon = 1e-12);
        assert_eq!(simulation_object.time(), None);
        assert_eq!(simulation_object.potential(), &Potential::Zero);
    }

    #[test]
    fn test_shape_is_checked() {
        let parameters = SimulationParameters::new("shape", &[8, 8], 0.1, 0.1);
        let ψ = complex_constant(Complex::new(1.0, 0.0), &[8, 4]);
        assert!(matches!(
            SimulationObject::new(ψ.clone(), parameters.clone()),
            Err(RuntimeError::ShapeMismatch { .. })
        ));

        let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();
        let before = simulation_object.grid().ψ.clone();
        assert!(simulation_object.set_wavefunction(ψ).is_err());
        assert!(simulation_object
            .set_potential(RealField::zeros(ndarray::IxDyn(&[4])))
            .is_err());
        assert_eq!(simulation_object.grid().ψ, before);
        assert_eq!(simulation_object.potential(), &Potential::Zero);
    }

    #[test]
    fn test_free_energy_of_uniform_condensate() {
        // ψ = 1, V = 0: F = (-1 + 1/2) · volume
        let mut parameters = SimulationParameters::new("energy", &[8, 8], 0.1, 0.1);
        parameters.spacing = vec![0.5, 0.5];
        let ψ = complex_constant(Complex::new(1.0, 0.0), &[8, 8]);
        let simulation_object = SimulationObject::new(ψ, parameters).unwrap();
        assert_abs_diff_eq!(simulation_object.free_energy(), -0.5 * 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_free_energy_gradient_term() {
        // ψ = e^{ikx}: |∇ψ|² = k², so F = (k²/2 - 1/2) · volume
        let parameters = SimulationParameters::new("gradient", &[16], 0.1, 0.1);
        let k = 2.0 * std::f64::consts::PI * 3.0 / 16.0;
        let ψ = Field::from_shape_fn(ndarray::IxDyn(&[16]), |idx| {
            Complex::new(0.0, k * idx[0] as f64).exp()
        });
        let simulation_object = SimulationObject::new(ψ, parameters).unwrap();
        assert_abs_diff_eq!(
            simulation_object.free_energy(),
            16.0 * (0.5 * k * k - 0.5),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_new_from_params() {
        let mut parameters = SimulationParameters::new("tf", &[32, 32], 0.1, 0.05);
        parameters.initial_conditions = InitialConditions::ThomasFermi;
        parameters.potential = Some(PotentialParameters::Harmonic { r_tf: 10.0 });
        parameters.dissipation = Some(DissipationParameters::Frame {
            d: 2.0,
            wx: 10.0,
            wy: 10.0,
            wz: 0.0,
        });

        let simulation_object = SimulationObject::new_from_params(parameters).unwrap();
        // Center of the box is (16, 16)
        assert_abs_diff_eq!(simulation_object.grid().ψ[[16, 16]].re, 1.0);
        assert_eq!(simulation_object.grid().ψ[[0, 0]], Complex::new(0.0, 0.0));
        match simulation_object.gamma() {
            Dissipation::Field(gamma) => {
                assert_abs_diff_eq!(gamma[[16, 16]], 0.05, epsilon = 1e-3)
            }
            Dissipation::Uniform(_) => panic!("expected a dissipation frame"),
        }
    }

    #[test]
    fn test_gamma_frame_needs_two_or_three_dimensions() {
        let parameters = SimulationParameters::new("line", &[32], 0.1, 0.1);
        let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();
        assert!(matches!(
            simulation_object.set_spatially_varying_gamma(7.0, 5.0, 0.0, 0.0),
            Err(RuntimeError::UnsupportedDimension { dims: 1 })
        ));
        assert_eq!(
            simulation_object.gamma(),
            &Dissipation::Uniform(Complex::new(0.1, 0.0))
        );
    }

    #[test]
    fn test_validation() {
        let mut parameters = SimulationParameters::new("bad", &[8, 8], 0.1, 0.1);
        parameters.initial_conditions = InitialConditions::ThomasFermi;
        assert!(parameters.validate().is_err());

        let mut parameters = SimulationParameters::new("bad", &[8, 8], 0.1, 0.1);
        parameters.dissipation = Some(DissipationParameters::Frame {
            d: 7.0,
            wx: 1.0,
            wy: 1.0,
            wz: 0.0,
        });
        parameters.run.steps = 10;
        assert!(parameters.validate().is_err());
        parameters.run.comoving_velocity = Some(0.5);
        assert!(parameters.validate().is_ok());

        // The comoving evolver has no ETD2RK pathway
        parameters.run.scheme = Scheme::Etd2rk;
        assert!(matches!(
            parameters.validate(),
            Err(RuntimeError::InvalidParameter { .. })
        ));

        let parameters = SimulationParameters::new("bad", &[2, 2, 2, 2], 0.1, 0.1);
        assert!(matches!(
            parameters.validate(),
            Err(RuntimeError::UnsupportedDimension { dims: 4 })
        ));
    }
}
