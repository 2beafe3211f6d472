use approx::assert_abs_diff_eq;
use dgpe_common::Scheme;
use dgpe_simulator::{
    etd::{evolve, IntegratingFactors},
    simulation_object::{Dissipation, Potential, SimulationGrid},
    spectral::{linear_operator, LinearOperator},
    utils::{fft::FftObject, grid::Mesh, Field, RealField},
    RuntimeError, SimulationObject, SimulationParameters,
};
use ndarray::IxDyn;
use num::Complex;

fn uniform_object(resolution: &[usize], value: Complex<f64>) -> SimulationObject {
    let parameters = SimulationParameters::new("evolution", resolution, 0.1, 0.1);
    let ψ = Field::from_elem(IxDyn(resolution), value);
    SimulationObject::new(ψ, parameters).unwrap()
}

/// Max error over all modes after evolving ∂ₜψ̂ = (ω + λ)ψ̂ to t = 1
fn linear_problem_error(scheme: Scheme, dt: f64) -> f64 {
    let mesh = Mesh::uniform(&[8]).unwrap();
    let fft = FftObject::new(mesh.shape());
    let gamma = Complex::new(0.1, 0.0);
    let lambda = Complex::new(-0.5, 0.8);

    let omega = linear_operator(&mesh, LinearOperator::Standard { gamma });
    let factors = IntegratingFactors::new(scheme, &omega, dt).unwrap();

    let ψ0 = mesh.map_points(|x| Complex::new((0.8 * x[0]).cos(), 0.3 * (1.7 * x[0]).sin()));
    let mut grid = SimulationGrid::new(ψ0, &fft).unwrap();
    let ψk0 = grid.ψk.clone();

    let mut nonlinear = |ψ: &Field, _t: f64| -> Result<Field, RuntimeError> {
        Ok(fft.forward(ψ)?.mapv(|z| z * lambda))
    };
    let steps = (1.0 / dt).round() as usize;
    let mut time = 0.0;
    evolve(&factors, &mut nonlinear, &fft, &mut grid, steps, &mut time, true).unwrap();
    assert_abs_diff_eq!(time, 1.0, epsilon = 1e-12);

    grid.ψk
        .iter()
        .zip(ψk0.iter())
        .zip(omega.iter())
        .map(|((&ψk, &ψk0), &w)| (ψk - ψk0 * (w + lambda).exp()).norm())
        .fold(0.0, f64::max)
}

#[test]
fn test_scheme_order() {
    let etd2 = [0.2, 0.1, 0.05].map(|dt| linear_problem_error(Scheme::Etd2rk, dt));
    let etd4 = [0.2, 0.1, 0.05].map(|dt| linear_problem_error(Scheme::Etd4rk, dt));

    // Halving dt divides the error by 4 and 16 respectively
    for pair in etd2.windows(2) {
        assert!(pair[0] / pair[1] > 3.5, "ETD2RK errors {etd2:?}");
    }
    for pair in etd4.windows(2) {
        assert!(pair[0] / pair[1] > 12.0, "ETD4RK errors {etd4:?}");
    }
    assert!(etd4[2] < etd2[2]);
}

#[test]
fn test_zero_steps_leave_the_field_untouched() {
    let mut parameters = SimulationParameters::new("idle", &[16, 12], 0.1, 0.1);
    parameters.seed = Some(5);
    let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();
    let before = simulation_object.grid().clone();
    let potential = |_t: f64| RealField::ones(IxDyn(&[16, 12]));

    simulation_object.evolve_dgpe(0).unwrap();
    simulation_object.evolve_dgpe_etd4rk(0).unwrap();
    simulation_object.evolve_time_dependent(0, potential).unwrap();
    simulation_object.evolve_time_dependent_etd4rk(0, potential).unwrap();
    simulation_object.evolve_relax(0).unwrap();
    simulation_object.evolve_comoving_dgpe(0, 0.5).unwrap();

    assert_eq!(simulation_object.grid().ψ, before.ψ);
    assert_eq!(simulation_object.grid().ψk, before.ψk);
    assert_eq!(simulation_object.potential(), &Potential::Zero);
}

#[test]
fn test_uniform_condensate_is_stationary() {
    // ψ = 1, V = 0 is a fixed point of the dGPE
    let mut simulation_object = uniform_object(&[16, 16], Complex::new(1.0, 0.0));
    simulation_object.evolve_dgpe(20).unwrap();
    simulation_object.evolve_dgpe_etd4rk(20).unwrap();

    for ψ in simulation_object.grid().ψ.iter() {
        assert_abs_diff_eq!(ψ.re, 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(ψ.im, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_relaxation_lowers_free_energy() {
    let mut parameters = SimulationParameters::new("relax", &[32, 32], 0.1, 0.1);
    parameters.seed = Some(1);
    let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();

    let mut energies = vec![simulation_object.free_energy()];
    for _ in 0..6 {
        simulation_object.evolve_relax(15).unwrap();
        energies.push(simulation_object.free_energy());
    }

    for pair in energies.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9, "free energy went up: {energies:?}");
    }
    assert!(energies[6] < energies[0] - 1.0, "{energies:?}");

    // γ is restored
    assert_eq!(
        simulation_object.gamma(),
        &Dissipation::Uniform(Complex::new(0.1, 0.0))
    );
}

#[test]
fn test_relaxation_reaches_thomas_fermi_bulk() {
    let mut parameters = SimulationParameters::new("trap", &[48, 48], 0.1, 0.1);
    parameters.initial_conditions = dgpe_common::InitialConditions::ThomasFermi;
    parameters.potential = Some(dgpe_common::PotentialParameters::Harmonic { r_tf: 16.0 });
    let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();

    let before = simulation_object.free_energy();
    simulation_object.evolve_relax(50).unwrap();
    assert!(simulation_object.free_energy() <= before);

    // Deep in the bulk the kinetic correction is small
    let ψ = simulation_object.grid().ψ[[24, 24]];
    assert_abs_diff_eq!(ψ.norm(), 1.0, epsilon = 1e-2);
}

#[test]
fn test_time_dependent_stage_times() {
    for (scheme, expected) in [
        (Scheme::Etd2rk, vec![0.0, 0.1]),
        (Scheme::Etd4rk, vec![0.0, 0.05, 0.05, 0.1]),
    ] {
        let mut simulation_object = uniform_object(&[16], Complex::new(1.0, 0.0));
        let mut times = Vec::new();
        let potential = |t: f64| {
            times.push(t);
            RealField::from_elem(IxDyn(&[16]), t)
        };
        let result = match scheme {
            Scheme::Etd2rk => simulation_object.evolve_time_dependent(1, potential),
            Scheme::Etd4rk => simulation_object.evolve_time_dependent_etd4rk(1, potential),
        };
        result.unwrap();

        assert_eq!(times.len(), expected.len());
        for (t, e) in times.iter().zip(expected) {
            assert_abs_diff_eq!(*t, e, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(simulation_object.time().unwrap(), 0.1, epsilon = 1e-12);

        // The potential of the last stage is kept
        match simulation_object.potential() {
            Potential::Static(v) => assert_abs_diff_eq!(v[[7]], 0.1, epsilon = 1e-12),
            Potential::Zero => panic!("potential was not written back"),
        }
    }
}

#[test]
fn test_time_accumulates_across_calls() {
    let mut simulation_object = uniform_object(&[16], Complex::new(1.0, 0.0));
    assert_eq!(simulation_object.time(), None);

    let potential = |_t: f64| RealField::zeros(IxDyn(&[16]));
    simulation_object.evolve_time_dependent(3, potential).unwrap();
    simulation_object.evolve_time_dependent_etd4rk(2, potential).unwrap();
    assert_abs_diff_eq!(simulation_object.time().unwrap(), 0.5, epsilon = 1e-12);

    // Static evolvers do not advance it
    simulation_object.evolve_dgpe(4).unwrap();
    assert_abs_diff_eq!(simulation_object.time().unwrap(), 0.5, epsilon = 1e-12);
}

#[test]
fn test_time_dependent_potential_shape_mismatch() {
    let mut simulation_object = uniform_object(&[16], Complex::new(1.0, 0.0));
    let result = simulation_object.evolve_time_dependent(2, |_t| RealField::zeros(IxDyn(&[8])));
    assert!(matches!(result, Err(RuntimeError::ShapeMismatch { .. })));
}

#[test]
fn test_comoving_frame_with_dissipative_edges() {
    let mut parameters = SimulationParameters::new("stir", &[32, 32], 0.05, 0.01);
    parameters.initial_conditions = dgpe_common::InitialConditions::ThomasFermi;
    parameters.potential = Some(dgpe_common::PotentialParameters::GaussianStirrer {
        size: 3.0,
        strength: 2.0,
        position: vec![16.0, 16.0],
    });
    let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();
    simulation_object
        .set_spatially_varying_gamma(3.0, 10.0, 10.0, 0.0)
        .unwrap();

    // The standard evolvers refuse a spatially varying γ
    let before = simulation_object.grid().clone();
    assert!(matches!(
        simulation_object.evolve_dgpe_etd4rk(5),
        Err(RuntimeError::NonUniformDissipation)
    ));
    assert!(matches!(
        simulation_object.evolve_time_dependent(5, |_t| RealField::zeros(IxDyn(&[32, 32]))),
        Err(RuntimeError::NonUniformDissipation)
    ));
    assert_eq!(simulation_object.grid().ψ, before.ψ);

    simulation_object.evolve_comoving_dgpe(40, 0.4).unwrap();
    let ψ = &simulation_object.grid().ψ;
    assert!(ψ.iter().all(|z| z.re.is_finite() && z.im.is_finite()));
    assert!(ψ.iter().all(|z| z.norm() < 2.0));
}

#[test]
fn test_comoving_velocity_advects_the_field() {
    let evolved = |velocity: Option<f64>| {
        let mut parameters = SimulationParameters::new("advect", &[32, 32], 0.1, 0.1);
        parameters.seed = Some(9);
        let mut simulation_object = SimulationObject::new_from_params(parameters).unwrap();
        match velocity {
            Some(velocity) => simulation_object.evolve_comoving_dgpe(10, velocity).unwrap(),
            None => simulation_object.evolve_dgpe_etd4rk(10).unwrap(),
        }
        simulation_object.grid().ψ.clone()
    };
    let max_difference = |a: &Field, b: &Field| {
        a.iter()
            .zip(b.iter())
            .fold(0.0, |acc: f64, (x, y)| acc.max((x - y).norm()))
    };

    // At rest the comoving evolver reduces to the standard one
    let standard = evolved(None);
    let at_rest = evolved(Some(0.0));
    let moving = evolved(Some(0.5));
    assert_abs_diff_eq!(max_difference(&standard, &at_rest), 0.0, epsilon = 1e-9);
    assert!(max_difference(&at_rest, &moving) > 1e-4);
}

#[test]
fn test_divergence_is_reported() {
    let mut simulation_object = uniform_object(&[16], Complex::new(1e200, 0.0));
    assert!(matches!(
        simulation_object.evolve_dgpe(3),
        Err(RuntimeError::NanOrInf { step: 1 })
    ));

    // Without the check the loop runs to the end
    let mut simulation_object = uniform_object(&[16], Complex::new(1e200, 0.0));
    simulation_object.parameters.check_finite = false;
    simulation_object.evolve_dgpe(3).unwrap();
    assert!(simulation_object
        .grid()
        .ψ
        .iter()
        .any(|z| !z.re.is_finite() || !z.im.is_finite()));
}

#[test]
fn test_dimension_guard() {
    assert!(matches!(
        Mesh::uniform(&[4, 4, 4, 4]),
        Err(RuntimeError::UnsupportedDimension { dims: 4 })
    ));
    let parameters = SimulationParameters::new("hyper", &[4, 4, 4, 4], 0.1, 0.1);
    assert!(matches!(
        SimulationObject::new_from_params(parameters),
        Err(RuntimeError::UnsupportedDimension { dims: 4 })
    ));

    let mut simulation_object = uniform_object(&[16], Complex::new(1.0, 0.0));
    let before = simulation_object.grid().clone();
    assert!(matches!(
        simulation_object.set_spatially_varying_gamma(7.0, 4.0, 0.0, 0.0),
        Err(RuntimeError::UnsupportedDimension { dims: 1 })
    ));
    assert_eq!(
        simulation_object.gamma(),
        &Dissipation::Uniform(Complex::new(0.1, 0.0))
    );
    assert_eq!(simulation_object.grid().ψ, before.ψ);
}
