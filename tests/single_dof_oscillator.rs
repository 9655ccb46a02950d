//! Spring-mass oscillator: one free DOF of a unit-square element
//!
//! With only one equation the discrete system is exactly m ü + k u = 0, so
//! u(t) = u0 cos(ωt) with ω² = k/m taken from the assembled matrices.

mod common;

use std::f64::consts::PI;

use common::{elastic_props, init_logging, sdof_setup};
use solid_dynamics::{
    Assembler, Domain, ExplicitSolver, GeneralizedAlpha, GlobalData, NewmarkParams, NewmarkSolver,
};

const U0: f64 = 1e-3;

/// Domain and state displaced by U0 with a consistent initial acceleration
fn released(lumped: bool) -> (Domain, GlobalData, f64) {
    let mut domain = Domain::from_setup(&sdof_setup(elastic_props())).unwrap();
    let mut globdat = GlobalData::new(domain.neqs());
    assert_eq!(domain.neqs(), 1);
    domain.assemble_mass_matrix(&mut globdat).unwrap();

    let (_, k) = Assembler::stiffness_and_force(&mut domain, 0.0).unwrap();
    let m = globdat.mass().unwrap().get(0, 0);
    let omega = (k.get(0, 0) / m).sqrt();

    globdat.state = vec![U0];
    if lumped {
        globdat.initialize_acceleration_lumped(&mut domain).unwrap();
    } else {
        globdat.initialize_acceleration(&mut domain).unwrap();
    }
    assert!((globdat.acce[0] + omega * omega * U0).abs() < 1e-9 * omega * omega * U0);
    (domain, globdat, omega)
}

fn max_error_over_period<F>(mut step: F, globdat: &mut GlobalData, domain: &mut Domain, omega: f64) -> f64
where
    F: FnMut(f64, &mut GlobalData, &mut Domain),
{
    let period = 2.0 * PI / omega;
    let dt = period / 100.0;
    let mut max_err: f64 = 0.0;
    for _ in 0..100 {
        step(dt, globdat, domain);
        let exact = U0 * (omega * globdat.time).cos();
        max_err = max_err.max((globdat.state[0] - exact).abs());
    }
    assert!((globdat.time - period).abs() < 1e-9 * period);
    max_err
}

#[test]
fn newmark_average_acceleration_tracks_analytic_solution() {
    init_logging();
    let (mut domain, mut globdat, omega) = released(false);
    let solver = NewmarkSolver::new(NewmarkParams { alpha: GeneralizedAlpha::newmark(), ..NewmarkParams::default() });

    let err = max_error_over_period(
        |dt, g, d| {
            let report = solver.step(dt, g, d).unwrap();
            assert!(report.converged());
        },
        &mut globdat,
        &mut domain,
        omega,
    );
    assert!(err < 0.01 * U0, "max error {:.3e}", err);
    assert_eq!(domain.history.len(), 100);
}

#[test]
fn undamped_generalized_alpha_tracks_analytic_solution() {
    init_logging();
    let (mut domain, mut globdat, omega) = released(false);
    let alpha = GeneralizedAlpha::from_spectral_radius(1.0).unwrap();
    let solver = NewmarkSolver::new(NewmarkParams { alpha, ..NewmarkParams::default() });

    let err = max_error_over_period(
        |dt, g, d| {
            assert!(solver.step(dt, g, d).unwrap().converged());
        },
        &mut globdat,
        &mut domain,
        omega,
    );
    assert!(err < 0.01 * U0, "max error {:.3e}", err);
}

#[test]
fn numerical_dissipation_reduces_amplitude() {
    init_logging();
    let (mut domain, mut globdat, omega) = released(false);
    let alpha = GeneralizedAlpha::from_spectral_radius(0.0).unwrap();
    let solver = NewmarkSolver::new(NewmarkParams { alpha, ..NewmarkParams::default() });

    // Coarse steps: ωΔt = 2π/5 is well into the damped range
    let dt = 2.0 * PI / omega / 5.0;
    for _ in 0..20 {
        solver.step(dt, &mut globdat, &mut domain).unwrap();
    }
    let energy = omega * omega * globdat.state[0].powi(2) + globdat.velo[0].powi(2);
    let energy0 = omega * omega * U0 * U0;
    assert!(energy < 0.5 * energy0);
}

#[test]
fn central_difference_tracks_analytic_solution() {
    init_logging();
    let (mut domain, mut globdat, omega) = released(true);
    let solver = ExplicitSolver::new();

    let err = max_error_over_period(
        |dt, g, d| {
            solver.step(dt, g, d).unwrap();
        },
        &mut globdat,
        &mut domain,
        omega,
    );
    assert!(err < 0.01 * U0, "max error {:.3e}", err);
}
