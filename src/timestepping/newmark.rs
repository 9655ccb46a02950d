//! Implicit generalized-alpha time integration with Newton-Raphson
//!
//! The unknown of each Newton iteration is the end-of-step acceleration.
//!
//! # References
//! - Chung & Hulbert, "A Time Integration Algorithm for Structural Dynamics
//!   With Improved Numerical Dissipation: The Generalized-α Method" (1993)
//! - Hughes, "The Finite Element Method", Ch. 9

use log::{debug, warn};

use crate::error::{FemError, FemResult};
use crate::fem::{Assembler, Domain, GlobalData};
use crate::linalg::{solve_system, SolverUtils, SystemMatrix};
use super::{StepReport, StepSnapshot, StepStatus};

/// Generalized-alpha dissipation parameters (αm, αf)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralizedAlpha {
    pub alpha_m: f64,
    pub alpha_f: f64,
}

impl GeneralizedAlpha {
    /// Parameters for a high-frequency spectral radius ρ∞ ∈ [0, 1]
    ///
    /// αm = (2ρ∞ − 1)/(ρ∞ + 1), αf = ρ∞/(ρ∞ + 1). ρ∞ = 1 gives αm = αf = ½,
    /// which is non-dissipative and matches average-acceleration Newmark on
    /// linear problems started from a consistent acceleration.
    pub fn from_spectral_radius(rho_inf: f64) -> FemResult<Self> {
        if !(0.0..=1.0).contains(&rho_inf) {
            return Err(FemError::InvalidInput(format!(
                "spectral radius must lie in [0, 1], got {}",
                rho_inf
            )));
        }
        Ok(Self {
            alpha_m: (2.0 * rho_inf - 1.0) / (rho_inf + 1.0),
            alpha_f: rho_inf / (rho_inf + 1.0),
        })
    }

    /// Classical Newmark average acceleration (αm = αf = 0)
    pub fn newmark() -> Self {
        Self { alpha_m: 0.0, alpha_f: 0.0 }
    }

    /// β = ¼(1 − αm + αf)²
    pub fn beta(&self) -> f64 {
        0.25 * (1.0 - self.alpha_m + self.alpha_f).powi(2)
    }

    /// γ = ½ − αm + αf
    pub fn gamma(&self) -> f64 {
        0.5 - self.alpha_m + self.alpha_f
    }
}

impl Default for GeneralizedAlpha {
    fn default() -> Self {
        Self::newmark()
    }
}

/// Parameters of one implicit step
#[derive(Debug, Clone, Copy)]
pub struct NewmarkParams {
    pub alpha: GeneralizedAlpha,
    /// Absolute residual tolerance ε
    pub tolerance: f64,
    /// Relative residual tolerance ε0 (against the first residual)
    pub relative_tolerance: f64,
    pub max_iterations: usize,
    /// Initial Newton step scaling η
    pub damping: f64,
    /// Roll back and report on non-convergence instead of accepting the iterate
    pub failsafe: bool,
}

impl Default for NewmarkParams {
    fn default() -> Self {
        Self {
            alpha: GeneralizedAlpha::newmark(),
            tolerance: 1e-8,
            relative_tolerance: 1e-8,
            max_iterations: 20,
            damping: 1.0,
            failsafe: false,
        }
    }
}

/// Generalized-alpha solver
///
/// **Algorithm** (per step, unknown a_{n+1}):
/// - u* = (1−αf)(u_n + Δt v_n + ½Δt²((1−2β)a_n + 2β a_{n+1})) + αf u_n
/// - r  = M((1−αm)a_{n+1} + αm a_n) + f_int(u*) − f_ext(t_{n+1−αf})
/// - A  = (1−αm)M + (1−αf)βΔt² K(u*)
/// - a_{n+1} ← a_{n+1} − η A⁻¹ r, with η halved while the scaled correction
///   grows relative to the previous one
#[derive(Debug, Clone, Copy, Default)]
pub struct NewmarkSolver {
    pub params: NewmarkParams,
}

/// Newton iteration count and last residual of the step in progress
#[derive(Debug, Clone, Copy, Default)]
struct NewtonTrace {
    iterations: usize,
    residual_norm: f64,
}

impl NewmarkSolver {
    pub fn new(params: NewmarkParams) -> Self {
        Self { params }
    }

    /// Advance `globdat` and `domain` by one step of size `dt`
    ///
    /// A step either completes or leaves `globdat`, `domain.state` and
    /// `domain.dstate` exactly as before the call, whether it is rejected
    /// or fails with an error.
    ///
    /// # Returns
    /// `Reverted` when Newton fails under failsafe, including divergence
    /// during the end-of-step evaluation.
    ///
    /// # Errors
    /// `MassNotAssembled`, dimension errors, and divergence-type errors when
    /// failsafe is off.
    pub fn step(&self, dt: f64, globdat: &mut GlobalData, domain: &mut Domain) -> FemResult<StepReport> {
        domain.check_global_data(globdat)?;
        if !domain.is_mass_assembled() {
            return Err(FemError::MassNotAssembled);
        }

        let snapshot = StepSnapshot::take(globdat, domain);
        let time0 = snapshot.time();
        let mut trace = NewtonTrace::default();

        let rejected = match self.advance(dt, globdat, domain, &mut trace) {
            Ok(Some(report)) => return Ok(report),
            Ok(None) => None,
            Err(e) if self.params.failsafe && e.is_divergence() => Some(e),
            Err(e) => {
                snapshot.restore(globdat, domain);
                return Err(e);
            }
        };

        match rejected {
            Some(e) => debug!("Newmark step at t = {:.6e} diverged ({}); reverting", time0 + dt, e),
            None => debug!("Newmark step at t = {:.6e} rejected; reverting", time0 + dt),
        }
        snapshot.restore(globdat, domain);
        Ok(StepReport {
            status: StepStatus::Reverted,
            iterations: trace.iterations,
            residual_norm: trace.residual_norm,
            time: time0,
        })
    }

    /// Newton loop and end-of-step update
    ///
    /// Returns `None` when the iteration cap is hit under failsafe. Any
    /// `Err` leaves partial state behind; `step` restores it.
    #[allow(non_snake_case)]
    fn advance(
        &self,
        dt: f64,
        globdat: &mut GlobalData,
        domain: &mut Domain,
        trace: &mut NewtonTrace,
    ) -> FemResult<Option<StepReport>> {
        let p = &self.params;
        let GeneralizedAlpha { alpha_m: am, alpha_f: af } = p.alpha;
        let beta2 = 2.0 * p.alpha.beta();
        let gamma = p.alpha.gamma();

        let time0 = globdat.time;
        globdat.time = time0 + (1.0 - af) * dt;
        domain.dstate.clone_from(&domain.state);
        domain.update_domain_state_boundary(globdat)?;

        let u_n = globdat.state.clone();
        let v_n = globdat.velo.clone();
        let a_n = globdat.acce.clone();
        let fext = domain.external_force(globdat)?;
        let M = globdat.mass()?;

        let predictor = |a: &[f64]| -> Vec<f64> {
            (0..u_n.len())
                .map(|i| {
                    let u_full = u_n[i]
                        + dt * v_n[i]
                        + 0.5 * dt * dt * ((1.0 - beta2) * a_n[i] + beta2 * a[i]);
                    (1.0 - af) * u_full + af * u_n[i]
                })
                .collect()
        };

        let mut a_trial = a_n.clone();
        let mut eta = p.damping;
        let mut norm0 = f64::INFINITY;
        let mut res0 = 0.0;

        let converged = loop {
            domain.set_free_state(&predictor(&a_trial));
            let (fint, K) = Assembler::stiffness_and_force(domain, dt)?;

            let mass_term: Vec<f64> = a_trial
                .iter()
                .zip(a_n.iter())
                .map(|(a, an)| (1.0 - am) * a + am * an)
                .collect();
            let res: Vec<f64> = M
                .mul_vec(&mass_term)
                .iter()
                .zip(fint.iter().zip(fext.iter()))
                .map(|(m, (fi, fe))| m + fi - fe)
                .collect();

            let res_norm = SolverUtils::norm(&res);
            trace.residual_norm = res_norm;
            if trace.iterations == 0 {
                res0 = res_norm;
            }
            debug!(
                "Newmark iter {:3}: |res| = {:.3e}, rel = {:.3e}, eta = {:.3}",
                trace.iterations,
                res_norm,
                if res0 > 0.0 { res_norm / res0 } else { 0.0 },
                eta
            );

            if !res_norm.is_finite() {
                return Err(FemError::ConstitutiveFailure("non-finite Newton residual".to_string()));
            }
            if res_norm < p.tolerance || res_norm < p.relative_tolerance * res0 {
                break true;
            }
            if trace.iterations >= p.max_iterations {
                break false;
            }

            let A = SystemMatrix::linear_combination(
                1.0 - am,
                M,
                (1.0 - af) * 0.5 * beta2 * dt * dt,
                &K,
            );
            let delta = solve_system(&A, &res)?;

            let delta_norm = SolverUtils::norm(&delta);
            while eta * delta_norm > norm0 {
                eta *= 0.5;
            }
            for (a, d) in a_trial.iter_mut().zip(delta.iter()) {
                *a -= eta * d;
            }
            norm0 = delta_norm;
            eta = (2.0 * eta).min(1.0);
            trace.iterations += 1;
        };

        let status = if converged {
            StepStatus::Converged
        } else if p.failsafe {
            return Ok(None);
        } else {
            warn!(
                "Newmark step at t = {:.6e} not converged after {} iterations (|res| = {:.3e}); accepting last iterate",
                time0 + dt,
                trace.iterations,
                trace.residual_norm
            );
            StepStatus::AcceptedUnconverged
        };

        let a_new = a_trial;
        for i in 0..a_new.len() {
            globdat.state[i] = u_n[i]
                + dt * v_n[i]
                + 0.5 * dt * dt * ((1.0 - beta2) * a_n[i] + beta2 * a_new[i]);
            globdat.velo[i] = v_n[i] + dt * ((1.0 - gamma) * a_n[i] + gamma * a_new[i]);
        }
        globdat.acce = a_new;
        globdat.dstate = u_n;
        globdat.time += af * dt;

        // Materials are re-evaluated at u_{n+1}; history is touched only
        // once this evaluation has succeeded
        domain.update_domain_state_boundary(globdat)?;
        domain.update_states(globdat);
        let fint = Assembler::internal_force(domain, dt)?;
        let fext = domain.external_force(globdat)?;
        domain.commit_history();
        domain.history.push(fint, fext, globdat.time);

        Ok(Some(StepReport {
            status,
            iterations: trace.iterations,
            residual_norm: trace.residual_norm,
            time: globdat.time,
        }))
    }
}
