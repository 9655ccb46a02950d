//! Load-stepped static equilibrium by Newton-Raphson
//!
//! Solves f_int(u) = λ f_ext for λ = 1/n, 2/n, …, 1 without inertia.

use log::{debug, info, warn};

use crate::error::FemResult;
use crate::fem::{Assembler, Domain, GlobalData};
use crate::linalg::{solve_system, SolverUtils};
use super::{StepReport, StepStatus};

/// Parameters of the load-stepping Newton solver
#[derive(Debug, Clone, Copy)]
pub struct StaticParams {
    /// Number of equal load increments
    pub load_steps: usize,
    /// Absolute residual tolerance ε
    pub tolerance: f64,
    /// Relative residual tolerance ε0
    pub relative_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for StaticParams {
    fn default() -> Self {
        Self {
            load_steps: 1,
            tolerance: 1e-8,
            relative_tolerance: 1e-8,
            max_iterations: 20,
        }
    }
}

/// Static solver
///
/// Prescribed displacements are applied in full from the first increment;
/// only the external force is scaled. Material history is committed after
/// every increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSolver {
    pub params: StaticParams,
}

impl StaticSolver {
    pub fn new(params: StaticParams) -> Self {
        Self { params }
    }

    /// Run all load increments at the current `globdat.time`
    ///
    /// # Returns
    /// `AcceptedUnconverged` if any increment hit the iteration cap; the
    /// iteration count is the total over all increments.
    #[allow(non_snake_case)]
    pub fn step(&self, globdat: &mut GlobalData, domain: &mut Domain) -> FemResult<StepReport> {
        let p = &self.params;
        domain.check_global_data(globdat)?;

        let n = p.load_steps.max(1);
        let pseudo_dt = 1.0 / n as f64;
        domain.update_domain_state_boundary(globdat)?;
        let fext = domain.external_force(globdat)?;

        let mut all_converged = true;
        let mut total_iterations = 0;
        let mut res_norm = 0.0;

        for step in 1..=n {
            let lambda = step as f64 / n as f64;
            let target: Vec<f64> = fext.iter().map(|f| lambda * f).collect();

            let mut iterations = 0;
            let mut res0 = 0.0;
            let fint = loop {
                domain.update_states(globdat);
                let (fint, K) = Assembler::stiffness_and_force(domain, pseudo_dt)?;

                let res: Vec<f64> = fint.iter().zip(target.iter()).map(|(fi, t)| fi - t).collect();
                res_norm = SolverUtils::norm(&res);
                if iterations == 0 {
                    res0 = res_norm;
                }
                debug!("Static increment {} iter {:3}: |res| = {:.3e}", step, iterations, res_norm);

                if res_norm < p.tolerance || res_norm < p.relative_tolerance * res0 {
                    break fint;
                }
                if iterations >= p.max_iterations {
                    warn!(
                        "Static increment {}/{} not converged after {} iterations (|res| = {:.3e})",
                        step, n, iterations, res_norm
                    );
                    all_converged = false;
                    break fint;
                }

                let du = solve_system(&K, &res)?;
                for (u, d) in globdat.state.iter_mut().zip(du.iter()) {
                    *u -= d;
                }
                iterations += 1;
            };
            total_iterations += iterations;

            domain.commit_history();
            domain.history.push(fint, target, globdat.time);
            domain.dstate.clone_from(&domain.state);
            globdat.dstate.clone_from(&globdat.state);

            info!("Static increment {}/{} (load factor {:.3}) done in {} iterations", step, n, lambda, iterations);
        }

        Ok(StepReport {
            status: if all_converged { StepStatus::Converged } else { StepStatus::AcceptedUnconverged },
            iterations: total_iterations,
            residual_norm: res_norm,
            time: globdat.time,
        })
    }
}
