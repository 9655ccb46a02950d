//! Adaptive timestepping strategies
//!
//! Wraps the implicit solver with step halving on rejection and step
//! doubling after a run of accepted steps.

use std::str::FromStr;

use log::{info, warn};

use crate::error::{FemError, FemResult};
use crate::fem::{Domain, GlobalData};
use super::{NewmarkParams, NewmarkSolver};

/// Step solver driven by the adaptive controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Newmark,
}

impl FromStr for SolverKind {
    type Err = FemError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "NewmarkSolver" | "Newmark" | "GeneralizedAlpha" => Ok(SolverKind::Newmark),
            other => Err(FemError::UnsupportedSolver(other.to_string())),
        }
    }
}

/// Step-size control parameters
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveParams {
    /// Total duration T
    pub total_time: f64,
    /// Nominal step count NT (nominal Δt = T / NT)
    pub nominal_steps: usize,
    /// Abort once Δt drops below this fraction of the nominal step
    pub min_dt_fraction: f64,
    /// Consecutive accepted steps before Δt may grow
    pub growth_after: usize,
    /// Δt doubles only while below this fraction of the nominal step
    pub growth_threshold: f64,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            total_time: 1.0,
            nominal_steps: 100,
            min_dt_fraction: 1e-6,
            growth_after: 5,
            growth_threshold: 0.8,
        }
    }
}

/// Realized step sequence of an adaptive run
#[derive(Debug, Clone, Default)]
pub struct AdaptiveReport {
    /// Simulation time at the start and after every accepted step
    pub times: Vec<f64>,
    pub accepted: usize,
    pub rejected: usize,
}

/// Adaptive step-size controller
#[derive(Debug, Clone)]
pub struct AdaptiveSolver {
    kind: SolverKind,
    pub params: AdaptiveParams,
    pub newmark: NewmarkParams,
}

impl AdaptiveSolver {
    /// Resolve the inner solver by name
    ///
    /// # Errors
    /// `UnsupportedSolver` for any name other than the Newmark solver.
    pub fn new(solver: &str, params: AdaptiveParams, newmark: NewmarkParams) -> FemResult<Self> {
        let kind = solver.parse::<SolverKind>()?;
        if params.total_time <= 0.0 || params.nominal_steps == 0 {
            return Err(FemError::InvalidInput(format!(
                "adaptive run needs total_time > 0 and nominal_steps > 0, got {} and {}",
                params.total_time, params.nominal_steps
            )));
        }
        Ok(Self { kind, params, newmark })
    }

    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    /// Integrate over `[globdat.time, globdat.time + T]`
    ///
    /// The inner solver always runs with failsafe on, so a rejected step
    /// leaves the state untouched and is retried with half the step.
    ///
    /// # Errors
    /// `StepUnderflow` when Δt falls below the minimum step; any fatal
    /// error of the inner solver.
    pub fn run(&self, globdat: &mut GlobalData, domain: &mut Domain) -> FemResult<AdaptiveReport> {
        let p = &self.params;
        let total = p.total_time;
        let nominal = total / p.nominal_steps as f64;
        let min_dt = p.min_dt_fraction * nominal;

        let solver = match self.kind {
            SolverKind::Newmark => NewmarkSolver::new(NewmarkParams { failsafe: true, ..self.newmark }),
        };

        let mut report = AdaptiveReport {
            times: vec![globdat.time],
            ..AdaptiveReport::default()
        };
        let mut dt = nominal;
        let mut elapsed = 0.0;
        let mut successes = 0;

        while total - elapsed > 1e-12 * total {
            dt = dt.min(total - elapsed);

            let step = solver.step(dt, globdat, domain)?;
            if step.succeeded() {
                elapsed += dt;
                report.times.push(globdat.time);
                report.accepted += 1;
                successes += 1;
                info!(
                    "Adaptive step accepted: t = {:.6e}, dt = {:.3e}, {} Newton iterations",
                    globdat.time, dt, step.iterations
                );

                if successes >= p.growth_after && dt < p.growth_threshold * nominal {
                    dt *= 2.0;
                    successes = 0;
                }
            } else {
                report.rejected += 1;
                successes = 0;
                dt *= 0.5;
                warn!(
                    "Adaptive step rejected at t = {:.6e}; retrying with dt = {:.3e}",
                    globdat.time, dt
                );
                if dt < min_dt {
                    return Err(FemError::StepUnderflow { dt, min_dt, time: globdat.time });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_name_dispatch() {
        assert_eq!("NewmarkSolver".parse::<SolverKind>().unwrap(), SolverKind::Newmark);
        let err = "RungeKutta".parse::<SolverKind>().unwrap_err();
        assert!(matches!(err, FemError::UnsupportedSolver(ref name) if name == "RungeKutta"));
    }

    #[test]
    fn test_construction_validates() {
        let params = AdaptiveParams::default();
        assert!(AdaptiveSolver::new("ExplicitSolver", params, NewmarkParams::default()).is_err());

        let bad = AdaptiveParams { nominal_steps: 0, ..params };
        assert!(AdaptiveSolver::new("NewmarkSolver", bad, NewmarkParams::default()).is_err());

        let ok = AdaptiveSolver::new("NewmarkSolver", params, NewmarkParams::default()).unwrap();
        assert_eq!(ok.kind(), SolverKind::Newmark);
    }
}
