//! Configuration management for solver runs
//!
//! Reads TOML configuration files into solver parameters. Every section
//! and field is optional and falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FemError, FemResult};
use crate::fem::{Domain, ProblemSetup, DEFAULT_SPARSE_THRESHOLD};
use crate::timestepping::{
    AdaptiveParams, AdaptiveSolver, GeneralizedAlpha, NewmarkParams, StaticParams,
};

/// Main solver configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub newmark: NewmarkConfig,
    pub static_solver: StaticConfig,
    pub adaptive: AdaptiveConfig,
    pub assembly: AssemblyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewmarkConfig {
    /// Spectral radius ρ∞; overrides alpha_m / alpha_f when set
    pub rho_inf: Option<f64>,
    pub alpha_m: f64,
    pub alpha_f: f64,
    pub tolerance: f64,
    pub relative_tolerance: f64,
    pub max_iterations: usize,
    pub damping: f64,
    pub failsafe: bool,
}

impl Default for NewmarkConfig {
    fn default() -> Self {
        let p = NewmarkParams::default();
        Self {
            rho_inf: None,
            alpha_m: p.alpha.alpha_m,
            alpha_f: p.alpha.alpha_f,
            tolerance: p.tolerance,
            relative_tolerance: p.relative_tolerance,
            max_iterations: p.max_iterations,
            damping: p.damping,
            failsafe: p.failsafe,
        }
    }
}

impl NewmarkConfig {
    pub fn to_params(&self) -> FemResult<NewmarkParams> {
        let alpha = match self.rho_inf {
            Some(rho) => GeneralizedAlpha::from_spectral_radius(rho)?,
            None => GeneralizedAlpha { alpha_m: self.alpha_m, alpha_f: self.alpha_f },
        };
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(FemError::InvalidInput(format!(
                "newmark.damping must lie in (0, 1], got {}",
                self.damping
            )));
        }
        Ok(NewmarkParams {
            alpha,
            tolerance: self.tolerance,
            relative_tolerance: self.relative_tolerance,
            max_iterations: self.max_iterations,
            damping: self.damping,
            failsafe: self.failsafe,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub load_steps: usize,
    pub tolerance: f64,
    pub relative_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for StaticConfig {
    fn default() -> Self {
        let p = StaticParams::default();
        Self {
            load_steps: p.load_steps,
            tolerance: p.tolerance,
            relative_tolerance: p.relative_tolerance,
            max_iterations: p.max_iterations,
        }
    }
}

impl StaticConfig {
    pub fn to_params(&self) -> FemResult<StaticParams> {
        if self.load_steps == 0 {
            return Err(FemError::InvalidInput("static_solver.load_steps must be positive".to_string()));
        }
        Ok(StaticParams {
            load_steps: self.load_steps,
            tolerance: self.tolerance,
            relative_tolerance: self.relative_tolerance,
            max_iterations: self.max_iterations,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Inner solver name
    pub solver: String,
    pub total_time: f64,
    pub nominal_steps: usize,
    pub min_dt_fraction: f64,
    pub growth_after: usize,
    pub growth_threshold: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        let p = AdaptiveParams::default();
        Self {
            solver: "NewmarkSolver".to_string(),
            total_time: p.total_time,
            nominal_steps: p.nominal_steps,
            min_dt_fraction: p.min_dt_fraction,
            growth_after: p.growth_after,
            growth_threshold: p.growth_threshold,
        }
    }
}

impl AdaptiveConfig {
    pub fn to_params(&self) -> AdaptiveParams {
        AdaptiveParams {
            total_time: self.total_time,
            nominal_steps: self.nominal_steps,
            min_dt_fraction: self.min_dt_fraction,
            growth_after: self.growth_after,
            growth_threshold: self.growth_threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Equation count above which system matrices are held sparse
    pub sparse_threshold: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self { sparse_threshold: DEFAULT_SPARSE_THRESHOLD }
    }
}

impl SolverConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> FemResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> FemResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build a domain from `setup` with the configured assembly settings
    pub fn build_domain(&self, setup: &ProblemSetup) -> FemResult<Domain> {
        Ok(Domain::from_setup(setup)?.with_sparse_threshold(self.assembly.sparse_threshold))
    }

    /// Adaptive controller with the configured inner solver and Newmark settings
    pub fn adaptive_solver(&self) -> FemResult<AdaptiveSolver> {
        AdaptiveSolver::new(&self.adaptive.solver, self.adaptive.to_params(), self.newmark.to_params()?)
    }
}
