//! Error types for the assembly and time-integration engine

use thiserror::Error;

/// Main error type for domain setup, assembly and solver steps
#[derive(Error, Debug)]
pub enum FemError {
    #[error("Mass matrix not assembled - call Domain::assemble_mass_matrix first")]
    MassNotAssembled,

    #[error("Mass matrix already assembled for this domain")]
    MassAlreadyAssembled,

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid boundary code {code} at node {node}, dof {dof} (expected 0, -1 or -2)")]
    InvalidBoundaryCode { node: usize, dof: usize, code: i32 },

    #[error("Invalid material properties: {0}")]
    InvalidMaterial(String),

    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("Unsupported solver '{0}'")]
    UnsupportedSolver(String),

    #[error("Singular system matrix")]
    SingularMatrix,

    #[error("Linear solver failed after {iterations} iterations (residual {residual:.3e})")]
    LinearSolveFailed { iterations: usize, residual: f64 },

    #[error("Constitutive update failed: {0}")]
    ConstitutiveFailure(String),

    #[error("Adaptive step {dt:.3e} fell below minimum {min_dt:.3e} at t = {time:.6e}")]
    StepUnderflow { dt: f64, min_dt: f64, time: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl FemError {
    /// Errors a failsafe Newton step treats as divergence rather than a fault
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            FemError::ConstitutiveFailure(_)
                | FemError::SingularMatrix
                | FemError::LinearSolveFailed { .. }
        )
    }
}

/// Result type for engine operations
pub type FemResult<T> = Result<T, FemError>;
