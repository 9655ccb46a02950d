pub mod matrix;
pub mod solver;
pub mod direct;
pub mod iterative;
pub mod preconditioner;

pub use matrix::SystemMatrix;
pub use solver::{Solver, SolverStats, SolverUtils, LinearOperator};
pub use direct::DirectSolver;
pub use iterative::BiCGSTAB;
pub use preconditioner::{Preconditioner, JacobiPreconditioner, IdentityPreconditioner};

use log::warn;

use crate::error::{FemError, FemResult};

/// Solve A x = b with the solver matching the matrix backing
///
/// Dense systems are factorized directly. Sparse systems use Jacobi-
/// preconditioned BiCGSTAB and fall back to LU when it stalls.
#[allow(non_snake_case)]
pub fn solve_system(A: &SystemMatrix, b: &[f64]) -> FemResult<Vec<f64>> {
    match A {
        SystemMatrix::Dense(_) => DirectSolver::new().solve(A, b).map(|(x, _)| x),
        SystemMatrix::Sparse(_) => {
            let (x, stats) = BiCGSTAB::new().solve(A, b)?;
            if stats.converged && x.iter().all(|v| v.is_finite()) {
                return Ok(x);
            }
            warn!(
                "BiCGSTAB stalled after {} iterations (rel. residual {:.3e}); falling back to LU",
                stats.iterations, stats.relative_residual
            );
            let (x, stats) = DirectSolver::new().solve(A, b)?;
            if !stats.converged {
                return Err(FemError::LinearSolveFailed {
                    iterations: stats.iterations,
                    residual: stats.residual_norm,
                });
            }
            Ok(x)
        }
    }
}
