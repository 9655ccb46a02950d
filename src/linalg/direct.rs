//! Dense LU backend

use nalgebra::DVector;

use crate::error::{FemError, FemResult};
use super::solver::{Solver, SolverStats};
use super::SystemMatrix;

/// Relative residual above which a factorized solution is flagged unconverged
const LU_ACCEPT: f64 = 1e-8;

/// LU factorization with partial pivoting
///
/// Sparse operands are densified first, so this is meant for the small
/// systems below the sparse threshold and as the fallback when the Krylov
/// backend stalls.
#[derive(Debug, Clone, Default)]
pub struct DirectSolver;

impl DirectSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for DirectSolver {
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &SystemMatrix, b: &[f64]) -> FemResult<(Vec<f64>, SolverStats)> {
        let n = A.nrows();
        if A.ncols() != n || b.len() != n {
            return Err(FemError::DimensionMismatch {
                context: "linear system".to_string(),
                expected: n,
                actual: b.len(),
            });
        }

        let x: Vec<f64> = A
            .to_dense()
            .lu()
            .solve(&DVector::from_column_slice(b))
            .ok_or(FemError::SingularMatrix)?
            .iter()
            .copied()
            .collect();
        // Near-singular pivots surface as inf / NaN rather than a failed solve
        if !x.iter().all(|v| v.is_finite()) {
            return Err(FemError::SingularMatrix);
        }

        let stats = SolverStats::measure(A, &x, b, 0, LU_ACCEPT);
        Ok((x, stats))
    }

    fn name(&self) -> &str {
        "Direct (LU)"
    }
}
