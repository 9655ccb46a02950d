//! Common linear-solve interface shared by the direct and Krylov backends

use crate::error::FemResult;
use super::SystemMatrix;

/// Outcome of one linear solve
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// Krylov iterations; zero for factorizations
    pub iterations: usize,
    /// ‖b − A x‖
    pub residual_norm: f64,
    /// ‖b − A x‖ / ‖b‖, or the absolute norm when b vanishes
    pub relative_residual: f64,
    pub converged: bool,
}

impl SolverStats {
    /// Measure a computed solution against the system it solves
    ///
    /// # Arguments
    /// * `A` - Operator of the system
    /// * `x` - Candidate solution
    /// * `b` - Right-hand side
    /// * `iterations` - Iterations spent producing `x`
    /// * `tolerance` - Relative residual accepted as converged
    #[allow(non_snake_case)]
    pub fn measure<O: LinearOperator>(A: &O, x: &[f64], b: &[f64], iterations: usize, tolerance: f64) -> Self {
        let residual_norm = SolverUtils::norm(&SolverUtils::residual(A, x, b));
        let b_norm = SolverUtils::norm(b);
        let relative_residual = if b_norm > 1e-14 { residual_norm / b_norm } else { residual_norm };
        Self {
            iterations,
            residual_norm,
            relative_residual,
            converged: relative_residual < tolerance,
        }
    }
}

/// Anything that maps x to A x
pub trait LinearOperator {
    fn apply(&self, v: &[f64]) -> Vec<f64>;

    fn dim(&self) -> usize;
}

impl LinearOperator for SystemMatrix {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        self.mul_vec(v)
    }

    fn dim(&self) -> usize {
        self.nrows()
    }
}

/// Backend solving A x = b for the Newton corrections
pub trait Solver {
    /// # Returns
    /// The solution and the statistics of the solve
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &SystemMatrix, b: &[f64]) -> FemResult<(Vec<f64>, SolverStats)>;

    fn name(&self) -> &str;
}

/// Dense vector kernels on plain slices
pub struct SolverUtils;

impl SolverUtils {
    /// Euclidean norm
    pub fn norm(v: &[f64]) -> f64 {
        Self::dot(v, v).sqrt()
    }

    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    /// r = b − A x
    #[allow(non_snake_case)]
    pub fn residual<O: LinearOperator>(A: &O, x: &[f64], b: &[f64]) -> Vec<f64> {
        A.apply(x).iter().zip(b).map(|(ax, bi)| bi - ax).collect()
    }
}
