//! Preconditioned BiCGSTAB for the sparse effective Jacobians
//!
//! The Jacobians are symmetric only when every material tangent is, so a
//! nonsymmetric Krylov method is used throughout.
//!
//! # References
//! - van der Vorst, "Bi-CGSTAB: A Fast and Smoothly Converging Variant of
//!   Bi-CG for the Solution of Nonsymmetric Linear Systems" (1992)

use log::debug;

use crate::error::FemResult;
use super::preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
use super::solver::{LinearOperator, Solver, SolverStats, SolverUtils};
use super::SystemMatrix;

/// Breakdown guard on the BiCGSTAB scalars
const BREAKDOWN: f64 = 1e-300;

#[derive(Debug, Clone)]
pub struct BiCGSTAB {
    max_iterations: usize,
    /// Stop once ‖r‖ < tolerance · ‖b‖
    tolerance: f64,
    /// ... or ‖r‖ < abs_tolerance
    abs_tolerance: f64,
    use_preconditioner: bool,
}

impl BiCGSTAB {
    pub fn new() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-12,
            abs_tolerance: 1e-14,
            use_preconditioner: true,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_abs_tolerance(mut self, abs_tolerance: f64) -> Self {
        self.abs_tolerance = abs_tolerance;
        self
    }

    pub fn with_preconditioner(mut self, enabled: bool) -> Self {
        self.use_preconditioner = enabled;
        self
    }

    fn small_enough(&self, res: f64, b_norm: f64) -> bool {
        res < self.tolerance * b_norm || res < self.abs_tolerance
    }

    /// Right-preconditioned BiCGSTAB from a zero initial guess
    ///
    /// # Returns
    /// The last iterate and its statistics. Breakdown or the iteration cap
    /// yield `converged = false`; the caller decides on a fallback.
    #[allow(non_snake_case)]
    pub fn solve_with_operator<O, P>(&self, A: &O, b: &[f64], precond: &P) -> (Vec<f64>, SolverStats)
    where
        O: LinearOperator,
        P: Preconditioner,
    {
        let n = A.dim();
        let b_norm = SolverUtils::norm(b);
        let mut x = vec![0.0; n];
        if b_norm < BREAKDOWN {
            return (x, SolverStats { converged: true, ..SolverStats::default() });
        }

        let mut r = b.to_vec();
        let shadow = r.clone();
        let mut p = vec![0.0; n];
        let mut v = vec![0.0; n];
        let (mut rho, mut alpha, mut omega) = (1.0, 1.0, 1.0);
        let mut res = b_norm;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let rho_next = SolverUtils::dot(&shadow, &r);
            if rho_next.abs() < BREAKDOWN {
                break;
            }
            let beta = (rho_next / rho) * (alpha / omega);
            rho = rho_next;
            for ((pi, ri), vi) in p.iter_mut().zip(&r).zip(&v) {
                *pi = ri + beta * (*pi - omega * vi);
            }

            let p_hat = precond.apply(&p);
            v = A.apply(&p_hat);
            let shadow_v = SolverUtils::dot(&shadow, &v);
            if shadow_v.abs() < BREAKDOWN {
                break;
            }
            alpha = rho / shadow_v;

            let s: Vec<f64> = r.iter().zip(&v).map(|(ri, vi)| ri - alpha * vi).collect();
            let s_norm = SolverUtils::norm(&s);
            if self.small_enough(s_norm, b_norm) {
                x.iter_mut().zip(&p_hat).for_each(|(xi, pi)| *xi += alpha * pi);
                res = s_norm;
                iterations += 1;
                converged = true;
                break;
            }

            let s_hat = precond.apply(&s);
            let t = A.apply(&s_hat);
            let t_t = SolverUtils::dot(&t, &t);
            if t_t < BREAKDOWN {
                break;
            }
            omega = SolverUtils::dot(&t, &s) / t_t;

            for i in 0..n {
                x[i] += alpha * p_hat[i] + omega * s_hat[i];
                r[i] = s[i] - omega * t[i];
            }
            res = SolverUtils::norm(&r);
            iterations += 1;

            if iterations % 50 == 0 {
                debug!("BiCGSTAB iter {:4}: |r| = {:.3e}, rel = {:.3e}", iterations, res, res / b_norm);
            }
            if self.small_enough(res, b_norm) {
                converged = true;
                break;
            }
            if omega.abs() < BREAKDOWN {
                break;
            }
        }

        let stats = SolverStats {
            iterations,
            residual_norm: res,
            relative_residual: res / b_norm,
            converged,
        };
        (x, stats)
    }
}

impl Default for BiCGSTAB {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for BiCGSTAB {
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &SystemMatrix, b: &[f64]) -> FemResult<(Vec<f64>, SolverStats)> {
        Ok(if self.use_preconditioner {
            self.solve_with_operator(A, b, &JacobiPreconditioner::new(A))
        } else {
            self.solve_with_operator(A, b, &IdentityPreconditioner)
        })
    }

    fn name(&self) -> &str {
        "BiCGSTAB"
    }
}
