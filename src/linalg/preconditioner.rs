//! Preconditioners for the Krylov backend

use super::SystemMatrix;

/// Approximate inverse z ≈ A⁻¹ r applied once per Krylov iteration
pub trait Preconditioner {
    fn apply(&self, r: &[f64]) -> Vec<f64>;
}

/// Diagonal scaling z_i = r_i / A_ii
///
/// Rows with a vanishing diagonal pass through unscaled. The effective
/// Jacobians carry the mass on the diagonal, so this is rarely hit.
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    #[allow(non_snake_case)]
    pub fn new(A: &SystemMatrix) -> Self {
        Self::from_diagonal(&A.diagonal())
    }

    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d.abs() > 1e-14 { d.recip() } else { 1.0 })
            .collect();
        Self { inv_diag }
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64]) -> Vec<f64> {
        r.iter().zip(&self.inv_diag).map(|(ri, di)| ri * di).collect()
    }
}

/// No-op preconditioner
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64]) -> Vec<f64> {
        r.to_vec()
    }
}
