//! Strain-displacement relationships for plane solids
//!
//! Implements the B-matrix that relates nodal displacements to element strains.

use nalgebra::{DMatrix, DVector, Vector3};

/// Strain-displacement matrix computations
pub struct StrainDisplacement;

impl StrainDisplacement {
    /// Compute 3×2n strain-displacement matrix B from shape function derivatives
    ///
    /// Relates nodal displacements to element strains: ε = B · u_e
    ///
    /// # Arguments
    /// * `dN_dx` - Shape function derivatives [∂N_i/∂x, ∂N_i/∂y] per node
    ///
    /// # Returns
    /// B matrix where:
    /// - Rows: [ε_xx, ε_yy, γ_xy] (Voigt notation)
    /// - Columns: [u_0x, u_0y, u_1x, u_1y, ...]
    ///
    /// For each node i, columns 2i, 2i+1 are:
    /// ```text
    ///     [∂N_i/∂x    0      ]   (ε_xx = ∂u_x/∂x)
    ///     [  0      ∂N_i/∂y  ]   (ε_yy = ∂u_y/∂y)
    ///     [∂N_i/∂y  ∂N_i/∂x  ]   (γ_xy = ∂u_x/∂y + ∂u_y/∂x)
    /// ```
    #[allow(non_snake_case)]
    pub fn compute_b_matrix(dN_dx: &[[f64; 2]]) -> DMatrix<f64> {
        let mut B = DMatrix::zeros(3, 2 * dN_dx.len());

        for (i, d) in dN_dx.iter().enumerate() {
            let col = 2 * i;
            B[(0, col)] = d[0];
            B[(1, col + 1)] = d[1];
            B[(2, col)] = d[1];
            B[(2, col + 1)] = d[0];
        }

        B
    }

    /// Strain at a point from element displacements
    #[allow(non_snake_case)]
    pub fn strain(B: &DMatrix<f64>, u_elem: &DVector<f64>) -> Vector3<f64> {
        let eps = B * u_elem;
        Vector3::new(eps[0], eps[1], eps[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rigid_translation_is_strain_free() {
        let dn = [[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]];
        let b = StrainDisplacement::compute_b_matrix(&dn);
        let u = DVector::from_vec(vec![0.3, -0.2, 0.3, -0.2, 0.3, -0.2]);

        let eps = StrainDisplacement::strain(&b, &u);
        assert_relative_eq!(eps.norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_simple_shear() {
        // u_x = γ y on the unit right triangle
        let dn = [[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]];
        let b = StrainDisplacement::compute_b_matrix(&dn);
        let u = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 0.1, 0.0]);

        let eps = StrainDisplacement::strain(&b, &u);
        assert_relative_eq!(eps[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(eps[1], 0.0, epsilon = 1e-14);
        assert_relative_eq!(eps[2], 0.1, epsilon = 1e-14);
    }
}
