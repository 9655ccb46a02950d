use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use sprs::TriMat;

use crate::error::FemResult;
use crate::linalg::SystemMatrix;
use super::{DofMap, Domain};

/// Global vector and matrix assembler
///
/// Element contributions are computed in parallel, one per element, and
/// merged sequentially so the summation order is fixed.
pub struct Assembler;

impl Assembler {
    /// Assemble the internal force at the free DOFs
    ///
    /// f_int = Σ_e ∫ Bᵀ σ dA, evaluated at `domain.state` with strain
    /// increments measured from `domain.dstate`.
    ///
    /// # Arguments
    /// * `domain` - Domain holding the current full displacement
    /// * `dt` - Time step size passed to the materials
    ///
    /// # Returns
    /// Internal force vector of length `neqs`
    pub fn internal_force(domain: &mut Domain, dt: f64) -> FemResult<Vec<f64>> {
        let (elements, state, dstate, dof_map) = domain.assembly_view();

        let local_forces: Vec<(Vec<usize>, DVector<f64>)> = elements
            .par_iter_mut()
            .map(|elem| -> FemResult<_> {
                let u = elem.gather(state);
                let u_prev = elem.gather(dstate);
                let f_elem = elem.internal_force(&u, &u_prev, dt)?;
                Ok((elem.dofs(), f_elem))
            })
            .collect::<FemResult<_>>()?;

        let mut fint = vec![0.0; dof_map.neqs()];
        for (dofs, f_elem) in &local_forces {
            scatter_vector(dof_map, dofs, f_elem, &mut fint);
        }
        Ok(fint)
    }

    /// Assemble the internal force over all DOFs
    ///
    /// Entries at constrained DOFs are the support reactions.
    pub fn internal_force_full(domain: &mut Domain, dt: f64) -> FemResult<Vec<f64>> {
        let (elements, state, dstate, dof_map) = domain.assembly_view();

        let local_forces: Vec<(Vec<usize>, DVector<f64>)> = elements
            .par_iter_mut()
            .map(|elem| -> FemResult<_> {
                let u = elem.gather(state);
                let u_prev = elem.gather(dstate);
                let f_elem = elem.internal_force(&u, &u_prev, dt)?;
                Ok((elem.dofs(), f_elem))
            })
            .collect::<FemResult<_>>()?;

        let mut fint = vec![0.0; dof_map.total_dofs()];
        for (dofs, f_elem) in &local_forces {
            for (a, &dof) in dofs.iter().enumerate() {
                fint[dof] += f_elem[a];
            }
        }
        Ok(fint)
    }

    /// Assemble internal force and tangent stiffness at the free DOFs
    ///
    /// K = Σ_e ∫ Bᵀ D B dA restricted to free-free pairs. The matrix is
    /// sparse when the domain's equation count exceeds its threshold.
    ///
    /// # Returns
    /// (f_int, K) with K of size `neqs × neqs`
    #[allow(non_snake_case)]
    pub fn stiffness_and_force(domain: &mut Domain, dt: f64) -> FemResult<(Vec<f64>, SystemMatrix)> {
        let sparse = domain.use_sparse();
        let (elements, state, dstate, dof_map) = domain.assembly_view();

        let local: Vec<(Vec<usize>, DVector<f64>, DMatrix<f64>)> = elements
            .par_iter_mut()
            .map(|elem| -> FemResult<_> {
                let u = elem.gather(state);
                let u_prev = elem.gather(dstate);
                let (f_elem, k_elem) = elem.stiffness_and_force(&u, &u_prev, dt)?;
                Ok((elem.dofs(), f_elem, k_elem))
            })
            .collect::<FemResult<_>>()?;

        let neqs = dof_map.neqs();
        let mut fint = vec![0.0; neqs];
        let mut triplets = TriMat::new((neqs, neqs));
        for (dofs, f_elem, k_elem) in &local {
            scatter_vector(dof_map, dofs, f_elem, &mut fint);
            scatter_matrix(dof_map, dofs, k_elem, &mut triplets);
        }

        let K = SystemMatrix::from_triplets(triplets, sparse);
        Ok((fint, K))
    }

    /// Assemble the consistent mass matrix and its row-sum lumped form
    ///
    /// M = Σ_e ∫ ρ Nᵀ N dA restricted to free-free pairs.
    #[allow(non_snake_case)]
    pub fn mass_matrix(domain: &Domain) -> (SystemMatrix, Vec<f64>) {
        let dof_map = domain.dof_map();

        let local: Vec<(Vec<usize>, DMatrix<f64>)> = domain
            .elements()
            .par_iter()
            .map(|elem| (elem.dofs(), elem.mass_matrix()))
            .collect();

        let neqs = dof_map.neqs();
        let mut triplets = TriMat::new((neqs, neqs));
        for (dofs, m_elem) in &local {
            scatter_matrix(dof_map, dofs, m_elem, &mut triplets);
        }

        let M = SystemMatrix::from_triplets(triplets, domain.use_sparse());
        let lumped = M.row_sums();
        (M, lumped)
    }
}

fn scatter_vector(dof_map: &DofMap, dofs: &[usize], local: &DVector<f64>, global: &mut [f64]) {
    for (a, &dof) in dofs.iter().enumerate() {
        if let Some(eq) = dof_map.equation(dof) {
            global[eq] += local[a];
        }
    }
}

fn scatter_matrix(dof_map: &DofMap, dofs: &[usize], local: &DMatrix<f64>, triplets: &mut TriMat<f64>) {
    for (a, &dof_a) in dofs.iter().enumerate() {
        let Some(row) = dof_map.equation(dof_a) else { continue };
        for (b, &dof_b) in dofs.iter().enumerate() {
            if let Some(col) = dof_map.equation(dof_b) {
                triplets.add_triplet(row, col, local[(a, b)]);
            }
        }
    }
}
