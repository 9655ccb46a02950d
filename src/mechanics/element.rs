//! Small-strain continuum elements for plane problems
//!
//! Implements element internal force, tangent stiffness and consistent mass.

use nalgebra::{DMatrix, DVector, Point2, Vector3};

use crate::error::{FemError, FemResult};
use crate::fem::ElementShape;
use super::{Material, MaterialModel, MaterialProperties, StrainDisplacement};

/// Displacement DOFs per node for plane elements
pub const DOFS_PER_NODE: usize = 2;

/// Plane continuum element with one material instance per quadrature point
///
/// Connectivity and reference coordinates are fixed at construction; the
/// B-matrices and integration weights are precomputed once.
#[derive(Debug)]
pub struct ContinuumElement {
    shape: ElementShape,
    nodes: Vec<usize>,
    coords: Vec<Point2<f64>>,
    materials: Vec<MaterialModel>,
    b_matrices: Vec<DMatrix<f64>>,
    /// Quadrature weight × det J per point
    weights: Vec<f64>,
}

impl ContinuumElement {
    /// Create an element from its connectivity, coordinates and point materials
    ///
    /// # Arguments
    /// * `shape` - Element topology
    /// * `nodes` - Global node indices (counter-clockwise)
    /// * `coords` - Reference coordinates of those nodes
    /// * `materials` - One material per stiffness quadrature point
    ///
    /// # Errors
    /// Dimension mismatches and inverted or degenerate geometry.
    pub fn new(
        shape: ElementShape,
        nodes: Vec<usize>,
        coords: Vec<Point2<f64>>,
        materials: Vec<MaterialModel>,
    ) -> FemResult<Self> {
        let n = shape.num_nodes();
        if nodes.len() != n || coords.len() != n {
            return Err(FemError::DimensionMismatch {
                context: format!("{:?} connectivity", shape),
                expected: n,
                actual: nodes.len().min(coords.len()),
            });
        }

        let quad = shape.stiffness_quadrature();
        if materials.len() != quad.len() {
            return Err(FemError::DimensionMismatch {
                context: format!("{:?} materials per quadrature point", shape),
                expected: quad.len(),
                actual: materials.len(),
            });
        }

        let mut b_matrices = Vec::with_capacity(quad.len());
        let mut weights = Vec::with_capacity(quad.len());
        for (qp, w) in quad.points.iter().zip(quad.weights.iter()) {
            let (dn, det_j) = shape
                .shape_derivatives_cartesian(qp, &coords)
                .ok_or_else(|| {
                    FemError::InvalidInput(format!(
                        "element on nodes {:?} is degenerate or inverted",
                        nodes
                    ))
                })?;
            b_matrices.push(StrainDisplacement::compute_b_matrix(&dn));
            weights.push(w * det_j);
        }

        Ok(Self {
            shape,
            nodes,
            coords,
            materials,
            b_matrices,
            weights,
        })
    }

    /// Create an element whose points all share one property record
    pub fn from_properties(
        shape: ElementShape,
        nodes: Vec<usize>,
        coords: Vec<Point2<f64>>,
        props: &MaterialProperties,
    ) -> FemResult<Self> {
        let materials = (0..shape.stiffness_quadrature().len())
            .map(|_| MaterialModel::from_properties(props))
            .collect::<FemResult<Vec<_>>>()?;
        Self::new(shape, nodes, coords, materials)
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn materials(&self) -> &[MaterialModel] {
        &self.materials
    }

    /// Full DOF indices of the element, in local B-matrix column order
    pub fn dofs(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .flat_map(|&node| (0..DOFS_PER_NODE).map(move |c| node * DOFS_PER_NODE + c))
            .collect()
    }

    /// Gather element displacements from a full DOF vector
    pub fn gather(&self, full: &[f64]) -> DVector<f64> {
        DVector::from_iterator(
            self.nodes.len() * DOFS_PER_NODE,
            self.dofs().into_iter().map(|dof| full[dof]),
        )
    }

    /// Element area
    pub fn area(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Strain at each quadrature point
    pub fn strains(&self, u_elem: &DVector<f64>) -> Vec<Vector3<f64>> {
        self.b_matrices
            .iter()
            .map(|b| StrainDisplacement::strain(b, u_elem))
            .collect()
    }

    /// Element internal force vector
    ///
    /// f_e = ∫ Bᵀ σ(ε) dA
    ///
    /// # Arguments
    /// * `u_elem` - Current element displacements
    /// * `u_prev` - Element displacements at the start of the step
    /// * `dt` - Time step size
    #[allow(non_snake_case)]
    pub fn internal_force(
        &mut self,
        u_elem: &DVector<f64>,
        u_prev: &DVector<f64>,
        dt: f64,
    ) -> FemResult<DVector<f64>> {
        let mut f = DVector::zeros(u_elem.len());

        for ((B, w), mat) in self
            .b_matrices
            .iter()
            .zip(self.weights.iter())
            .zip(self.materials.iter_mut())
        {
            let strain = StrainDisplacement::strain(B, u_elem);
            let dstrain = strain - StrainDisplacement::strain(B, u_prev);
            let (stress, _) = mat.get_stress(&strain, &dstrain, dt)?;
            f += B.transpose() * stress * *w;
        }

        Ok(f)
    }

    /// Element internal force and tangent stiffness
    ///
    /// K_e = ∫ Bᵀ D B dA with D = ∂σ/∂ε of each point's material
    #[allow(non_snake_case)]
    pub fn stiffness_and_force(
        &mut self,
        u_elem: &DVector<f64>,
        u_prev: &DVector<f64>,
        dt: f64,
    ) -> FemResult<(DVector<f64>, DMatrix<f64>)> {
        let n = u_elem.len();
        let mut f = DVector::zeros(n);
        let mut K = DMatrix::zeros(n, n);

        for ((B, w), mat) in self
            .b_matrices
            .iter()
            .zip(self.weights.iter())
            .zip(self.materials.iter_mut())
        {
            let strain = StrainDisplacement::strain(B, u_elem);
            let dstrain = strain - StrainDisplacement::strain(B, u_prev);
            let (stress, D) = mat.get_stress(&strain, &dstrain, dt)?;

            let BT = B.transpose();
            f += &BT * stress * *w;
            K += &BT * (D * B) * *w;
        }

        Ok((f, K))
    }

    /// Consistent element mass matrix
    ///
    /// M_e[2a+i, 2b+i] = ∫ ρ N_a N_b dA, density taken from the first point.
    pub fn mass_matrix(&self) -> DMatrix<f64> {
        let rho = self.materials.first().map_or(0.0, |m| m.density());
        let n = self.nodes.len();
        let mut m_elem = DMatrix::zeros(n * DOFS_PER_NODE, n * DOFS_PER_NODE);

        let quad = self.shape.mass_quadrature();
        for (qp, w) in quad.points.iter().zip(quad.weights.iter()) {
            let det_j = self.shape.jacobian(qp, &self.coords).determinant();
            let shape_n = self.shape.shape_functions(qp);
            let scale = rho * w * det_j;

            for a in 0..n {
                for b in 0..n {
                    let m_ab = scale * shape_n[a] * shape_n[b];
                    for c in 0..DOFS_PER_NODE {
                        m_elem[(DOFS_PER_NODE * a + c, DOFS_PER_NODE * b + c)] += m_ab;
                    }
                }
            }
        }

        m_elem
    }

    /// Promote every point's trial state to committed
    pub fn commit_history(&mut self) {
        for mat in &mut self.materials {
            mat.commit_history();
        }
    }

    /// Committed stress at each quadrature point
    pub fn stresses(&self) -> Vec<Vector3<f64>> {
        self.materials.iter().map(|m| m.committed_stress()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square(props: &MaterialProperties) -> ContinuumElement {
        ContinuumElement::from_properties(
            ElementShape::Quad4,
            vec![0, 1, 2, 3],
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
            props,
        )
        .unwrap()
    }

    #[test]
    fn test_mass_sums_to_total_mass_per_direction() {
        let props = MaterialProperties::elastic("PlaneStress", 2.5, 100.0, 0.3);
        let elem = unit_square(&props);
        let m = elem.mass_matrix();

        // Σ_ab M[2a, 2b] = ρ A
        let total: f64 = (0..4).flat_map(|a| (0..4).map(move |b| (a, b)))
            .map(|(a, b)| m[(2 * a, 2 * b)])
            .sum();
        assert_relative_eq!(total, 2.5, epsilon = 1e-12);
        assert_relative_eq!(m[(0, 1)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_area_and_uniform_strain() {
        let props = MaterialProperties::elastic("PlaneStress", 1.0, 100.0, 0.3);
        let elem = unit_square(&props);
        assert_relative_eq!(elem.area(), 1.0, epsilon = 1e-14);

        // u_x = 0.01 x, u_y = -0.002 y
        let u = DVector::from_vec(vec![0.0, 0.0, 0.01, 0.0, 0.01, -0.002, 0.0, -0.002]);
        let strains = elem.strains(&u);
        assert_eq!(strains.len(), 4);
        for eps in strains {
            assert_relative_eq!(eps[0], 0.01, epsilon = 1e-14);
            assert_relative_eq!(eps[1], -0.002, epsilon = 1e-14);
            assert_relative_eq!(eps[2], 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_stiffness_is_symmetric_with_rigid_modes() {
        let props = MaterialProperties::elastic("PlaneStrain", 1.0, 100.0, 0.3);
        let mut elem = unit_square(&props);
        let u = DVector::zeros(8);
        let (f, k) = elem.stiffness_and_force(&u, &u, 1.0).unwrap();

        assert_relative_eq!(f.norm(), 0.0, epsilon = 1e-14);
        assert_relative_eq!((&k - k.transpose()).norm(), 0.0, epsilon = 1e-10);

        // Rigid rotation u = (-y, x) produces no force
        let rot = DVector::from_vec(vec![0.0, 0.0, 0.0, 1.0, -1.0, 1.0, -1.0, 0.0]);
        assert_relative_eq!((&k * rot).norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_internal_force_equals_stiffness_times_displacement() {
        let props = MaterialProperties::elastic("PlaneStress", 1.0, 100.0, 0.25);
        let mut elem = unit_square(&props);
        let u = DVector::from_vec(vec![0.0, 0.0, 0.01, 0.002, 0.012, -0.003, 0.001, 0.004]);
        let zero = DVector::zeros(8);

        let (_, k) = elem.stiffness_and_force(&zero, &zero, 1.0).unwrap();
        let f = elem.internal_force(&u, &zero, 1.0).unwrap();
        assert_relative_eq!((f - &k * &u).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_geometry_rejected() {
        let props = MaterialProperties::elastic("PlaneStress", 1.0, 100.0, 0.25);
        let result = ContinuumElement::from_properties(
            ElementShape::Tri3,
            vec![0, 1, 2],
            vec![Point2::new(0.0, 0.0), Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)],
            &props,
        );
        assert!(matches!(result, Err(FemError::InvalidInput(_))));
    }

    #[test]
    fn test_material_count_checked() {
        let props = MaterialProperties::elastic("PlaneStress", 1.0, 100.0, 0.25);
        let result = ContinuumElement::new(
            ElementShape::Tri3,
            vec![0, 1, 2],
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
            vec![
                MaterialModel::from_properties(&props).unwrap(),
                MaterialModel::from_properties(&props).unwrap(),
            ],
        );
        assert!(matches!(result, Err(FemError::DimensionMismatch { .. })));
    }
}
