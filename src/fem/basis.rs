use nalgebra::{Matrix2, Point2};
use serde::{Deserialize, Serialize};

use crate::fem::GaussQuadrature;

/// Supported 2D element topologies
///
/// Node numbering is counter-clockwise in both cases:
///
/// ```text
///   Tri3:  2            Quad4:  3 ---- 2
///          | \                  |      |
///          0--1                 0 ---- 1
/// ```
///
/// Tri3 uses area coordinates (ξ, η) on the triangle (0,0), (1,0), (0,1);
/// Quad4 uses natural coordinates (ξ, η) ∈ [-1, 1]².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementShape {
    Tri3,
    Quad4,
}

impl ElementShape {
    /// Number of nodes of the topology
    pub fn num_nodes(&self) -> usize {
        match self {
            ElementShape::Tri3 => 3,
            ElementShape::Quad4 => 4,
        }
    }

    /// Quadrature rule for internal force and stiffness (one material per point)
    pub fn stiffness_quadrature(&self) -> GaussQuadrature {
        match self {
            ElementShape::Tri3 => GaussQuadrature::tri_1point(),
            ElementShape::Quad4 => GaussQuadrature::quad_2x2(),
        }
    }

    /// Quadrature rule exact for ∫ N_i N_j dA
    pub fn mass_quadrature(&self) -> GaussQuadrature {
        match self {
            ElementShape::Tri3 => GaussQuadrature::tri_3point(),
            ElementShape::Quad4 => GaussQuadrature::quad_2x2(),
        }
    }

    /// Evaluate the shape functions at natural coordinates (ξ, η)
    pub fn shape_functions(&self, xi: &[f64; 2]) -> Vec<f64> {
        let (r, s) = (xi[0], xi[1]);
        match self {
            ElementShape::Tri3 => vec![1.0 - r - s, r, s],
            ElementShape::Quad4 => vec![
                0.25 * (1.0 - r) * (1.0 - s),
                0.25 * (1.0 + r) * (1.0 - s),
                0.25 * (1.0 + r) * (1.0 + s),
                0.25 * (1.0 - r) * (1.0 + s),
            ],
        }
    }

    /// Shape function derivatives [∂N_i/∂ξ, ∂N_i/∂η] at natural coordinates
    pub fn shape_derivatives(&self, xi: &[f64; 2]) -> Vec<[f64; 2]> {
        let (r, s) = (xi[0], xi[1]);
        match self {
            ElementShape::Tri3 => vec![[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]],
            ElementShape::Quad4 => vec![
                [-0.25 * (1.0 - s), -0.25 * (1.0 - r)],
                [0.25 * (1.0 - s), -0.25 * (1.0 + r)],
                [0.25 * (1.0 + s), 0.25 * (1.0 + r)],
                [-0.25 * (1.0 + s), 0.25 * (1.0 - r)],
            ],
        }
    }

    /// Jacobian of the isoparametric map
    ///
    /// J = [∂x/∂ξ  ∂y/∂ξ]
    ///     [∂x/∂η  ∂y/∂η]
    pub fn jacobian(&self, xi: &[f64; 2], coords: &[Point2<f64>]) -> Matrix2<f64> {
        let dn = self.shape_derivatives(xi);
        let mut jac = Matrix2::zeros();
        for (d, x) in dn.iter().zip(coords.iter()) {
            jac[(0, 0)] += d[0] * x.x;
            jac[(0, 1)] += d[0] * x.y;
            jac[(1, 0)] += d[1] * x.x;
            jac[(1, 1)] += d[1] * x.y;
        }
        jac
    }

    /// Cartesian shape derivatives [∂N_i/∂x, ∂N_i/∂y] and det J
    ///
    /// Returns `None` for a degenerate or inverted element (det J ≤ 0).
    pub fn shape_derivatives_cartesian(
        &self,
        xi: &[f64; 2],
        coords: &[Point2<f64>],
    ) -> Option<(Vec<[f64; 2]>, f64)> {
        let jac = self.jacobian(xi, coords);
        let det_j = jac.determinant();
        if det_j <= 0.0 {
            return None;
        }
        let jac_inv = jac.try_inverse()?;

        let dn = self
            .shape_derivatives(xi)
            .iter()
            .map(|d| {
                [
                    jac_inv[(0, 0)] * d[0] + jac_inv[(0, 1)] * d[1],
                    jac_inv[(1, 0)] * d[0] + jac_inv[(1, 1)] * d[1],
                ]
            })
            .collect();

        Some((dn, det_j))
    }
}
