//! Gaussian quadrature rules for 2D reference elements

#[derive(Debug, Clone)]
pub struct GaussQuadrature {
    /// Integration point coordinates (ξ, η) in the reference element
    pub points: Vec<[f64; 2]>,
    /// Integration weights
    pub weights: Vec<f64>,
}

impl GaussQuadrature {
    /// 1-point triangle rule (degree 1 exactness) - centroid rule
    ///
    /// Reference triangle (0,0), (1,0), (0,1) with area 1/2.
    pub fn tri_1point() -> Self {
        Self {
            points: vec![[1.0 / 3.0, 1.0 / 3.0]],
            weights: vec![0.5],
        }
    }

    /// 3-point triangle rule (degree 2 exactness)
    ///
    /// Exact for products of linear shape functions, used for consistent mass.
    pub fn tri_3point() -> Self {
        let a = 1.0 / 6.0;
        let b = 2.0 / 3.0;
        let w = 1.0 / 6.0;

        Self {
            points: vec![[a, a], [b, a], [a, b]],
            weights: vec![w, w, w],
        }
    }

    /// 2×2 tensor-product Gauss-Legendre rule on [-1, 1]²
    ///
    /// Exact for bicubic polynomials
    pub fn quad_2x2() -> Self {
        let g = 1.0 / 3.0_f64.sqrt();

        Self {
            points: vec![[-g, -g], [g, -g], [g, g], [-g, g]],
            weights: vec![1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Number of integration points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
