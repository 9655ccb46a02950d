//! Plasticity models for small-strain solids
//!
//! Implements rate-independent J2 (von Mises) plasticity in plane strain
//! with linear isotropic hardening, integrated by radial return.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::error::{FemError, FemResult};
use super::Material;

/// Relative yield tolerance: trial states with f ≤ TOL·σ_Y stay elastic
const YIELD_TOLERANCE: f64 = 1e-10;

/// Plane-strain J2 plasticity with linear isotropic hardening
///
/// **Yield Function:**
/// ```text
/// f = ‖s‖ - √(2/3) (σ_Y + K α)
/// ```
///
/// where:
/// - s = deviatoric stress (including the out-of-plane component σ_zz)
/// - σ_Y = initial yield stress
/// - K = isotropic hardening modulus
/// - α = equivalent plastic strain
///
/// Internally the state is kept in 4-component form [xx, yy, zz, xy] so the
/// out-of-plane stress is carried between steps; the interface exposes the
/// in-plane [xx, yy, xy] components only.
///
/// # References
/// - Simo & Hughes, "Computational Inelasticity", Ch. 3
#[derive(Debug, Clone)]
pub struct J2Plasticity {
    pub youngs_modulus: f64,
    pub poisson_ratio: f64,
    pub density: f64,
    pub yield_stress: f64,
    pub hardening: f64,
    /// Shear modulus μ
    mu: f64,
    /// Bulk modulus κ
    kappa: f64,

    // Committed state
    stress0: Vector4<f64>,
    strain0: Vector3<f64>,
    alpha0: f64,

    // Trial state of the last evaluation
    stress_trial: Vector4<f64>,
    strain_trial: Vector3<f64>,
    alpha_trial: f64,
    tangent: Matrix3<f64>,
}

impl J2Plasticity {
    #[allow(non_snake_case)]
    pub fn new(E: f64, nu: f64, density: f64, yield_stress: f64, hardening: f64) -> Self {
        let mu = E / (2.0 * (1.0 + nu));
        let kappa = E / (3.0 * (1.0 - 2.0 * nu));
        let elastic = Self::in_plane(&Self::elastic_matrix(mu, kappa));

        Self {
            youngs_modulus: E,
            poisson_ratio: nu,
            density,
            yield_stress,
            hardening,
            mu,
            kappa,
            stress0: Vector4::zeros(),
            strain0: Vector3::zeros(),
            alpha0: 0.0,
            stress_trial: Vector4::zeros(),
            strain_trial: Vector3::zeros(),
            alpha_trial: 0.0,
            tangent: elastic,
        }
    }

    /// Equivalent plastic strain of the committed state
    pub fn plastic_strain(&self) -> f64 {
        self.alpha0
    }

    /// Yield function f at a 4-component stress and hardening variable
    pub fn yield_function(&self, stress: &Vector4<f64>, alpha: f64) -> f64 {
        let s = Self::deviator(stress);
        Self::dev_norm(&s) - (2.0_f64 / 3.0).sqrt() * (self.yield_stress + self.hardening * alpha)
    }

    /// I_dev in [xx, yy, zz, xy] Voigt form acting on engineering shear strain
    fn deviatoric_projector() -> Matrix4<f64> {
        let t = 1.0 / 3.0;
        Matrix4::new(
            1.0 - t, -t, -t, 0.0,
            -t, 1.0 - t, -t, 0.0,
            -t, -t, 1.0 - t, 0.0,
            0.0, 0.0, 0.0, 0.5,
        )
    }

    /// m mᵀ with m = [1, 1, 1, 0]
    fn volumetric_projector() -> Matrix4<f64> {
        let m = Vector4::new(1.0, 1.0, 1.0, 0.0);
        m * m.transpose()
    }

    fn elastic_matrix(mu: f64, kappa: f64) -> Matrix4<f64> {
        Self::volumetric_projector() * kappa + Self::deviatoric_projector() * (2.0 * mu)
    }

    fn deviator(stress: &Vector4<f64>) -> Vector4<f64> {
        let p = (stress[0] + stress[1] + stress[2]) / 3.0;
        Vector4::new(stress[0] - p, stress[1] - p, stress[2] - p, stress[3])
    }

    /// ‖s‖ = √(s:s) counting the shear component twice
    fn dev_norm(s: &Vector4<f64>) -> f64 {
        (s[0] * s[0] + s[1] * s[1] + s[2] * s[2] + 2.0 * s[3] * s[3]).sqrt()
    }

    /// Extract the [xx, yy, xy] rows and columns (plane strain: ε_zz = 0)
    fn in_plane(c: &Matrix4<f64>) -> Matrix3<f64> {
        let idx = [0, 1, 3];
        Matrix3::from_fn(|i, j| c[(idx[i], idx[j])])
    }
}

impl Material for J2Plasticity {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        _dstrain: &Vector3<f64>,
        _dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        if strain.iter().any(|v| !v.is_finite()) {
            return Err(FemError::ConstitutiveFailure(format!(
                "non-finite strain {:?}",
                strain.as_slice()
            )));
        }

        let de = strain - self.strain0;
        let de4 = Vector4::new(de[0], de[1], 0.0, de[2]);
        let c_el = Self::elastic_matrix(self.mu, self.kappa);

        // Elastic predictor from the committed state
        let stress_tr = self.stress0 + c_el * de4;
        let f_tr = self.yield_function(&stress_tr, self.alpha0);

        let (stress, alpha, c) = if f_tr <= YIELD_TOLERANCE * self.yield_stress {
            (stress_tr, self.alpha0, c_el)
        } else {
            // Radial return
            let s_tr = Self::deviator(&stress_tr);
            let s_norm = Self::dev_norm(&s_tr);
            let n = s_tr / s_norm;
            let two_mu = 2.0 * self.mu;
            let dgamma = f_tr / (two_mu + 2.0 * self.hardening / 3.0);

            let stress = stress_tr - n * (two_mu * dgamma);
            let alpha = self.alpha0 + (2.0_f64 / 3.0).sqrt() * dgamma;

            // Consistent tangent
            let theta = 1.0 - two_mu * dgamma / s_norm;
            let theta_bar = 1.0 / (1.0 + self.hardening / (3.0 * self.mu)) - (1.0 - theta);
            let c = Self::volumetric_projector() * self.kappa
                + Self::deviatoric_projector() * (two_mu * theta)
                - (n * n.transpose()) * (two_mu * theta_bar);

            (stress, alpha, c)
        };

        self.stress_trial = stress;
        self.strain_trial = *strain;
        self.alpha_trial = alpha;
        self.tangent = Self::in_plane(&c);

        Ok((Vector3::new(stress[0], stress[1], stress[3]), self.tangent))
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.tangent
    }

    fn commit_history(&mut self) {
        self.stress0 = self.stress_trial;
        self.strain0 = self.strain_trial;
        self.alpha0 = self.alpha_trial;
    }

    fn density(&self) -> f64 {
        self.density
    }

    fn committed_stress(&self) -> Vector3<f64> {
        Vector3::new(self.stress0[0], self.stress0[1], self.stress0[3])
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.strain0
    }
}
