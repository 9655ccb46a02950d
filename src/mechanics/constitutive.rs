//! Constitutive interface and closed-form material models
//!
//! Strains and stresses use 2D Voigt notation [xx, yy, xy] with engineering
//! shear strain γ_xy = 2 ε_xy.

use std::collections::BTreeMap;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FemError, FemResult};
use super::J2Plasticity;

/// Stateful constitutive unit living at one quadrature point
///
/// Every implementation keeps two copies of its history: the committed
/// state of the last accepted step and the trial state of the last
/// evaluation. `get_stress` reads only the committed copy and overwrites
/// the trial copy; `commit_history` promotes trial to committed.
///
/// After a commit, calling `get_stress` with the last trial strain must
/// reproduce the committed stress exactly.
pub trait Material: Send + Sync + std::fmt::Debug {
    /// Evaluate stress and tangent ∂σ/∂ε at a trial strain
    ///
    /// # Arguments
    /// * `strain` - Trial total strain
    /// * `dstrain` - Strain increment since the previous step configuration
    /// * `dt` - Time step size (rate-dependent models)
    ///
    /// # Errors
    /// `FemError::ConstitutiveFailure` when the update cannot be computed;
    /// Newton solvers treat this as divergence of the current step.
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        dstrain: &Vector3<f64>,
        dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)>;

    /// Tangent of the most recent evaluation
    fn tangent(&self) -> Matrix3<f64>;

    /// Promote the trial state to the committed state
    fn commit_history(&mut self);

    /// Mass density
    fn density(&self) -> f64;

    fn committed_stress(&self) -> Vector3<f64>;

    fn committed_strain(&self) -> Vector3<f64>;
}

/// Property record attached to an element group by the problem setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Material law: "PlaneStrain", "PlaneStress" or "PlaneStrainPlasticity"
    pub name: String,
    /// Density ρ
    pub rho: f64,
    /// Young's modulus E
    #[serde(rename = "E")]
    pub youngs_modulus: f64,
    /// Poisson's ratio ν
    pub nu: f64,
    /// Initial yield stress σ_Y (plasticity only)
    #[serde(default)]
    pub sigma_y: Option<f64>,
    /// Isotropic hardening modulus K (plasticity only)
    #[serde(default)]
    pub hardening: Option<f64>,
    /// Material-specific extra fields
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl MaterialProperties {
    /// Property record without plasticity parameters
    pub fn elastic(name: &str, rho: f64, youngs_modulus: f64, nu: f64) -> Self {
        Self {
            name: name.to_string(),
            rho,
            youngs_modulus,
            nu,
            sigma_y: None,
            hardening: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_plasticity(mut self, sigma_y: f64, hardening: f64) -> Self {
        self.sigma_y = Some(sigma_y);
        self.hardening = Some(hardening);
        self
    }

    fn validate(&self) -> FemResult<()> {
        if !(self.youngs_modulus > 0.0) {
            return Err(FemError::InvalidMaterial(format!(
                "{}: Young's modulus must be positive, got {}",
                self.name, self.youngs_modulus
            )));
        }
        if !(self.nu > -1.0 && self.nu < 0.5) {
            return Err(FemError::InvalidMaterial(format!(
                "{}: Poisson's ratio must be in (-1, 0.5), got {}",
                self.name, self.nu
            )));
        }
        if !(self.rho >= 0.0) {
            return Err(FemError::InvalidMaterial(format!(
                "{}: density must be non-negative, got {}",
                self.name, self.rho
            )));
        }
        Ok(())
    }
}

/// Kinematic assumption for the out-of-plane direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneCondition {
    PlaneStrain,
    PlaneStress,
}

/// Isotropic linear elastic material
///
/// σ = D ε with D the plane-strain or plane-stress stiffness.
#[derive(Debug, Clone)]
pub struct LinearElastic {
    pub youngs_modulus: f64,
    pub poisson_ratio: f64,
    pub density: f64,
    pub condition: PlaneCondition,
    stiffness: Matrix3<f64>,
    stress0: Vector3<f64>,
    strain0: Vector3<f64>,
    stress_trial: Vector3<f64>,
    strain_trial: Vector3<f64>,
}

impl LinearElastic {
    pub fn new(
        youngs_modulus: f64,
        poisson_ratio: f64,
        density: f64,
        condition: PlaneCondition,
    ) -> Self {
        let stiffness = Self::constitutive_matrix(youngs_modulus, poisson_ratio, condition);
        Self {
            youngs_modulus,
            poisson_ratio,
            density,
            condition,
            stiffness,
            stress0: Vector3::zeros(),
            strain0: Vector3::zeros(),
            stress_trial: Vector3::zeros(),
            strain_trial: Vector3::zeros(),
        }
    }

    /// Compute the 3×3 constitutive matrix D
    ///
    /// Plane strain:
    /// ```text
    /// D = E / ((1+ν)(1-2ν)) [1-ν   ν      0     ]
    ///                       [ ν   1-ν     0     ]
    ///                       [ 0    0   (1-2ν)/2 ]
    /// ```
    /// Plane stress:
    /// ```text
    /// D = E / (1-ν²) [1  ν     0    ]
    ///                [ν  1     0    ]
    ///                [0  0  (1-ν)/2 ]
    /// ```
    #[allow(non_snake_case)]
    pub fn constitutive_matrix(E: f64, nu: f64, condition: PlaneCondition) -> Matrix3<f64> {
        match condition {
            PlaneCondition::PlaneStrain => {
                let factor = E / ((1.0 + nu) * (1.0 - 2.0 * nu));
                Matrix3::new(
                    1.0 - nu, nu, 0.0,
                    nu, 1.0 - nu, 0.0,
                    0.0, 0.0, 0.5 * (1.0 - 2.0 * nu),
                ) * factor
            }
            PlaneCondition::PlaneStress => {
                let factor = E / (1.0 - nu * nu);
                Matrix3::new(
                    1.0, nu, 0.0,
                    nu, 1.0, 0.0,
                    0.0, 0.0, 0.5 * (1.0 - nu),
                ) * factor
            }
        }
    }
}

impl Material for LinearElastic {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        _dstrain: &Vector3<f64>,
        _dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        self.strain_trial = *strain;
        self.stress_trial = self.stiffness * strain;
        Ok((self.stress_trial, self.stiffness))
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.stiffness
    }

    fn commit_history(&mut self) {
        self.stress0 = self.stress_trial;
        self.strain0 = self.strain_trial;
    }

    fn density(&self) -> f64 {
        self.density
    }

    fn committed_stress(&self) -> Vector3<f64> {
        self.stress0
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.strain0
    }
}

/// Closed set of constitutive laws, resolved once when the domain is built
#[derive(Debug)]
pub enum MaterialModel {
    Elastic(LinearElastic),
    Plasticity(J2Plasticity),
    /// Opaque model (e.g. a trained response surface) behind the trait
    External(Box<dyn Material>),
}

impl MaterialModel {
    /// Resolve a property record into a material instance
    pub fn from_properties(props: &MaterialProperties) -> FemResult<Self> {
        props.validate()?;
        match props.name.as_str() {
            "PlaneStrain" => Ok(MaterialModel::Elastic(LinearElastic::new(
                props.youngs_modulus,
                props.nu,
                props.rho,
                PlaneCondition::PlaneStrain,
            ))),
            "PlaneStress" => Ok(MaterialModel::Elastic(LinearElastic::new(
                props.youngs_modulus,
                props.nu,
                props.rho,
                PlaneCondition::PlaneStress,
            ))),
            "PlaneStrainPlasticity" => {
                let sigma_y = props.sigma_y.ok_or_else(|| {
                    FemError::InvalidMaterial(format!("{}: missing sigma_y", props.name))
                })?;
                let hardening = props.hardening.ok_or_else(|| {
                    FemError::InvalidMaterial(format!("{}: missing hardening", props.name))
                })?;
                if !(sigma_y > 0.0) || hardening < 0.0 {
                    return Err(FemError::InvalidMaterial(format!(
                        "{}: need sigma_y > 0 and hardening >= 0",
                        props.name
                    )));
                }
                Ok(MaterialModel::Plasticity(J2Plasticity::new(
                    props.youngs_modulus,
                    props.nu,
                    props.rho,
                    sigma_y,
                    hardening,
                )))
            }
            other => Err(FemError::UnknownMaterial(other.to_string())),
        }
    }

    pub fn external(model: Box<dyn Material>) -> Self {
        MaterialModel::External(model)
    }

    fn inner(&self) -> &dyn Material {
        match self {
            MaterialModel::Elastic(m) => m,
            MaterialModel::Plasticity(m) => m,
            MaterialModel::External(m) => m.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Material {
        match self {
            MaterialModel::Elastic(m) => m,
            MaterialModel::Plasticity(m) => m,
            MaterialModel::External(m) => m.as_mut(),
        }
    }
}

impl Material for MaterialModel {
    fn get_stress(
        &mut self,
        strain: &Vector3<f64>,
        dstrain: &Vector3<f64>,
        dt: f64,
    ) -> FemResult<(Vector3<f64>, Matrix3<f64>)> {
        self.inner_mut().get_stress(strain, dstrain, dt)
    }

    fn tangent(&self) -> Matrix3<f64> {
        self.inner().tangent()
    }

    fn commit_history(&mut self) {
        self.inner_mut().commit_history()
    }

    fn density(&self) -> f64 {
        self.inner().density()
    }

    fn committed_stress(&self) -> Vector3<f64> {
        self.inner().committed_stress()
    }

    fn committed_strain(&self) -> Vector3<f64> {
        self.inner().committed_strain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_stress_uniaxial() {
        // Uniaxial stress state: ε = [1, -ν, 0] · σ/E
        let mut mat = LinearElastic::new(200.0, 0.25, 1.0, PlaneCondition::PlaneStress);
        let strain = Vector3::new(0.01, -0.0025, 0.0);
        let (stress, _) = mat.get_stress(&strain, &strain, 0.1).unwrap();

        assert_relative_eq!(stress[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(stress[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_strain_shear_modulus() {
        let d = LinearElastic::constitutive_matrix(260.0, 0.3, PlaneCondition::PlaneStrain);
        // μ = E / (2(1+ν)) = 100
        assert_relative_eq!(d[(2, 2)], 100.0, epsilon = 1e-10);
        assert_relative_eq!(d[(0, 1)], d[(1, 0)], epsilon = 1e-14);
    }

    #[test]
    fn test_trial_state_not_committed_until_commit() {
        let mut mat = LinearElastic::new(100.0, 0.0, 1.0, PlaneCondition::PlaneStress);
        let strain = Vector3::new(0.02, 0.0, 0.0);
        mat.get_stress(&strain, &strain, 1.0).unwrap();

        assert_eq!(mat.committed_stress(), Vector3::zeros());

        mat.commit_history();
        assert_relative_eq!(mat.committed_stress()[0], 2.0, epsilon = 1e-14);
        assert_eq!(mat.committed_strain(), strain);
    }

    #[test]
    fn test_from_properties_dispatch() {
        let props = MaterialProperties::elastic("PlaneStress", 1.0, 100.0, 0.3);
        assert!(matches!(
            MaterialModel::from_properties(&props).unwrap(),
            MaterialModel::Elastic(_)
        ));

        let props = MaterialProperties::elastic("PlaneStrainPlasticity", 1.0, 100.0, 0.3)
            .with_plasticity(1.0, 10.0);
        assert!(matches!(
            MaterialModel::from_properties(&props).unwrap(),
            MaterialModel::Plasticity(_)
        ));
    }

    #[test]
    fn test_from_properties_errors() {
        let props = MaterialProperties::elastic("Rubber", 1.0, 100.0, 0.3);
        assert!(matches!(
            MaterialModel::from_properties(&props),
            Err(FemError::UnknownMaterial(name)) if name == "Rubber"
        ));

        let props = MaterialProperties::elastic("PlaneStrain", 1.0, 100.0, 0.5);
        assert!(matches!(
            MaterialModel::from_properties(&props),
            Err(FemError::InvalidMaterial(_))
        ));

        let props = MaterialProperties::elastic("PlaneStrainPlasticity", 1.0, 100.0, 0.3);
        assert!(matches!(
            MaterialModel::from_properties(&props),
            Err(FemError::InvalidMaterial(_))
        ));
    }
}
