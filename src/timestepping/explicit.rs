//! Explicit central-difference time integration
//!
//! Velocity-Verlet form with the row-sum lumped mass, so the acceleration
//! update is a division per equation and no linear system is solved.

use crate::error::{FemError, FemResult};
use crate::fem::{Assembler, Domain, GlobalData};
use super::{StepReport, StepSnapshot, StepStatus};

/// Central-difference solver
///
/// **Algorithm:**
/// 1. v_{n+½} = v_n + ½Δt a_n
/// 2. u_{n+1} = u_n + Δt v_{n+½}
/// 3. a_{n+1} = (f_ext − f_int(u_{n+1})) / M_lumped
/// 4. v_{n+1} = v_{n+½} + ½Δt a_{n+1}
///
/// Conditionally stable: Δt must stay below 2/ω_max. The step does not
/// check this.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitSolver;

impl ExplicitSolver {
    pub fn new() -> Self {
        Self
    }

    /// Advance `globdat` and `domain` by one step of size `dt`
    ///
    /// On error the kinematic state is restored to its value before the call.
    ///
    /// # Errors
    /// `MassNotAssembled` when the lumped mass is missing; `InvalidInput`
    /// when a lumped entry is not positive (e.g. a massless material).
    pub fn step(&self, dt: f64, globdat: &mut GlobalData, domain: &mut Domain) -> FemResult<StepReport> {
        domain.check_global_data(globdat)?;
        if !domain.is_mass_assembled() {
            return Err(FemError::MassNotAssembled);
        }
        let lumped = globdat.mass_lumped()?.to_vec();
        if let Some((eq, m)) = lumped.iter().enumerate().find(|&(_, &m)| !(m > 0.0)) {
            return Err(FemError::InvalidInput(format!(
                "explicit step needs positive lumped mass, equation {} has {}",
                eq, m
            )));
        }

        let snapshot = StepSnapshot::take(globdat, domain);
        match Self::advance(dt, &lumped, globdat, domain) {
            Ok(report) => Ok(report),
            Err(e) => {
                snapshot.restore(globdat, domain);
                Err(e)
            }
        }
    }

    fn advance(dt: f64, lumped: &[f64], globdat: &mut GlobalData, domain: &mut Domain) -> FemResult<StepReport> {
        globdat.dstate.clone_from(&globdat.state);
        domain.dstate.clone_from(&domain.state);

        let neqs = globdat.neqs();
        for i in 0..neqs {
            globdat.velo[i] += 0.5 * dt * globdat.acce[i];
            globdat.state[i] += dt * globdat.velo[i];
        }

        globdat.time += dt;
        domain.update_domain_state_boundary(globdat)?;
        domain.update_states(globdat);

        let fint = Assembler::internal_force(domain, dt)?;
        let fext = domain.external_force(globdat)?;

        for i in 0..neqs {
            globdat.acce[i] = (fext[i] - fint[i]) / lumped[i];
            globdat.velo[i] += 0.5 * dt * globdat.acce[i];
        }

        domain.commit_history();
        domain.history.push(fint, fext, globdat.time);

        Ok(StepReport {
            status: StepStatus::Converged,
            iterations: 0,
            residual_norm: 0.0,
            time: globdat.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fem::{ElementShape, ElementSpec, ProblemSetup};
    use crate::mechanics::MaterialProperties;
    use approx::assert_relative_eq;

    /// Unit square with only node 2 free in both directions
    fn corner_domain() -> Domain {
        corner_domain_with_density(1.0)
    }

    fn corner_domain_with_density(rho: f64) -> Domain {
        let setup = ProblemSetup {
            nodes: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            elements: vec![ElementSpec { shape: ElementShape::Quad4, nodes: vec![0, 1, 2, 3], material: 0 }],
            materials: vec![MaterialProperties::elastic("PlaneStrain", rho, 100.0, 0.2)],
            ebc: vec![vec![-1, -1], vec![-1, -1], vec![0, 0], vec![-1, -1]],
            g: vec![],
            nbc: vec![vec![0, 0]; 4],
            f: vec![],
        };
        Domain::from_setup(&setup).unwrap()
    }

    #[test]
    fn test_requires_mass() {
        let mut domain = corner_domain();
        let mut globdat = GlobalData::new(domain.neqs());
        let result = ExplicitSolver::new().step(1e-3, &mut globdat, &mut domain);
        assert!(matches!(result, Err(FemError::MassNotAssembled)));
    }

    #[test]
    fn test_massless_material_rejected() {
        let mut domain = corner_domain_with_density(0.0);
        let mut globdat = GlobalData::new(domain.neqs());
        domain.assemble_mass_matrix(&mut globdat).unwrap();
        globdat.state = vec![1e-3, 0.0];

        let result = ExplicitSolver::new().step(1e-3, &mut globdat, &mut domain);
        assert!(matches!(result, Err(FemError::InvalidInput(_))));
        assert_eq!(globdat.time, 0.0);
        assert_eq!(globdat.state, vec![1e-3, 0.0]);
        assert!(domain.history.is_empty());
    }

    #[test]
    fn test_rest_is_preserved() {
        let mut domain = corner_domain();
        let mut globdat = GlobalData::new(domain.neqs());
        domain.assemble_mass_matrix(&mut globdat).unwrap();

        let report = ExplicitSolver::new().step(1e-3, &mut globdat, &mut domain).unwrap();
        assert!(report.converged());
        assert!(globdat.state.iter().all(|&u| u == 0.0));
        assert!(domain.state.iter().all(|&u| u == 0.0));
        assert_relative_eq!(globdat.time, 1e-3);
        assert_eq!(domain.history.len(), 1);
    }

    #[test]
    fn test_released_corner_accelerates_back() {
        let mut domain = corner_domain();
        let mut globdat = GlobalData::new(domain.neqs());
        domain.assemble_mass_matrix(&mut globdat).unwrap();
        globdat.state = vec![1e-3, 0.0];
        globdat.initialize_acceleration_lumped(&mut domain).unwrap();
        assert!(globdat.acce[0] < 0.0);

        ExplicitSolver::new().step(1e-3, &mut globdat, &mut domain).unwrap();
        assert!(globdat.state[0] < 1e-3);
        assert!(globdat.velo[0] < 0.0);
        assert_eq!(globdat.dstate, vec![1e-3, 0.0]);
    }
}
