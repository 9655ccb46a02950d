use crate::error::{FemError, FemResult};
use crate::linalg::{solve_system, SystemMatrix};
use super::{Assembler, Domain};

/// Prescribed-value function of time, one entry per `-2` DOF
pub type TimeFunction = Box<dyn Fn(f64) -> Vec<f64> + Send + Sync>;

/// Reduced kinematic state over the free equations of one `Domain`
///
/// `state`, `dstate`, `velo` and `acce` all have length `neqs`. The mass
/// matrices are written once by `Domain::assemble_mass_matrix`.
pub struct GlobalData {
    /// Displacement at the free DOFs
    pub state: Vec<f64>,
    /// Displacement at the start of the current step
    pub dstate: Vec<f64>,
    pub velo: Vec<f64>,
    pub acce: Vec<f64>,
    /// Simulation clock
    pub time: f64,
    pub(crate) mass: Option<SystemMatrix>,
    pub(crate) mass_lumped: Vec<f64>,
    ebc_func: Option<TimeFunction>,
    fbc_func: Option<TimeFunction>,
}

impl GlobalData {
    /// Create a state at rest with `neqs` free equations at t = 0
    pub fn new(neqs: usize) -> Self {
        Self {
            state: vec![0.0; neqs],
            dstate: vec![0.0; neqs],
            velo: vec![0.0; neqs],
            acce: vec![0.0; neqs],
            time: 0.0,
            mass: None,
            mass_lumped: Vec::new(),
            ebc_func: None,
            fbc_func: None,
        }
    }

    /// Attach the prescribed-displacement function for `-2` EBC DOFs
    pub fn with_ebc_func<F>(mut self, func: F) -> Self
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        self.ebc_func = Some(Box::new(func));
        self
    }

    /// Attach the prescribed-force function for `-2` NBC DOFs
    pub fn with_fbc_func<F>(mut self, func: F) -> Self
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        self.fbc_func = Some(Box::new(func));
        self
    }

    pub fn neqs(&self) -> usize {
        self.state.len()
    }

    pub(crate) fn ebc_values(&self, time: f64) -> Option<Vec<f64>> {
        self.ebc_func.as_ref().map(|f| f(time))
    }

    pub(crate) fn fbc_values(&self, time: f64) -> Option<Vec<f64>> {
        self.fbc_func.as_ref().map(|f| f(time))
    }

    /// Consistent mass matrix over the free equations
    pub fn mass(&self) -> FemResult<&SystemMatrix> {
        self.mass.as_ref().ok_or(FemError::MassNotAssembled)
    }

    /// Row-sum lumped mass over the free equations
    pub fn mass_lumped(&self) -> FemResult<&[f64]> {
        if self.mass_lumped.is_empty() && self.neqs() > 0 {
            return Err(FemError::MassNotAssembled);
        }
        Ok(&self.mass_lumped)
    }

    /// Solve M a0 = fext(t0) - fint(u0) for a consistent initial acceleration
    ///
    /// Writes the current boundary values and free state into `domain`
    /// first. Material trial states are overwritten but not committed.
    #[allow(non_snake_case)]
    pub fn initialize_acceleration(&mut self, domain: &mut Domain) -> FemResult<()> {
        let rhs = self.initial_rhs(domain)?;
        let M = self.mass()?;
        self.acce = solve_system(M, &rhs)?;
        Ok(())
    }

    /// Lumped-mass variant of [`initialize_acceleration`](Self::initialize_acceleration)
    pub fn initialize_acceleration_lumped(&mut self, domain: &mut Domain) -> FemResult<()> {
        let rhs = self.initial_rhs(domain)?;
        let lumped = self.mass_lumped()?;
        self.acce = rhs.iter().zip(lumped.iter()).map(|(r, m)| r / m).collect();
        Ok(())
    }

    fn initial_rhs(&self, domain: &mut Domain) -> FemResult<Vec<f64>> {
        domain.check_global_data(self)?;
        domain.update_domain_state_boundary(self)?;
        domain.update_states(self);

        let fint = Assembler::internal_force(domain, 0.0)?;
        let fext = domain.external_force(self)?;
        Ok(fext.iter().zip(fint.iter()).map(|(e, i)| e - i).collect())
    }
}
