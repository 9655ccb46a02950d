//! Start-of-step copy of everything a step may overwrite

use crate::fem::{Domain, GlobalData};

/// Kinematic state of `GlobalData` and `Domain` before a step
///
/// Material trial states and `Domain::history` are not captured: trial
/// states are overwritten by the next evaluation, and history is only
/// appended once a step can no longer fail.
pub(crate) struct StepSnapshot {
    time: f64,
    state: Vec<f64>,
    dstate: Vec<f64>,
    velo: Vec<f64>,
    acce: Vec<f64>,
    domain_state: Vec<f64>,
    domain_dstate: Vec<f64>,
}

impl StepSnapshot {
    pub(crate) fn take(globdat: &GlobalData, domain: &Domain) -> Self {
        Self {
            time: globdat.time,
            state: globdat.state.clone(),
            dstate: globdat.dstate.clone(),
            velo: globdat.velo.clone(),
            acce: globdat.acce.clone(),
            domain_state: domain.state.clone(),
            domain_dstate: domain.dstate.clone(),
        }
    }

    pub(crate) fn time(&self) -> f64 {
        self.time
    }

    pub(crate) fn restore(self, globdat: &mut GlobalData, domain: &mut Domain) {
        globdat.time = self.time;
        globdat.state = self.state;
        globdat.dstate = self.dstate;
        globdat.velo = self.velo;
        globdat.acce = self.acce;
        domain.state = self.domain_state;
        domain.dstate = self.domain_dstate;
    }
}
