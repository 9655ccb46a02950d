/// Outcome class of one solver step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Newton converged and the step was committed
    Converged,
    /// Newton hit its iteration cap without failsafe; the last iterate was committed
    AcceptedUnconverged,
    /// Newton failed under failsafe; time and displacement were rolled back
    Reverted,
}

/// Statistics for a single solver step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub status: StepStatus,
    /// Newton corrections applied (0 for explicit steps)
    pub iterations: usize,
    /// Final residual norm
    pub residual_norm: f64,
    /// Simulation time after the step
    pub time: f64,
}

impl StepReport {
    /// True when the step advanced the state
    pub fn succeeded(&self) -> bool {
        self.status != StepStatus::Reverted
    }

    pub fn converged(&self) -> bool {
        self.status == StepStatus::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let mut report = StepReport { status: StepStatus::Converged, iterations: 1, residual_norm: 0.0, time: 1.0 };
        assert!(report.succeeded() && report.converged());

        report.status = StepStatus::AcceptedUnconverged;
        assert!(report.succeeded() && !report.converged());

        report.status = StepStatus::Reverted;
        assert!(!report.succeeded());
    }
}
