//! Time-stepping strategies for the semi-discrete momentum balance
//!
//! M a + f_int(u) = f_ext(t), advanced by explicit central differences,
//! implicit generalized-alpha with Newton-Raphson, load-stepped statics,
//! or an adaptive step-size controller wrapped around the implicit scheme.

pub mod report;
mod snapshot;
pub mod explicit;
pub mod newmark;
pub mod static_solver;
pub mod adaptive;

// Re-export commonly used items
pub use report::{StepReport, StepStatus};
pub(crate) use snapshot::StepSnapshot;
pub use explicit::ExplicitSolver;
pub use newmark::{GeneralizedAlpha, NewmarkParams, NewmarkSolver};
pub use static_solver::{StaticParams, StaticSolver};
pub use adaptive::{AdaptiveParams, AdaptiveReport, AdaptiveSolver, SolverKind};
