pub mod error;
pub mod fem;
pub mod linalg;
pub mod mechanics;
pub mod config;
pub mod timestepping;

pub use error::{FemError, FemResult};
pub use fem::{Assembler, Domain, DofKind, DofMap, ElementShape, ElementSpec, GaussQuadrature, GlobalData, History, ProblemSetup};
pub use linalg::{solve_system, BiCGSTAB, DirectSolver, Solver, SolverStats, SystemMatrix};
pub use mechanics::{ContinuumElement, J2Plasticity, LinearElastic, Material, MaterialModel, MaterialProperties, PlaneCondition, StrainDisplacement};
pub use config::SolverConfig;
pub use timestepping::{AdaptiveParams, AdaptiveReport, AdaptiveSolver, ExplicitSolver, GeneralizedAlpha, NewmarkParams, NewmarkSolver, SolverKind, StaticParams, StaticSolver, StepReport, StepStatus};
