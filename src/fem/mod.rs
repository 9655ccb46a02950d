pub mod basis;
pub mod quadrature;
pub mod dof;
pub mod domain;
pub mod global_data;
pub mod assembly;

pub use basis::ElementShape;
pub use quadrature::GaussQuadrature;
pub use dof::{DofKind, DofMap};
pub use domain::{Domain, ElementSpec, History, ProblemSetup, DEFAULT_SPARSE_THRESHOLD};
pub use global_data::{GlobalData, TimeFunction};
pub use assembly::Assembler;
