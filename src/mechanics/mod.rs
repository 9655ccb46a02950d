//! Solid mechanics module for small-strain plane continua
//!
//! This module provides implementations for:
//! - The constitutive contract with trial and committed state
//! - Linear elastic and J2 plastic material models
//! - Strain-displacement relationships
//! - Element internal force, tangent and mass

pub mod constitutive;
pub mod strain;
pub mod element;
pub mod plasticity;

pub use constitutive::{LinearElastic, Material, MaterialModel, MaterialProperties, PlaneCondition};
pub use strain::StrainDisplacement;
pub use element::{ContinuumElement, DOFS_PER_NODE};
pub use plasticity::J2Plasticity;
