//! # Element Models
//!
//! The registry of lattice element types and their linear optics. Each element type
//! tag resolves through a static table to an [`ElementKind`]; construction reads the
//! element's parameters (falling back to lattice-wide values) into a model struct
//! implementing [`ElementPhysics`], which yields the 7×7 homogeneous transfer matrix
//! for a charge state and advances reference particles through the element.
//!
//! ## Architecture
//!
//! - **Registry**: [`kind`] maps type tags to kinds; [`element`] wraps a model with its
//!   name and alignment and dispatches to it
//! - **Passive optics**: [`drift`], [`quadrupole`], [`solenoid`], [`bend`],
//!   [`sextupole`], [`orbtrim`], [`generic`]
//! - **Active elements**: [`cavity`] changes the beam energy, [`source`] and
//!   [`stripper`] replace or redistribute the charge states
//! - **Shared building blocks**: [`optics`] holds the sub-matrix builders,
//!   [`alignment`] the misalignment sandwich

pub mod alignment;
pub mod bend;
pub mod cavity;
pub mod drift;
pub mod element;
pub mod error;
pub mod generic;
pub mod kind;
pub mod optics;
pub mod orbtrim;
pub mod physics;
pub mod quadrupole;
pub mod sextupole;
pub mod solenoid;
pub mod source;
pub mod stripper;

#[cfg(test)]
mod testing;

pub use alignment::Alignment;
pub use element::{Element, ElementModel};
pub use error::ElementError;
pub use kind::ElementKind;
pub use physics::{ElementPhysics, Transfer, TransferContext};
pub use source::initial_state;
