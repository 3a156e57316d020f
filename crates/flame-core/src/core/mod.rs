//! # Core Module
//!
//! The stateless foundation of the engine: numerics, configuration, beam state and the
//! physics of every element type.
//!
//! ## Architecture
//!
//! - **Numerics** ([`math`]) - 7×7 homogeneous phase-space matrices, checked arithmetic
//!   and physical constants
//! - **Configuration** ([`config`]) - Lattice and element descriptors with typed,
//!   element-aware parameter lookup
//! - **Beam Representation** ([`models`]) - Reference particles, charge states and the
//!   complete beam state with its named read-only view
//! - **Element Physics** ([`elements`]) - Type registry, transfer matrices and particle
//!   advance for each element model
//!
//! ## Units
//!
//! Phase-space coordinates are millimetres and radians for the transverse planes, RF
//! phase at 80.5 MHz and kinetic-energy deviation in MeV/u for the longitudinal plane.
//! Element parameters use metres, tesla, volts and degrees for bend and cavity angles;
//! particle energies are stored in eV/u.

pub mod config;
pub mod elements;
pub mod math;
pub mod models;
