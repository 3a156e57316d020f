//! # Engine Module
//!
//! The stateful layer that turns a lattice description into a working machine and
//! advances beam states through it.
//!
//! ## Overview
//!
//! A [`machine::Machine`] owns the configured elements built from a
//! [`LatticeConfig`](crate::core::config::LatticeConfig). Propagation walks a range of
//! elements, computes the design-reference advance and one transfer map per charge
//! state, and commits the element's result to the [`State`](crate::core::models::State)
//! only once everything has been computed and checked.
//!
//! ## Architecture
//!
//! - **Machine** ([`machine`]) - Construction, lookup, reconfiguration, state allocation
//!   and propagation
//! - **Transfer Cache** ([`cache`]) - Per-element memo of transfer maps keyed by the
//!   exact entrance kinematics
//! - **Observers** ([`observer`]) - Per-element callbacks and history recording
//! - **Error Handling** ([`error`]) - Engine error taxonomy with element context

pub(crate) mod cache;
pub mod error;
pub mod machine;
pub mod observer;

pub use error::EngineError;
pub use machine::{ElementQuery, Machine};
pub use observer::{HistoryRecorder, Observer, Snapshot};
