//! # Workflows Module
//!
//! High-level procedures built on the [`Machine`](crate::engine::machine::Machine).
//!
//! ## Architecture
//!
//! - **Tracking** ([`track`]) - Propagates a beam and records its state after every
//!   element
//! - **Scans** ([`scan`]) - Batches of independent beams and one-parameter scans over
//!   an element setting, parallelised with rayon when the `parallel` feature is on

pub mod scan;
pub mod track;
