//! # FLAME++ Core Library
//!
//! A linear moment-matrix engine for charged-particle beam dynamics in ion linacs,
//! tracking the centroid and covariance of every charge state of a beam through a
//! lattice of drifts, magnets, RF cavities and strippers.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that physics, orchestration
//! and user-facing procedures stay separate and individually testable.
//!
//! - **[`core`]: The Foundation.** Stateless numerics (`PhaseMatrix`), the in-memory
//!   configuration model, beam state (`State`, `ChargeState`, `Particle`) and the element
//!   registry with each element's transfer-matrix physics.
//!
//! - **[`engine`]: The Logic Core.** The stateful `Machine` that owns a configured lattice,
//!   caches per-element transfer maps and advances a `State` through a range of elements
//!   with all-or-nothing updates per element.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine, such as
//!   recording the beam history along a lattice and running parameter scans or batches of
//!   beams in parallel.

pub mod core;
pub mod engine;
pub mod workflows;
