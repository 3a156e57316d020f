//! # Core Models Module
//!
//! Owned value types describing the beam as it travels through a lattice.
//!
//! ## Overview
//!
//! A beam is tracked as a design reference particle plus one or more charge-state
//! ensembles. Each ensemble carries its own actual particle and the first and
//! second moments of its phase-space distribution. Every quantity that can be
//! derived (total energy, relativistic factors, rigidities, RMS widths) is computed
//! on access rather than stored.
//!
//! ## Key Components
//!
//! - [`particle`] - Ion kinematics with derived relativistic quantities
//! - [`charge_state`] - Centroid, covariance and weight of one charge state
//! - [`state`] - The complete beam state, its envelope and named read access
//!
//! ## Usage
//!
//! ```ignore
//! use flamepp::core::models::{ChargeState, Particle, State};
//!
//! let reference = Particle::new(931.494e6, 0.5e6, 33.0 / 238.0);
//! let cs = ChargeState::new(reference, 1.0, origin(), PhaseMatrix::zeros());
//! let state = State::new(reference, vec![cs]).unwrap();
//! println!("{}", state.scalar("ref_beta").unwrap());
//! ```

pub mod charge_state;
pub mod particle;
pub mod state;

pub use charge_state::ChargeState;
pub use particle::Particle;
pub use state::{Envelope, State};
