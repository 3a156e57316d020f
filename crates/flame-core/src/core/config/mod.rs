//! # Configuration Module
//!
//! In-memory description of a machine: lattice-wide parameters and an ordered list of
//! element descriptors, each a type tag plus a parameter map. The structure is what a
//! lattice-file parser or a scripting front-end produces; this crate only consumes it.
//!
//! - [`value`] - Parameter values and scoped, typed lookups with element-aware errors
//! - [`lattice`] - Element and lattice descriptors, builder, TOML/JSON loading
//! - [`error`] - Configuration error taxonomy

pub mod error;
pub mod lattice;
pub mod value;

pub use error::ConfigError;
pub use lattice::{ElementConfig, LatticeConfig, LatticeConfigBuilder};
pub use value::{ConfigValue, ParamMap, Params};
