use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::elements::ElementError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Element {index} ('{name}') failed: {source}")]
    Element {
        index: usize,
        name: String,
        source: ElementError,
    },

    #[error("Element index {index} is out of range for a lattice of {len} elements")]
    ElementIndexOutOfRange { index: usize, len: usize },

    #[error("Beam state has no charge states")]
    EmptyChargeStates,
}
