use crate::core::math::NumericError;
use thiserror::Error;

/// Failure while evaluating an element on a concrete beam.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ElementError {
    #[error("Numeric failure: {0}")]
    Numeric(#[from] NumericError),

    #[error("Unphysical result: {reason}")]
    Physics { reason: String },
}

impl ElementError {
    pub fn physics(reason: impl Into<String>) -> Self {
        Self::Physics {
            reason: reason.into(),
        }
    }
}
