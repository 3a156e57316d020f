use super::error::ElementError;
use super::optics::drift_matrix;
use super::physics::{ElementPhysics, TransferContext, read_length};
use crate::core::config::{ConfigError, Params};
use crate::core::math::PhaseMatrix;

/// Zero-length observation point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Marker;

impl ElementPhysics for Marker {
    fn length(&self) -> f64 {
        0.0
    }

    fn transfer_matrix(&self, _ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(PhaseMatrix::identity())
    }
}

/// Field-free straight section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub length: f64,
}

impl Drift {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            length: read_length(params)?,
        })
    }
}

impl ElementPhysics for Drift {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(drift_matrix(ctx.actual, self.length))
    }
}
