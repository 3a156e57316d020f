use super::error::ElementError;
use crate::core::config::{ConfigError, Params};
use crate::core::math::{PhaseMatrix, PhaseVector};
use crate::core::models::Particle;

/// Beam conditions at the entrance of an element, as seen by one charge state.
#[derive(Debug, Clone, Copy)]
pub struct TransferContext<'a> {
    /// Design reference particle.
    pub design: &'a Particle,
    /// Actual particle of the charge state.
    pub actual: &'a Particle,
    /// Centroid of the charge state in the element frame.
    pub centroid: &'a PhaseVector,
    /// Cavity driven phase already fixed by the design advance through this element.
    pub drive_phase: Option<f64>,
}

/// Result of passing one charge state through an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub matrix: PhaseMatrix,
    /// The charge state's actual particle at the exit.
    pub particle: Particle,
}

/// Linear optics of one element model.
pub trait ElementPhysics {
    /// Physical length [m].
    fn length(&self) -> f64;

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError>;

    /// Moves `particle` through the element. `design_in` is the design reference at
    /// the entrance, which active elements use to set their operating point.
    fn advance(
        &self,
        _design_in: &Particle,
        particle: &Particle,
    ) -> Result<Particle, ElementError> {
        Ok(particle.drifted(self.length()))
    }

    fn transfer(&self, ctx: &TransferContext<'_>) -> Result<Transfer, ElementError> {
        Ok(Transfer {
            matrix: self.transfer_matrix(ctx)?,
            particle: self.advance(ctx.design, ctx.actual)?,
        })
    }
}

/// Reads a non-negative length `L` [m].
pub(crate) fn read_length(params: &Params) -> Result<f64, ConfigError> {
    check_length(params, params.number("L")?)
}

pub(crate) fn read_length_or(params: &Params, default: f64) -> Result<f64, ConfigError> {
    check_length(params, params.number_or("L", default)?)
}

fn check_length(params: &Params, length: f64) -> Result<f64, ConfigError> {
    if length < 0.0 {
        Err(params.invalid("L", format!("length must not be negative, got {length}")))
    } else {
        Ok(length)
    }
}
