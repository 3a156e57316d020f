use super::error::ElementError;
use super::optics::{longitudinal_drift_term, solenoid_block};
use super::physics::{ElementPhysics, TransferContext, read_length};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::MTOMM;
use crate::core::math::{PS_PS, PS_S, PhaseMatrix};
use crate::core::models::Particle;

/// Solenoid with axial field `B` [T], `K = B / (2·Brho)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solenoid {
    pub length: f64,
    pub field: f64,
}

impl Solenoid {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            length: read_length(params)?,
            field: params.number("B")?,
        })
    }

    /// Larmor wave number [1/m].
    pub fn strength(&self, particle: &Particle) -> f64 {
        self.field / (2.0 * particle.brho())
    }
}

impl ElementPhysics for Solenoid {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let l = self.length * MTOMM;
        let k = self.strength(ctx.actual) / MTOMM;
        let mut m = PhaseMatrix::identity();
        solenoid_block(&mut m, l, k);
        m[(PS_S, PS_PS)] = longitudinal_drift_term(ctx.actual, l);
        Ok(m)
    }
}
