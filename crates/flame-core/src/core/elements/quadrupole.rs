use super::error::ElementError;
use super::optics::{longitudinal_drift_term, quad_block};
use super::physics::{ElementPhysics, TransferContext, read_length};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::{MTOMM, sqr};
use crate::core::math::{PS_PS, PS_S, PS_X, PS_Y, PhaseMatrix};
use crate::core::models::Particle;

/// Horizontally focusing for `k > 0` [1/mm²], vertically defocusing.
fn quadrupole_matrix(particle: &Particle, length: f64, k: f64) -> PhaseMatrix {
    let l = length * MTOMM;
    let mut m = PhaseMatrix::identity();
    quad_block(&mut m, l, k, PS_X);
    quad_block(&mut m, l, -k, PS_Y);
    m[(PS_S, PS_PS)] = longitudinal_drift_term(particle, l);
    m
}

/// Magnetic quadrupole, `K = B2 / Brho`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrupole {
    pub length: f64,
    /// Field gradient [T/m].
    pub gradient: f64,
}

impl Quadrupole {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            length: read_length(params)?,
            gradient: params.number("B2")?,
        })
    }

    /// Focusing strength for `particle` [1/m²].
    pub fn strength(&self, particle: &Particle) -> f64 {
        self.gradient / particle.brho()
    }
}

impl ElementPhysics for Quadrupole {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let k = self.strength(ctx.actual) / sqr(MTOMM);
        Ok(quadrupole_matrix(ctx.actual, self.length, k))
    }
}

/// Electrostatic quadrupole with pole-tip voltage `V` at aperture `radius`,
/// `K = 2V / (R² · Erho)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EQuad {
    pub length: f64,
    pub voltage: f64,
    pub radius: f64,
}

impl EQuad {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let radius = params.number("radius")?;
        if radius <= 0.0 {
            return Err(params.invalid("radius", "aperture radius must be positive"));
        }
        Ok(Self {
            length: read_length(params)?,
            voltage: params.number("V")?,
            radius,
        })
    }

    pub fn strength(&self, particle: &Particle) -> f64 {
        2.0 * self.voltage / (sqr(self.radius) * particle.erho())
    }
}

impl ElementPhysics for EQuad {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let k = self.strength(ctx.actual) / sqr(MTOMM);
        Ok(quadrupole_matrix(ctx.actual, self.length, k))
    }
}
