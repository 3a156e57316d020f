use super::physics::TransferContext;
use crate::core::config::{ConfigValue, ParamMap, Params};
use crate::core::math::PhaseVector;
use crate::core::math::matrix::origin;
use crate::core::models::Particle;

pub const TOLERANCE: f64 = 1e-9;

pub fn f64_approx_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE * b.abs().max(1.0)
}

/// U-238 33+ at 500 keV/u.
pub fn uranium() -> Particle {
    Particle::new(931.494_32e6, 0.5e6, 33.0 / 238.0)
}

pub fn param_map(entries: &[(&str, ConfigValue)]) -> ParamMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn params<'a>(map: &'a ParamMap) -> Params<'a> {
    Params::new("test", map, None)
}

pub struct Fixture {
    pub design: Particle,
    pub actual: Particle,
    pub centroid: PhaseVector,
}

impl Fixture {
    pub fn new(particle: Particle) -> Self {
        Self {
            design: particle,
            actual: particle,
            centroid: origin(),
        }
    }

    pub fn ctx(&self) -> TransferContext<'_> {
        TransferContext {
            design: &self.design,
            actual: &self.actual,
            centroid: &self.centroid,
            drive_phase: None,
        }
    }
}
