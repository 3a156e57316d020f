use crate::core::math::constants::{C0, MEV_TO_EV, MTOMM, SAMPLE_LAMBDA, sqr};
use std::f64::consts::PI;

/// Kinematics of a single ion: either the design reference or the actual
/// (possibly perturbed) particle of one charge state.
///
/// Only the canonical quantities are stored. Total energy, the relativistic
/// factors, the sampling wave number and the rigidities are derived on access,
/// so they can never drift out of sync with the kinetic energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Charge-to-mass ratio Q/A.
    pub ion_z: f64,
    /// Mass number A.
    pub ion_a: f64,
    /// Rest energy per nucleon [eV/u].
    pub ion_es: f64,
    /// Kinetic energy per nucleon [eV/u].
    pub ion_ek: f64,
    /// Absolute phase at the sampling frequency [rad].
    pub phis: f64,
    /// Longitudinal position [m].
    pub pos: f64,
    /// Driven phase of the last RF cavity traversed [rad].
    pub last_caviphi0: f64,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            ion_z: 0.0,
            ion_a: 1.0,
            ion_es: 0.0,
            ion_ek: 0.0,
            phis: 0.0,
            pos: 0.0,
            last_caviphi0: 0.0,
        }
    }
}

impl Particle {
    pub fn new(ion_es: f64, ion_ek: f64, ion_z: f64) -> Self {
        Self {
            ion_z,
            ion_es,
            ion_ek,
            ..Self::default()
        }
    }

    /// Total energy per nucleon [eV/u].
    #[inline]
    pub fn ion_w(&self) -> f64 {
        self.ion_ek + self.ion_es
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        if self.ion_es != 0.0 {
            self.ion_w() / self.ion_es
        } else {
            1.0
        }
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        (1.0 - 1.0 / sqr(self.gamma())).max(0.0).sqrt()
    }

    #[inline]
    pub fn bg(&self) -> f64 {
        let beta = self.beta();
        if beta != 0.0 { beta * self.gamma() } else { 1.0 }
    }

    /// Wave number at the sampling frequency [rad/mm].
    #[inline]
    pub fn sample_ion_k(&self) -> f64 {
        let beta = self.beta();
        if beta != 0.0 {
            2.0 * PI / (beta * SAMPLE_LAMBDA)
        } else {
            2.0 * PI / SAMPLE_LAMBDA
        }
    }

    /// Charge number Q.
    #[inline]
    pub fn ion_q(&self) -> f64 {
        self.ion_z * self.ion_a
    }

    /// Magnetic rigidity [T·m].
    #[inline]
    pub fn brho(&self) -> f64 {
        self.beta() * self.ion_w() / (C0 * self.ion_z)
    }

    /// Electric rigidity [V].
    #[inline]
    pub fn erho(&self) -> f64 {
        sqr(self.beta()) * self.gamma() * self.ion_es / self.ion_z
    }

    #[inline]
    pub fn ion_es_mev(&self) -> f64 {
        self.ion_es / MEV_TO_EV
    }

    /// Advances through field-free space of `length` metres.
    pub fn drifted(&self, length: f64) -> Self {
        Self {
            phis: self.phis + self.sample_ion_k() * length * MTOMM,
            pos: self.pos + length,
            ..*self
        }
    }

    pub fn with_kinetic_energy(&self, ion_ek: f64) -> Self {
        Self { ion_ek, ..*self }
    }
}
