use super::particle::Particle;
use crate::core::math::{PS_1, PS_DIM, PhaseMatrix, PhaseVector};

/// One charge-state component of a beam: its actual particle, relative
/// population and first/second moments in the homogeneous phase space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeState {
    /// Actual particle of this charge state; `real.ion_z` is its Q/A.
    pub real: Particle,
    /// Relative population (`NCharge`).
    pub weight: f64,
    /// Centroid; the homogeneous entry is always 1.
    pub moment0: PhaseVector,
    /// Central second moments; the homogeneous row and column are zero.
    pub moment1: PhaseMatrix,
}

impl ChargeState {
    /// Builds a charge state, normalising the homogeneous entries of both moments.
    pub fn new(real: Particle, weight: f64, moment0: PhaseVector, moment1: PhaseMatrix) -> Self {
        let mut state = Self {
            real,
            weight,
            moment0,
            moment1,
        };
        state.normalize_homogeneous();
        state
    }

    #[inline]
    pub fn ion_z(&self) -> f64 {
        self.real.ion_z
    }

    /// RMS extents: the square roots of the covariance diagonal.
    pub fn moment0_rms(&self) -> PhaseVector {
        rms_of(&self.moment1)
    }

    pub(crate) fn normalize_homogeneous(&mut self) {
        self.moment0[PS_1] = 1.0;
        for k in 0..PS_DIM {
            self.moment1[(PS_1, k)] = 0.0;
            self.moment1[(k, PS_1)] = 0.0;
        }
    }
}

pub(crate) fn rms_of(moment1: &PhaseMatrix) -> PhaseVector {
    PhaseVector::from_fn(|i, _| moment1[(i, i)].max(0.0).sqrt())
}
