use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::MTOMM;
use crate::core::math::matrix::{compose, invert};
use crate::core::math::{NumericError, PS_1, PS_PX, PS_PY, PS_X, PS_Y, PhaseMatrix};

/// Placement error of an element relative to the design orbit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alignment {
    /// Horizontal offset [m].
    pub dx: f64,
    /// Vertical offset [m].
    pub dy: f64,
    /// Rotation about the horizontal axis [rad].
    pub pitch: f64,
    /// Rotation about the vertical axis [rad].
    pub yaw: f64,
    /// Rotation about the beam axis [rad].
    pub tilt: f64,
}

impl Alignment {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            dx: params.number_or("dx", 0.0)?,
            dy: params.number_or("dy", 0.0)?,
            pitch: params.number_or("pitch", 0.0)?,
            yaw: params.number_or("yaw", 0.0)?,
            tilt: params.number_or("tilt", 0.0)?,
        })
    }

    pub fn is_ideal(&self) -> bool {
        *self == Self::default()
    }

    /// Map from beamline coordinates into the element frame: subtract offsets
    /// and angles, then rotate by `tilt` about the beam axis.
    pub fn entrance_map(&self) -> PhaseMatrix {
        let mut shift = PhaseMatrix::identity();
        shift[(PS_X, PS_1)] = -self.dx * MTOMM;
        shift[(PS_PX, PS_1)] = -self.yaw;
        shift[(PS_Y, PS_1)] = -self.dy * MTOMM;
        shift[(PS_PY, PS_1)] = -self.pitch;

        let (sn, cs) = self.tilt.sin_cos();
        let mut rotate = PhaseMatrix::identity();
        for (u, v) in [(PS_X, PS_Y), (PS_PX, PS_PY)] {
            rotate[(u, u)] = cs;
            rotate[(u, v)] = sn;
            rotate[(v, u)] = -sn;
            rotate[(v, v)] = cs;
        }
        rotate * shift
    }

    /// Expresses an element-frame transfer matrix in beamline coordinates.
    pub fn wrap(&self, transfer: &PhaseMatrix) -> Result<PhaseMatrix, NumericError> {
        if self.is_ideal() {
            return Ok(*transfer);
        }
        let a = self.entrance_map();
        let a_inv = invert(&a)?;
        compose(&a_inv, &compose(transfer, &a)?)
    }
}
