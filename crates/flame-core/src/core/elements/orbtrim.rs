use super::error::ElementError;
use super::physics::{ElementPhysics, TransferContext};
use crate::core::config::{ConfigError, Params};
use crate::core::math::{PS_1, PS_PX, PS_PY, PhaseMatrix};

/// Steering kick, either as fixed angles or as integrated field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kick {
    /// Deflection angles [rad].
    Angle { x: f64, y: f64 },
    /// Integrated dipole field [T·m], scaled by each charge state's rigidity.
    Field { x: f64, y: f64 },
}

/// Zero-length orbit corrector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbTrim {
    pub kick: Kick,
}

impl OrbTrim {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let has_field = params.contains("tm_xkick") || params.contains("tm_ykick");
        let has_angle = params.contains("theta_x") || params.contains("theta_y");
        if has_field && has_angle {
            return Err(params.invalid(
                "tm_xkick",
                "give either angle kicks (theta_x/theta_y) or field kicks (tm_xkick/tm_ykick)",
            ));
        }
        let kick = if has_field {
            Kick::Field {
                x: params.number_or("tm_xkick", 0.0)?,
                y: params.number_or("tm_ykick", 0.0)?,
            }
        } else {
            Kick::Angle {
                x: params.number_or("theta_x", 0.0)?,
                y: params.number_or("theta_y", 0.0)?,
            }
        };
        Ok(Self { kick })
    }
}

impl ElementPhysics for OrbTrim {
    fn length(&self) -> f64 {
        0.0
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let (theta_x, theta_y) = match self.kick {
            Kick::Angle { x, y } => (x, y),
            Kick::Field { x, y } => {
                let brho = ctx.actual.brho();
                (x / brho, y / brho)
            }
        };
        let mut m = PhaseMatrix::identity();
        m[(PS_PX, PS_1)] = theta_x;
        m[(PS_PY, PS_1)] = theta_y;
        Ok(m)
    }
}
