use super::error::ElementError;
use super::optics::drift_matrix;
use super::physics::{ElementPhysics, TransferContext, read_length};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::{MTOMM, cube};
use crate::core::math::{PS_1, PS_PX, PS_PY, PS_X, PS_Y, PhaseMatrix};

/// Thick sextupole split into `steps` drift-kick-drift slices. Each thin kick is
/// linearised about the centroid carried through the preceding slices, so an
/// off-axis beam sees the feed-down quadrupole and dipole terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sextupole {
    pub length: f64,
    /// Field curvature [T/m²].
    pub b3: f64,
    pub steps: usize,
}

impl Sextupole {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let step = params.number_or("step", 1.0)?;
        if step < 1.0 || step.fract() != 0.0 {
            return Err(params.invalid("step", "slice count must be a positive integer"));
        }
        Ok(Self {
            length: read_length(params)?,
            b3: params.number("B3")?,
            steps: step as usize,
        })
    }
}

/// Thin sextupole kick of integrated strength `s` [1/mm²] linearised at `(x0, y0)`.
fn kick(s: f64, x0: f64, y0: f64) -> PhaseMatrix {
    let mut m = PhaseMatrix::identity();
    m[(PS_PX, PS_X)] = -s * x0;
    m[(PS_PX, PS_Y)] = s * y0;
    m[(PS_PX, PS_1)] = 0.5 * s * (x0 * x0 - y0 * y0);
    m[(PS_PY, PS_X)] = s * y0;
    m[(PS_PY, PS_Y)] = s * x0;
    m[(PS_PY, PS_1)] = -s * x0 * y0;
    m
}

impl ElementPhysics for Sextupole {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let k2 = self.b3 / ctx.actual.brho() / cube(MTOMM);
        let slice = self.length / self.steps as f64;
        let half = drift_matrix(ctx.actual, slice / 2.0);
        let strength = k2 * slice * MTOMM;

        let mut m = PhaseMatrix::identity();
        let mut centroid = *ctx.centroid;
        for _ in 0..self.steps {
            centroid = half * centroid;
            let k = kick(strength, centroid[PS_X], centroid[PS_Y]);
            centroid = half * (k * centroid);
            m = half * k * half * m;
        }
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::elements::optics::drift_matrix;
    use crate::core::elements::testing::{Fixture, param_map, params, uranium};
    use crate::core::math::matrix::apply;

    #[test]
    fn centred_beam_sees_a_drift() {
        let fx = Fixture::new(uranium());
        let sx = Sextupole { length: 0.2, b3: 50.0, steps: 4 };
        let m = sx.transfer_matrix(&fx.ctx()).unwrap();
        let d = drift_matrix(&fx.actual, 0.2);
        assert!((m - d).abs().max() < 1e-9);
    }

    #[test]
    fn horizontal_offset_produces_feed_down_focusing() {
        let mut fx = Fixture::new(uranium());
        fx.centroid[PS_X] = 2.0;
        let sx = Sextupole { length: 0.2, b3: 50.0, steps: 1 };
        let m = sx.transfer_matrix(&fx.ctx()).unwrap();
        assert!(m[(PS_PX, PS_X)] < 0.0);
        assert!(m[(PS_PY, PS_Y)] > 0.0);
    }

    #[test]
    fn kick_reproduces_nonlinear_force_at_centroid() {
        let (s, x0, y0) = (1e-4, 2.0, -1.5);
        let k = kick(s, x0, y0);
        let mut v = crate::core::math::matrix::origin();
        v[PS_X] = x0;
        v[PS_Y] = y0;
        let out = apply(&k, &v).unwrap();
        assert!((out[PS_PX] + 0.5 * s * (x0 * x0 - y0 * y0)).abs() < 1e-15);
        assert!((out[PS_PY] - s * x0 * y0).abs() < 1e-15);
    }

    #[test]
    fn step_must_be_positive_integer() {
        for step in [0.0_f64, 1.5, -2.0] {
            let map = param_map(&[
                ("L", 0.1_f64.into()),
                ("B3", 1.0_f64.into()),
                ("step", step.into()),
            ]);
            assert!(Sextupole::from_params(&params(&map)).is_err(), "step = {step}");
        }
        let map = param_map(&[
            ("L", 0.1_f64.into()),
            ("B3", 1.0_f64.into()),
            ("step", 3.0_f64.into()),
        ]);
        assert_eq!(Sextupole::from_params(&params(&map)).unwrap().steps, 3);
    }
}
