use super::error::ElementError;
use super::optics::{edge_matrix, quad_block};
use super::physics::{ElementPhysics, TransferContext, read_length};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::{MTOMM, cube, sqr};
use crate::core::math::matrix::compose;
use crate::core::math::{PS_1, PS_PS, PS_PX, PS_S, PS_X, PS_Y, PhaseMatrix};
use crate::core::models::Particle;

/// Arc geometry shared by magnetic and electrostatic bends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendGeometry {
    pub length: f64,
    /// Bending angle [rad].
    pub angle: f64,
    /// Entrance pole-face angle [rad].
    pub entrance: f64,
    /// Exit pole-face angle [rad].
    pub exit: f64,
}

impl BendGeometry {
    fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let length = read_length(params)?;
        if length == 0.0 {
            return Err(params.invalid("L", "bend length must be positive"));
        }
        let angle = params.number("phi")?.to_radians();
        if angle == 0.0 {
            return Err(params.invalid("phi", "bending angle must be non-zero"));
        }
        Ok(Self {
            length,
            angle,
            entrance: params.number_or("phi1", 0.0)?.to_radians(),
            exit: params.number_or("phi2", 0.0)?.to_radians(),
        })
    }

    /// Bending radius [m].
    pub fn radius(&self) -> f64 {
        self.length / self.angle
    }

    /// Body map with horizontal strength `kx` and vertical `ky` [1/mm²]. The energy
    /// deviation couples through `dispersion` times the relative momentum
    /// deviation; `qmrel` is the relative charge-to-mass offset of the charge state.
    fn matrix(
        &self,
        design: &Particle,
        kx: f64,
        ky: f64,
        dispersion: f64,
        qmrel: f64,
    ) -> Result<PhaseMatrix, ElementError> {
        let l = self.length * MTOMM;
        let rho = self.radius() * MTOMM;

        let mut m = PhaseMatrix::identity();
        quad_block(&mut m, l, kx, PS_X);
        quad_block(&mut m, l, ky, PS_Y);

        let (dx, sx) = dispersion_functions(l, kx);
        let path = path_excess(l, kx, sx) / sqr(rho);
        let energy_scale = sqr(design.beta()) * design.gamma() * design.ion_es_mev();
        let ks = design.sample_ion_k();

        m[(PS_X, PS_PS)] = dispersion * dx / (rho * energy_scale);
        m[(PS_PX, PS_PS)] = dispersion * sx / (rho * energy_scale);
        m[(PS_S, PS_X)] = dispersion * sx / rho * ks;
        m[(PS_S, PS_PX)] = dispersion * dx / rho * ks;
        m[(PS_S, PS_PS)] =
            (sqr(dispersion) * path - l / sqr(design.gamma())) * ks / energy_scale;

        m[(PS_X, PS_1)] = -dx / rho * qmrel;
        m[(PS_PX, PS_1)] = -sx / rho * qmrel;
        m[(PS_S, PS_1)] = -path * ks * qmrel;

        let body = compose(&m, &edge_matrix(rho, self.entrance))?;
        Ok(compose(&edge_matrix(rho, self.exit), &body)?)
    }
}

/// Horizontal dispersion `D(L)` and its slope `D'(L)` for a unit bend.
fn dispersion_functions(l: f64, kx: f64) -> (f64, f64) {
    if kx > 0.0 {
        let sk = kx.sqrt();
        ((1.0 - (sk * l).cos()) / kx, (sk * l).sin() / sk)
    } else if kx < 0.0 {
        let sk = (-kx).sqrt();
        ((1.0 - (sk * l).cosh()) / kx, (sk * l).sinh() / sk)
    } else {
        (sqr(l) / 2.0, l)
    }
}

/// `(L - D'(L)) / kx`, continuous at `kx = 0`.
fn path_excess(l: f64, kx: f64, sx: f64) -> f64 {
    if kx == 0.0 {
        cube(l) / 6.0
    } else {
        (l - sx) / kx
    }
}

fn qmrel(ctx: &TransferContext<'_>) -> f64 {
    (ctx.actual.ion_z - ctx.design.ion_z) / ctx.design.ion_z
}

/// Magnetic sector bend with optional field gradient `K` [1/m²].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SBend {
    pub geometry: BendGeometry,
    pub gradient: f64,
}

impl SBend {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            geometry: BendGeometry::from_params(params)?,
            gradient: params.number_or("K", 0.0)?,
        })
    }
}

impl ElementPhysics for SBend {
    fn length(&self) -> f64 {
        self.geometry.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let rho = self.geometry.radius() * MTOMM;
        let k = self.gradient / sqr(MTOMM);
        self.geometry
            .matrix(ctx.design, k + 1.0 / sqr(rho), -k, 1.0, qmrel(ctx))
    }
}

/// Electrostatic bend with cylindrical or spherical electrodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EDipole {
    pub geometry: BendGeometry,
    pub spherical: bool,
}

impl EDipole {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let spher = params.number_or("spher", 0.0)?;
        if spher != 0.0 && spher != 1.0 {
            return Err(params.invalid("spher", "expected 0 (cylindrical) or 1 (spherical)"));
        }
        Ok(Self {
            geometry: BendGeometry::from_params(params)?,
            spherical: spher == 1.0,
        })
    }
}

impl ElementPhysics for EDipole {
    fn length(&self) -> f64 {
        self.geometry.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        let rho = self.geometry.radius() * MTOMM;
        let n = if self.spherical { 1.0 } else { 0.0 };
        let beta2 = sqr(ctx.design.beta());
        let kx = (2.0 - beta2 - n) / sqr(rho);
        let ky = n / sqr(rho);
        self.geometry
            .matrix(ctx.design, kx, ky, 2.0 - beta2, qmrel(ctx))
    }
}
