//! Matrix building blocks shared by the element models. Lengths are in mm and
//! focusing strengths in 1/mm².

use crate::core::math::constants::{MTOMM, SAMPLE_LAMBDA, cube};
use crate::core::math::{PS_PS, PS_PX, PS_PY, PS_S, PS_X, PS_Y, PhaseMatrix};
use crate::core::models::Particle;
use std::f64::consts::PI;

/// Pole-face rotation of angle `phi` [rad] on a bend of radius `rho` [mm].
pub fn edge_matrix(rho: f64, phi: f64) -> PhaseMatrix {
    let mut m = PhaseMatrix::identity();
    m[(PS_PX, PS_X)] = phi.tan() / rho;
    m[(PS_PY, PS_Y)] = -phi.tan() / rho;
    m
}

/// Fills the 2×2 block starting at `ind` with a quadrupole-like map of length
/// `l`: focusing for `k > 0`, defocusing for `k < 0`, a drift for `k == 0`.
pub fn quad_block(m: &mut PhaseMatrix, l: f64, k: f64, ind: usize) {
    let sqrt_k = k.abs().sqrt();
    let psi = sqrt_k * l;
    let (cs, sn, sign) = if k > 0.0 {
        (psi.cos(), psi.sin(), -1.0)
    } else {
        (psi.cosh(), psi.sinh(), 1.0)
    };

    m[(ind, ind)] = cs;
    m[(ind + 1, ind + 1)] = cs;
    if sqrt_k != 0.0 {
        m[(ind, ind + 1)] = sn / sqrt_k;
        m[(ind + 1, ind)] = sign * sqrt_k * sn;
    } else {
        m[(ind, ind + 1)] = l;
        m[(ind + 1, ind)] = 0.0;
    }
}

/// Fills the coupled transverse 4×4 block of a solenoid with `k = B/(2·Brho)` [1/mm].
pub fn solenoid_block(m: &mut PhaseMatrix, l: f64, k: f64) {
    let c = (k * l).cos();
    let s = (k * l).sin();
    let (sc_over_k, s2_over_k) = if k != 0.0 {
        (s * c / k, s * s / k)
    } else {
        (l, 0.0)
    };

    m[(PS_X, PS_X)] = c * c;
    m[(PS_PX, PS_PX)] = c * c;
    m[(PS_Y, PS_Y)] = c * c;
    m[(PS_PY, PS_PY)] = c * c;

    m[(PS_X, PS_PX)] = sc_over_k;
    m[(PS_X, PS_Y)] = s * c;
    m[(PS_X, PS_PY)] = s2_over_k;

    m[(PS_PX, PS_X)] = -k * s * c;
    m[(PS_PX, PS_Y)] = -k * s * s;
    m[(PS_PX, PS_PY)] = s * c;

    m[(PS_Y, PS_X)] = -s * c;
    m[(PS_Y, PS_PX)] = -s2_over_k;
    m[(PS_Y, PS_PY)] = sc_over_k;

    m[(PS_PY, PS_X)] = k * s * s;
    m[(PS_PY, PS_PX)] = -s * c;
    m[(PS_PY, PS_Y)] = -k * s * c;
}

/// Phase slip per unit energy deviation over `l` mm of free flight.
pub fn longitudinal_drift_term(particle: &Particle, l: f64) -> f64 {
    -2.0 * PI / (SAMPLE_LAMBDA * particle.ion_es_mev() * cube(particle.bg())) * l
}

/// Field-free drift of `length` metres for `particle`.
pub fn drift_matrix(particle: &Particle, length: f64) -> PhaseMatrix {
    let l = length * MTOMM;
    let mut m = PhaseMatrix::identity();
    m[(PS_X, PS_PX)] = l;
    m[(PS_Y, PS_PY)] = l;
    m[(PS_S, PS_PS)] = longitudinal_drift_term(particle, l);
    m
}
