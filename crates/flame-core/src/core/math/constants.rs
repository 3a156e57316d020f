use std::f64::consts::PI;

/// Speed of light in vacuum [m/s].
pub const C0: f64 = 2.997_924_58e8;

/// Vacuum permeability [H/m].
pub const MU0: f64 = 4e0 * PI * 1e-7;

/// Metres to millimetres.
pub const MTOMM: f64 = 1e3;

/// MeV to eV.
pub const MEV_TO_EV: f64 = 1e6;

/// Longitudinal sampling frequency [Hz]; phase coordinates are expressed at this frequency.
pub const SAMPLE_FREQ: f64 = 80.5e6;

/// Sampling wavelength [mm].
pub const SAMPLE_LAMBDA: f64 = C0 / SAMPLE_FREQ * MTOMM;

#[inline]
pub fn sqr(x: f64) -> f64 {
    x * x
}

#[inline]
pub fn cube(x: f64) -> f64 {
    x * x * x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_lambda_is_expressed_in_millimetres() {
        assert!((SAMPLE_LAMBDA - 3724.129_92).abs() < 1e-3);
    }

    #[test]
    fn power_helpers_match_powi() {
        assert_eq!(sqr(3.0), 9.0);
        assert_eq!(cube(-2.0), -8.0);
    }
}
