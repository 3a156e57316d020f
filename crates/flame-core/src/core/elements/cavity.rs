use super::error::ElementError;
use super::optics::drift_matrix;
use super::physics::{ElementPhysics, Transfer, TransferContext, read_length_or};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::{C0, MEV_TO_EV, MTOMM, SAMPLE_FREQ, sqr};
use crate::core::math::{PS_PS, PS_PX, PS_PY, PS_S, PS_X, PS_Y, PhaseMatrix};
use crate::core::models::Particle;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Number of driven-phase samples used to locate the crest of a field map.
const CREST_SCAN_POINTS: usize = 72;

/// Accelerating field description.
#[derive(Debug, Clone, PartialEq)]
pub enum CavityField {
    /// Single gap at the cavity centre with effective voltage `V0·T`.
    ThinGap { voltage: f64, transit_time: f64 },
    /// On-axis longitudinal field `ez` [V/m] sampled at `z` [m].
    FieldMap { z: Vec<f64>, ez: Vec<f64> },
}

/// Meaning of the configured phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseMode {
    /// Synchronous phase of the design particle relative to crest.
    Synchronous,
    /// Absolute driven phase of the cavity.
    Driven,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RfCavity {
    pub length: f64,
    /// RF frequency [Hz].
    pub frequency: f64,
    /// Configured phase [rad].
    pub phase: f64,
    pub mode: PhaseMode,
    /// Field amplitude scale factor.
    pub scale: f64,
    pub label: Option<String>,
    pub field: CavityField,
}

/// One accelerating kick: effective voltage and the coefficient of the radial
/// focusing term.
#[derive(Debug, Clone, Copy)]
struct Gap {
    voltage: f64,
    radial: Radial,
}

#[derive(Debug, Clone, Copy)]
enum Radial {
    /// Transit-time focusing of a thin gap.
    ThinLens,
    /// Panofsky kick from the field gradient `dEz` [V/m] across a slice.
    Gradient(f64),
}

impl RfCavity {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let frequency = params.number("f")?;
        if frequency <= 0.0 {
            return Err(params.invalid("f", "RF frequency must be positive"));
        }
        let mode = match params.number_or("syncflag", 1.0)? {
            x if x == 1.0 => PhaseMode::Synchronous,
            x if x == 0.0 => PhaseMode::Driven,
            _ => return Err(params.invalid("syncflag", "expected 0 or 1")),
        };
        let field = if params.contains("field_file") || params.contains("field_z") {
            read_field_map(params)?
        } else {
            CavityField::ThinGap {
                voltage: params.number("V0")?,
                transit_time: params.number_or("T", 1.0)?,
            }
        };
        let map_length = match &field {
            CavityField::FieldMap { z, .. } => z[z.len() - 1] - z[0],
            CavityField::ThinGap { .. } => 0.0,
        };
        let length = read_length_or(params, map_length)?;
        if length + 1e-12 < map_length {
            return Err(params.invalid(
                "L",
                format!("cavity length {length} m is shorter than its field map ({map_length} m)"),
            ));
        }

        Ok(Self {
            length,
            frequency,
            phase: params.number("phi")?.to_radians(),
            mode,
            scale: params.number_or("scl_fac", 1.0)?,
            label: params.text_opt("cavtype")?.map(str::to_string),
            field,
        })
    }

    /// RF harmonic relative to the sampling frequency.
    pub fn multip(&self) -> f64 {
        self.frequency / SAMPLE_FREQ
    }

    /// RF wavelength [mm].
    fn rf_lambda(&self) -> f64 {
        C0 / self.frequency * MTOMM
    }

    fn rf_phase(&self, particle: &Particle, caviphi0: f64) -> f64 {
        self.multip() * particle.phis + caviphi0
    }

    /// Driven phase for a design particle entering with `design_in`.
    pub fn driven_phase(&self, design_in: &Particle) -> Result<f64, ElementError> {
        match self.mode {
            PhaseMode::Driven => Ok(self.phase),
            PhaseMode::Synchronous => Ok(self.crest_phase(design_in)? + self.phase),
        }
    }

    /// Driven phase giving the design particle its largest energy gain.
    pub fn crest_phase(&self, design_in: &Particle) -> Result<f64, ElementError> {
        match &self.field {
            CavityField::ThinGap { voltage, transit_time } => {
                let at_gap = design_in.drifted(self.length / 2.0);
                let flip = if design_in.ion_z * voltage * transit_time * self.scale < 0.0 {
                    PI
                } else {
                    0.0
                };
                Ok(flip - self.multip() * at_gap.phis)
            }
            CavityField::FieldMap { .. } => self.scan_crest(design_in),
        }
    }

    fn scan_crest(&self, design_in: &Particle) -> Result<f64, ElementError> {
        let step = 2.0 * PI / CREST_SCAN_POINTS as f64;
        let gain = |phi: f64| {
            self.traverse(design_in, phi, false)
                .map(|t| t.particle.ion_ek)
                .unwrap_or(f64::NEG_INFINITY)
        };
        let samples: Vec<f64> = (0..CREST_SCAN_POINTS).map(|i| gain(i as f64 * step)).collect();
        let (best, peak) = samples
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, g)| if g > acc.1 { (i, g) } else { acc });
        if !peak.is_finite() {
            return Err(ElementError::physics(
                "design particle is stopped at every cavity phase",
            ));
        }

        let below = samples[(best + CREST_SCAN_POINTS - 1) % CREST_SCAN_POINTS];
        let above = samples[(best + 1) % CREST_SCAN_POINTS];
        let curvature = below - 2.0 * peak + above;
        let offset = if curvature < 0.0 && below.is_finite() && above.is_finite() {
            0.5 * step * (below - above) / curvature
        } else {
            0.0
        };
        Ok(best as f64 * step + offset)
    }

    /// Tracks `particle` through the cavity with driven phase `caviphi0`,
    /// optionally accumulating the linear map around it.
    fn traverse(
        &self,
        particle: &Particle,
        caviphi0: f64,
        with_matrix: bool,
    ) -> Result<Transfer, ElementError> {
        let mut tracker = Tracker {
            cavity: self,
            caviphi0,
            particle: *particle,
            matrix: with_matrix.then(PhaseMatrix::identity),
        };
        match &self.field {
            CavityField::ThinGap { voltage, transit_time } => {
                tracker.drift(self.length / 2.0);
                tracker.kick(Gap {
                    voltage: voltage * transit_time * self.scale,
                    radial: Radial::ThinLens,
                })?;
                tracker.drift(self.length / 2.0);
            }
            CavityField::FieldMap { z, ez } => {
                let pad = (self.length - (z[z.len() - 1] - z[0])).max(0.0) / 2.0;
                tracker.drift(pad);
                for k in 0..z.len() - 1 {
                    let dz = z[k + 1] - z[k];
                    tracker.drift(dz / 2.0);
                    tracker.kick(Gap {
                        voltage: 0.5 * (ez[k] + ez[k + 1]) * dz * self.scale,
                        radial: Radial::Gradient((ez[k + 1] - ez[k]) * self.scale),
                    })?;
                    tracker.drift(dz / 2.0);
                }
                tracker.drift(pad);
            }
        }
        let mut out = tracker.particle;
        out.last_caviphi0 = caviphi0;
        Ok(Transfer {
            matrix: tracker.matrix.unwrap_or_else(PhaseMatrix::identity),
            particle: out,
        })
    }
}

struct Tracker<'a> {
    cavity: &'a RfCavity,
    caviphi0: f64,
    particle: Particle,
    matrix: Option<PhaseMatrix>,
}

impl Tracker<'_> {
    fn drift(&mut self, length: f64) {
        if length == 0.0 {
            return;
        }
        if let Some(m) = self.matrix.as_mut() {
            *m = drift_matrix(&self.particle, length) * *m;
        }
        self.particle = self.particle.drifted(length);
    }

    fn kick(&mut self, gap: Gap) -> Result<(), ElementError> {
        let p = self.particle;
        let phi = self.cavity.rf_phase(&p, self.caviphi0);
        let amplitude = p.ion_z * gap.voltage;
        let out = p.with_kinetic_energy(p.ion_ek + amplitude * phi.cos());
        if !(out.ion_ek > 0.0) {
            return Err(ElementError::physics(format!(
                "particle stopped inside RF cavity at {:.4} m",
                p.pos
            )));
        }

        if let Some(m) = self.matrix.as_mut() {
            let (bg_in, bg_out) = (p.bg(), out.bg());
            // Change of βγ·x' per mm of offset.
            let radial = match gap.radial {
                Radial::ThinLens => {
                    -PI * amplitude * phi.sin()
                        / (p.ion_es * sqr(p.beta()) * sqr(p.gamma()) * self.cavity.rf_lambda())
                }
                Radial::Gradient(d_ez) => {
                    -bg_in * p.ion_z * d_ez * phi.cos()
                        / (2.0 * sqr(p.beta()) * p.gamma() * p.ion_es * MTOMM)
                }
            };
            let mut g = PhaseMatrix::identity();
            g[(PS_PS, PS_S)] = -amplitude * phi.sin() * self.cavity.multip() / MEV_TO_EV;
            for (u, pu) in [(PS_X, PS_PX), (PS_Y, PS_PY)] {
                g[(pu, u)] = radial / bg_out;
                g[(pu, pu)] = bg_in / bg_out;
            }
            *m = g * *m;
        }
        self.particle = out;
        Ok(())
    }
}

fn read_field_map(params: &Params) -> Result<CavityField, ConfigError> {
    let (z, ez, key) = match params.text_opt("field_file")? {
        Some(file) => {
            let path = resolve_data_path(params.text_opt("Eng_Data_Dir")?, file);
            let (z, ez) = load_field_map(&path)?;
            (z, ez, "field_file")
        }
        None => (
            params.vector("field_z")?.to_vec(),
            params.vector("field_ez")?.to_vec(),
            "field_z",
        ),
    };
    if z.len() < 2 || z.len() != ez.len() {
        return Err(params.invalid(
            key,
            format!("field map needs at least two (z, Ez) pairs, got {} and {}", z.len(), ez.len()),
        ));
    }
    if z.windows(2).any(|w| w[1] <= w[0]) {
        return Err(params.invalid(key, "field map positions must be strictly increasing"));
    }
    Ok(CavityField::FieldMap { z, ez })
}

fn resolve_data_path(data_dir: Option<&str>, file: &str) -> PathBuf {
    let path = Path::new(file);
    match data_dir {
        Some(dir) if path.is_relative() => Path::new(dir).join(path),
        _ => path.to_path_buf(),
    }
}

/// Reads a two-column `z [m], Ez [V/m]` table; `#` starts a comment line.
pub fn load_field_map(path: &Path) -> Result<(Vec<f64>, Vec<f64>), ConfigError> {
    let csv_error = |e: csv::Error| ConfigError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut z = Vec::new();
    let mut ez = Vec::new();
    for record in reader.deserialize::<(f64, f64)>() {
        let (zi, ei) = record.map_err(csv_error)?;
        z.push(zi);
        ez.push(ei);
    }
    Ok((z, ez))
}

impl ElementPhysics for RfCavity {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(self.transfer(ctx)?.matrix)
    }

    fn advance(&self, design_in: &Particle, particle: &Particle) -> Result<Particle, ElementError> {
        let caviphi0 = self.driven_phase(design_in)?;
        Ok(self.traverse(particle, caviphi0, false)?.particle)
    }

    fn transfer(&self, ctx: &TransferContext<'_>) -> Result<Transfer, ElementError> {
        let caviphi0 = match ctx.drive_phase {
            Some(phase) => phase,
            None => self.driven_phase(ctx.design)?,
        };
        self.traverse(ctx.actual, caviphi0, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigValue;
    use crate::core::elements::testing::{Fixture, f64_approx_equal, param_map, params, uranium};
    use std::fs;
    use tempfile::tempdir;

    fn thin_gap(phase_deg: f64, mode: PhaseMode) -> RfCavity {
        RfCavity {
            length: 0.24,
            frequency: 80.5e6,
            phase: phase_deg.to_radians(),
            mode,
            scale: 1.0,
            label: None,
            field: CavityField::ThinGap {
                voltage: 1.0e6,
                transit_time: 0.8,
            },
        }
    }

    /// Two-lobe field shaped like a quarter-wave gap pair.
    fn field_map_cavity() -> RfCavity {
        let n = 121;
        let z: Vec<f64> = (0..n).map(|i| -0.12 + 0.24 * i as f64 / (n - 1) as f64).collect();
        let ez = z
            .iter()
            .map(|zi| 4.0e6 * (-(zi / 0.04).powi(2)).exp() * (zi / 0.04))
            .collect();
        RfCavity {
            length: 0.3,
            frequency: 80.5e6,
            phase: -30f64.to_radians(),
            mode: PhaseMode::Synchronous,
            scale: 1.0,
            label: Some("test".into()),
            field: CavityField::FieldMap { z, ez },
        }
    }

    #[test]
    fn thin_gap_on_crest_gains_full_voltage() {
        let p = uranium();
        let cav = thin_gap(0.0, PhaseMode::Synchronous);
        let out = cav.advance(&p, &p).unwrap();
        assert!(f64_approx_equal(out.ion_ek - p.ion_ek, p.ion_z * 1.0e6 * 0.8));
        assert_eq!(out.ion_w(), out.ion_ek + out.ion_es);
    }

    #[test]
    fn synchronous_phase_reduces_gain_by_cosine() {
        let p = uranium();
        let cav = thin_gap(-30.0, PhaseMode::Synchronous);
        let out = cav.advance(&p, &p).unwrap();
        let expected = p.ion_z * 1.0e6 * 0.8 * 30f64.to_radians().cos();
        assert!(f64_approx_equal(out.ion_ek - p.ion_ek, expected));
    }

    #[test]
    fn driven_mode_uses_phase_verbatim() {
        let p = uranium();
        let cav = thin_gap(12.0, PhaseMode::Driven);
        assert_eq!(cav.driven_phase(&p).unwrap(), 12f64.to_radians());
        let out = cav.advance(&p, &p).unwrap();
        assert_eq!(out.last_caviphi0, 12f64.to_radians());
    }

    #[test]
    fn advance_records_driven_phase_and_position() {
        let p = uranium();
        let cav = thin_gap(-30.0, PhaseMode::Synchronous);
        let out = cav.advance(&p, &p).unwrap();
        assert_eq!(out.last_caviphi0, cav.driven_phase(&p).unwrap());
        assert!(f64_approx_equal(out.pos, 0.24));
    }

    #[test]
    fn transfer_matrix_bunches_and_defocuses_below_crest() {
        let fx = Fixture::new(uranium());
        let cav = thin_gap(-30.0, PhaseMode::Synchronous);
        let t = cav.transfer(&fx.ctx()).unwrap();
        // Below crest the energy slope along the bunch is positive and the
        // transverse kick points outward.
        let g = t.matrix;
        assert!(g[(PS_PS, PS_S)] > 0.0);
        assert!(g[(PS_PX, PS_X)] > 0.0);
        assert!(t.particle.ion_ek > fx.actual.ion_ek);
        assert_eq!(t.particle, cav.advance(&fx.design, &fx.actual).unwrap());
    }

    #[test]
    fn overwhelming_deceleration_is_a_physics_error() {
        let p = uranium();
        let mut cav = thin_gap(180.0, PhaseMode::Synchronous);
        cav.field = CavityField::ThinGap {
            voltage: 1.0e8,
            transit_time: 1.0,
        };
        assert!(matches!(cav.advance(&p, &p), Err(ElementError::Physics { .. })));
    }

    #[test]
    fn field_map_crest_maximises_energy_gain() {
        let p = uranium();
        let cav = field_map_cavity();
        let crest = cav.crest_phase(&p).unwrap();
        let gain = |phi: f64| cav.traverse(&p, phi, false).unwrap().particle.ion_ek;
        let at_crest = gain(crest);
        assert!(at_crest > p.ion_ek);
        assert!(at_crest >= gain(crest + 0.05));
        assert!(at_crest >= gain(crest - 0.05));
    }

    #[test]
    fn field_map_matrix_tracks_the_same_particle_as_advance() {
        let fx = Fixture::new(uranium());
        let cav = field_map_cavity();
        let t = cav.transfer(&fx.ctx()).unwrap();
        let advanced = cav.advance(&fx.design, &fx.actual).unwrap();
        assert_eq!(t.particle, advanced);
        assert!(f64_approx_equal(advanced.pos, 0.3));
        assert!(t.matrix.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn supplied_drive_phase_matches_the_scanned_one() {
        let fx = Fixture::new(uranium());
        let cav = field_map_cavity();
        let design_out = cav.advance(&fx.design, &fx.design).unwrap();
        let scanned = cav.transfer(&fx.ctx()).unwrap();
        let supplied = cav
            .transfer(&TransferContext {
                drive_phase: Some(design_out.last_caviphi0),
                ..fx.ctx()
            })
            .unwrap();
        assert_eq!(scanned, supplied);

        let shifted = cav
            .transfer(&TransferContext {
                drive_phase: Some(design_out.last_caviphi0 + 0.5),
                ..fx.ctx()
            })
            .unwrap();
        assert_ne!(shifted.particle.ion_ek, scanned.particle.ion_ek);
    }

    #[test]
    fn thin_gap_requires_voltage() {
        let map = param_map(&[
            ("f", 80.5e6_f64.into()),
            ("phi", 0.0_f64.into()),
            ("L", 0.2_f64.into()),
        ]);
        assert!(matches!(
            RfCavity::from_params(&params(&map)),
            Err(ConfigError::MissingParameter { ref key, .. }) if key == "V0"
        ));
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let map = param_map(&[
            ("f", 0.0_f64.into()),
            ("phi", 0.0_f64.into()),
            ("V0", 1.0_f64.into()),
        ]);
        assert!(RfCavity::from_params(&params(&map)).is_err());
    }

    #[test]
    fn field_map_must_be_increasing_and_paired() {
        let map = param_map(&[
            ("f", 80.5e6_f64.into()),
            ("phi", 0.0_f64.into()),
            ("field_z", ConfigValue::from(vec![0.0, 0.1, 0.1])),
            ("field_ez", ConfigValue::from(vec![0.0, 1.0, 0.0])),
        ]);
        assert!(RfCavity::from_params(&params(&map)).is_err());

        let map = param_map(&[
            ("f", 80.5e6_f64.into()),
            ("phi", 0.0_f64.into()),
            ("field_z", ConfigValue::from(vec![0.0, 0.1])),
            ("field_ez", ConfigValue::from(vec![0.0])),
        ]);
        assert!(RfCavity::from_params(&params(&map)).is_err());
    }

    #[test]
    fn cavity_shorter_than_field_map_is_rejected() {
        let map = param_map(&[
            ("f", 80.5e6_f64.into()),
            ("phi", 0.0_f64.into()),
            ("L", 0.05_f64.into()),
            ("field_z", ConfigValue::from(vec![0.0, 0.1])),
            ("field_ez", ConfigValue::from(vec![1.0, 1.0])),
        ]);
        assert!(matches!(
            RfCavity::from_params(&params(&map)),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "L"
        ));
    }

    #[test]
    fn field_file_is_resolved_against_data_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("gap.csv"),
            "# z [m], Ez [V/m]\n0.0, 0.0\n0.05, 1.0e6\n0.1, 0.0\n",
        )
        .unwrap();
        let map = param_map(&[
            ("f", 80.5e6_f64.into()),
            ("phi", 0.0_f64.into()),
            ("field_file", "gap.csv".into()),
            ("Eng_Data_Dir", dir.path().to_string_lossy().to_string().into()),
        ]);
        let cav = RfCavity::from_params(&params(&map)).unwrap();
        assert!(f64_approx_equal(cav.length, 0.1));
        match cav.field {
            CavityField::FieldMap { z, ez } => {
                assert_eq!(z, vec![0.0, 0.05, 0.1]);
                assert_eq!(ez[1], 1.0e6);
            }
            CavityField::ThinGap { .. } => panic!("expected a field map"),
        }
    }

    #[test]
    fn malformed_field_file_is_a_csv_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "0.0, not-a-number\n").unwrap();
        assert!(matches!(load_field_map(&path), Err(ConfigError::Csv { .. })));
    }

    #[test]
    fn missing_field_file_is_a_csv_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_field_map(&dir.path().join("absent.csv")),
            Err(ConfigError::Csv { .. })
        ));
    }
}
