use super::error::ElementError;
use super::physics::{ElementPhysics, TransferContext};
use crate::core::config::{ConfigError, Params};
use crate::core::math::constants::{MEV_TO_EV, sqr};
use crate::core::math::matrix::{check_matrix, check_vector};
use crate::core::math::{PS_PS, PS_PX, PS_PY, PS_S, PhaseMatrix};
use crate::core::models::{ChargeState, Particle, State};
use tracing::{debug, warn};

/// Output charge-state population of a stripper.
#[derive(Debug, Clone, PartialEq)]
pub enum ChargeDistribution {
    /// Explicit `(Q/A, weight)` pairs.
    Explicit(Vec<(f64, f64)>),
    /// Semi-empirical equilibrium distribution after a carbon foil (Baron).
    Baron {
        /// Atomic number of the ion.
        proton: f64,
        /// Mass number of the ion.
        mass: f64,
        /// Minimum population fraction kept.
        cutoff: f64,
    },
}

impl ChargeDistribution {
    /// Population fractions `(Q/A, fraction)` for an ion arriving with `particle`.
    /// Fractions sum to one.
    pub fn fractions(&self, particle: &Particle) -> Vec<(f64, f64)> {
        match self {
            ChargeDistribution::Explicit(states) => {
                let total: f64 = states.iter().map(|(_, w)| w).sum();
                let n = states.len() as f64;
                states
                    .iter()
                    .map(|(z, w)| (*z, if total > 0.0 { w / total } else { 1.0 / n }))
                    .collect()
            }
            ChargeDistribution::Baron {
                proton,
                mass,
                cutoff,
            } => baron_fractions(*proton, particle.beta(), particle.ion_ek / MEV_TO_EV, *cutoff)
                .into_iter()
                .map(|(q, f)| (q / mass, f))
                .collect(),
        }
    }
}

/// Gaussian charge distribution around the Baron mean charge, as `(Q, fraction)`.
fn baron_fractions(z: f64, beta: f64, ek_mev_u: f64, cutoff: f64) -> Vec<(f64, f64)> {
    let mut mean = z * (1.0 - (-83.275 * beta / z.powf(0.447)).exp());
    if ek_mev_u > 1.3 {
        mean *= 1.0 - (-12.905 + 0.2124 * z - 0.00122 * sqr(z)).exp();
    }
    let width = 0.5 * (mean * (1.0 - (mean / z).powf(1.67))).max(0.0).sqrt();

    let charges = 1..=(z.round() as u32);
    if width < 1e-6 {
        let q = mean.round().clamp(1.0, z.round());
        return vec![(q, 1.0)];
    }
    let raw: Vec<(f64, f64)> = charges
        .map(|q| {
            let q = f64::from(q);
            (q, (-sqr(q - mean) / (2.0 * sqr(width))).exp())
        })
        .collect();
    let total: f64 = raw.iter().map(|(_, f)| f).sum();
    let mut kept: Vec<(f64, f64)> = raw
        .iter()
        .map(|(q, f)| (*q, f / total))
        .filter(|(_, f)| *f >= cutoff)
        .collect();
    if kept.is_empty() {
        let best = raw
            .iter()
            .copied()
            .fold((mean.round(), 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        kept.push((best.0, 1.0));
    }
    let kept_total: f64 = kept.iter().map(|(_, f)| f).sum();
    kept.iter().map(|(q, f)| (*q, f / kept_total)).collect()
}

/// Thin charge-exchange foil: merges all incoming charge states, redistributes
/// the beam over the output charge states and applies energy loss and
/// straggling.
#[derive(Debug, Clone, PartialEq)]
pub struct Stripper {
    pub distribution: ChargeDistribution,
    /// Energy loss [eV/u].
    pub energy_loss: f64,
    /// RMS energy straggling [MeV/u].
    pub sigma_energy: f64,
    /// RMS angular straggling [rad].
    pub sigma_angle: f64,
    /// Q/A of the outgoing design particle; defaults to the most populated state.
    pub reference_charge: Option<f64>,
}

impl Stripper {
    /// Reads the output distribution and straggling from the element's own
    /// parameters. Only the species (`IonProton`, `IonMass`) may come from the
    /// lattice-wide values, which otherwise describe the incoming beam.
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let own = params.local_only();
        let distribution = match own.vector_opt("IonChargeStates")? {
            Some(charges) => {
                if charges.is_empty() || charges.iter().any(|z| *z == 0.0) {
                    return Err(own.invalid(
                        "IonChargeStates",
                        "need at least one non-zero charge-to-mass ratio",
                    ));
                }
                let weights = match own.vector_opt("NCharge")? {
                    Some(w) => w.to_vec(),
                    None => vec![1.0; charges.len()],
                };
                if weights.len() != charges.len() || weights.iter().any(|w| *w < 0.0) {
                    return Err(own.invalid(
                        "NCharge",
                        "expected one non-negative weight per charge state",
                    ));
                }
                if weights.iter().sum::<f64>() == 0.0 {
                    warn!(
                        element = own.element(),
                        "Stripper weights sum to zero; populating output states equally"
                    );
                }
                ChargeDistribution::Explicit(charges.iter().copied().zip(weights).collect())
            }
            None => {
                let proton = params.number("IonProton")?;
                if proton < 1.0 {
                    return Err(params.invalid("IonProton", "atomic number must be at least 1"));
                }
                let mass = params.number("IonMass")?;
                if mass <= 0.0 {
                    return Err(params.invalid("IonMass", "mass number must be positive"));
                }
                let cutoff = own.number_or("cutoff", 1e-3)?;
                if !(0.0..1.0).contains(&cutoff) {
                    return Err(own.invalid("cutoff", "fraction cutoff must lie in [0, 1)"));
                }
                ChargeDistribution::Baron {
                    proton,
                    mass,
                    cutoff,
                }
            }
        };

        let non_negative = |key: &str| -> Result<f64, ConfigError> {
            let value = own.number_or(key, 0.0)?;
            if value < 0.0 {
                Err(own.invalid(key, "must not be negative"))
            } else {
                Ok(value)
            }
        };

        let reference_charge = own.number_opt("ref_IonZ")?;
        if reference_charge == Some(0.0) {
            return Err(own.invalid("ref_IonZ", "design charge-to-mass ratio must be non-zero"));
        }

        Ok(Self {
            distribution,
            energy_loss: non_negative("Eloss")?,
            sigma_energy: non_negative("sigma_E")?,
            sigma_angle: non_negative("sigma_theta")?,
            reference_charge,
        })
    }

    /// Returns the outgoing design particle and charge states.
    pub fn strip(&self, state: &State) -> Result<(Particle, Vec<ChargeState>), ElementError> {
        let design_in = state.reference();
        let envelope = state.envelope();
        let total_weight: f64 = state.charge_states().iter().map(|cs| cs.weight).sum();

        let fractions = self.fractions_or_fail(design_in)?;
        let reference_charge = match self.reference_charge {
            Some(z) => z,
            None => fractions
                .iter()
                .copied()
                .fold((fractions[0].0, f64::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 { cur } else { best }
                })
                .0,
        };

        let design_out = Particle {
            ion_z: reference_charge,
            ion_ek: design_in.ion_ek - self.energy_loss,
            ..*design_in
        };
        if design_out.ion_ek <= 0.0 {
            return Err(ElementError::physics(format!(
                "energy loss of {} eV/u stops the beam",
                self.energy_loss
            )));
        }

        let mut moment1 = envelope.moment1;
        moment1[(PS_PX, PS_PX)] += sqr(self.sigma_angle);
        moment1[(PS_PY, PS_PY)] += sqr(self.sigma_angle);
        moment1[(PS_PS, PS_PS)] += sqr(self.sigma_energy);
        check_matrix(&moment1, "stripped covariance")?;
        check_vector(&envelope.moment0, "stripped centroid")?;

        debug!(
            incoming = state.ncharge(),
            outgoing = fractions.len(),
            ref_ion_z = reference_charge,
            "Charge stripping"
        );

        let charge_states = fractions
            .into_iter()
            .map(|(z, fraction)| {
                let real = Particle {
                    ion_z: z,
                    ion_ek: design_out.ion_ek + envelope.moment0[PS_PS] * MEV_TO_EV,
                    phis: design_out.phis + envelope.moment0[PS_S],
                    ..design_out
                };
                ChargeState::new(real, fraction * total_weight, envelope.moment0, moment1)
            })
            .collect();
        Ok((design_out, charge_states))
    }

    fn fractions_or_fail(&self, design_in: &Particle) -> Result<Vec<(f64, f64)>, ElementError> {
        let fractions = self.distribution.fractions(design_in);
        if fractions.is_empty() {
            return Err(ElementError::physics("stripper produced no charge states"));
        }
        Ok(fractions)
    }
}

impl ElementPhysics for Stripper {
    fn length(&self) -> f64 {
        0.0
    }

    fn transfer_matrix(&self, _ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(PhaseMatrix::identity())
    }
}
