use super::error::ElementError;
use super::physics::{ElementPhysics, TransferContext};
use crate::core::config::{ConfigError, ConfigValue, Params};
use crate::core::math::constants::MEV_TO_EV;
use crate::core::math::matrix::{from_row_major, origin};
use crate::core::math::{PS_1, PS_DIM, PS_PS, PS_S, PhaseMatrix, PhaseVector};
use crate::core::models::{ChargeState, Particle, State};

/// Builds a beam state from species and moment parameters.
///
/// Single-species beams read `IonZ`, optional `NCharge`, the centroid under
/// `vector_variable` (default `moment0`) and the covariance under
/// `matrix_variable` (default `initial`). Multi-charge beams list their Q/A
/// values in `IonChargeStates` and give per-state arrays with an index suffix.
pub fn initial_state(params: &Params) -> Result<State, ConfigError> {
    let ion_es = params.number("IonEs")?;
    if ion_es <= 0.0 {
        return Err(params.invalid("IonEs", "rest energy must be positive"));
    }
    let ion_ek = params.number("IonEk")?;
    if ion_ek < 0.0 {
        return Err(params.invalid("IonEk", "kinetic energy must not be negative"));
    }
    let ion_a = params.number_or("IonA", 1.0)?;
    let vector_key = params.text_opt("vector_variable")?.unwrap_or("moment0");
    let matrix_key = params.text_opt("matrix_variable")?.unwrap_or("initial");

    let species = charge_species(params)?;
    let ion_z = params.number_or("IonZ", species[0].0)?;
    check_charge(params, "IonZ", ion_z)?;

    let reference = Particle {
        ion_a,
        ..Particle::new(ion_es, ion_ek, ion_z)
    };

    let indexed = params.contains("IonChargeStates");
    let mut charge_states = Vec::with_capacity(species.len());
    for (i, (z, weight)) in species.into_iter().enumerate() {
        let (vkey, mkey) = if indexed {
            (format!("{vector_key}{i}"), format!("{matrix_key}{i}"))
        } else {
            (vector_key.to_string(), matrix_key.to_string())
        };
        let moment0 = read_centroid(params, &vkey, indexed)?;
        let moment1 = read_covariance(params, &mkey, indexed)?;
        let real = Particle {
            ion_z: z,
            ion_ek: reference.ion_ek + moment0[PS_PS] * MEV_TO_EV,
            phis: reference.phis + moment0[PS_S],
            ..reference
        };
        charge_states.push(ChargeState::new(real, weight, moment0, moment1));
    }

    State::new(reference, charge_states)
        .ok_or_else(|| params.invalid("IonChargeStates", "at least one charge state is required"))
}

fn charge_species(params: &Params) -> Result<Vec<(f64, f64)>, ConfigError> {
    let Some(charges) = params.vector_opt("IonChargeStates")? else {
        let ion_z = params.number("IonZ")?;
        return Ok(vec![(ion_z, params.number_or("NCharge", 1.0)?)]);
    };
    if charges.is_empty() {
        return Err(params.invalid("IonChargeStates", "at least one charge state is required"));
    }
    for z in charges {
        check_charge(params, "IonChargeStates", *z)?;
    }
    let weights = match params.get("NCharge") {
        None => vec![1.0; charges.len()],
        Some(ConfigValue::Number(w)) if charges.len() == 1 => vec![*w],
        Some(_) => params.vector("NCharge")?.to_vec(),
    };
    if weights.len() != charges.len() {
        return Err(params.invalid(
            "NCharge",
            format!("expected {} weights, got {}", charges.len(), weights.len()),
        ));
    }
    if weights.iter().any(|w| *w < 0.0) {
        return Err(params.invalid("NCharge", "weights must not be negative"));
    }
    Ok(charges.iter().copied().zip(weights).collect())
}

fn check_charge(params: &Params, key: &str, z: f64) -> Result<(), ConfigError> {
    if z == 0.0 {
        Err(params.invalid(key, "charge-to-mass ratio must be non-zero"))
    } else {
        Ok(())
    }
}

fn read_centroid(params: &Params, key: &str, required: bool) -> Result<PhaseVector, ConfigError> {
    let values = if required {
        Some(params.vector(key)?)
    } else {
        params.vector_opt(key)?
    };
    let Some(values) = values else {
        return Ok(origin());
    };
    if values.len() != PS_DIM && values.len() != PS_DIM - 1 {
        return Err(params.invalid(key, format!("expected 6 or 7 values, got {}", values.len())));
    }
    let mut v = origin();
    for (k, x) in values.iter().take(PS_1).enumerate() {
        v[k] = *x;
    }
    Ok(v)
}

fn read_covariance(params: &Params, key: &str, required: bool) -> Result<PhaseMatrix, ConfigError> {
    let values = if required {
        Some(params.vector(key)?)
    } else {
        params.vector_opt(key)?
    };
    match values {
        None => Ok(PhaseMatrix::identity()),
        Some(values) => from_row_major(values).ok_or_else(|| {
            params.invalid(key, format!("expected 36 or 49 values, got {}", values.len()))
        }),
    }
}

/// Resets the beam to the state described by its own parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub initial: State,
}

impl Source {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        Ok(Self {
            initial: initial_state(params)?,
        })
    }
}

impl ElementPhysics for Source {
    fn length(&self) -> f64 {
        0.0
    }

    fn transfer_matrix(&self, _ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(PhaseMatrix::identity())
    }
}
