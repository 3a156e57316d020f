use crate::core::config::{ConfigValue, ParamMap};
use crate::core::models::State;
use crate::engine::error::EngineError;
use crate::engine::machine::Machine;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Final state for one value of a scanned parameter.
#[derive(Debug, Clone)]
pub struct ScanPoint {
    pub value: ConfigValue,
    pub state: State,
}

/// Propagates every state through the whole lattice, independently.
#[instrument(skip_all, name = "batch_propagation", fields(beams = states.len()))]
pub fn propagate_batch(machine: &Machine, states: &mut [State]) -> Result<(), EngineError> {
    info!("Propagating {} beam(s) through {} element(s).", states.len(), machine.len());

    #[cfg(not(feature = "parallel"))]
    let iterator = states.iter_mut();

    #[cfg(feature = "parallel")]
    let iterator = states.par_iter_mut();

    iterator.try_for_each(|state| {
        machine
            .propagate(state, 0, machine.len(), None)
            .map(|_| ())
    })
}

/// For every value, reconfigures a copy of `machine` with `key = value` on element
/// `index` and propagates a copy of `initial` through the whole lattice.
#[instrument(skip_all, name = "parameter_scan", fields(index = index, key = %key))]
pub fn parameter_scan(
    machine: &Machine,
    index: usize,
    key: &str,
    values: &[ConfigValue],
    initial: &State,
) -> Result<Vec<ScanPoint>, EngineError> {
    info!(points = values.len(), "Starting parameter scan.");

    #[cfg(not(feature = "parallel"))]
    let iterator = values.iter();

    #[cfg(feature = "parallel")]
    let iterator = values.par_iter();

    let points = iterator
        .map(|value| {
            let mut local = machine.clone();
            let mut overrides = ParamMap::new();
            overrides.insert(key.to_string(), value.clone());
            local.reconfigure(index, &overrides)?;

            let mut state = initial.clone();
            local.propagate(&mut state, 0, local.len(), None)?;
            debug!(?value, pos = state.pos(), "Scan point complete");
            Ok(ScanPoint {
                value: value.clone(),
                state,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    info!("Parameter scan complete.");
    Ok(points)
}
