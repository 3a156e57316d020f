pub mod info;
pub mod run;
pub mod scan;

use crate::error::Result;
use crate::overrides::parse_overrides;
use flamepp::core::config::LatticeConfig;
use flamepp::core::models::State;
use flamepp::engine::Machine;
use std::path::Path;
use tracing::info;

/// Loads the lattice at `path` and builds its machine.
fn load_machine(path: &Path) -> Result<Machine> {
    info!("Loading lattice from {:?}", path);
    let config = LatticeConfig::load(path)?;
    let machine = Machine::new(config)?;
    info!(
        elements = machine.len(),
        length = machine.total_length(),
        "Lattice loaded."
    );
    Ok(machine)
}

/// Allocates the initial state with `--set` overrides applied.
fn initial_state(machine: &Machine, set_values: &[String]) -> Result<State> {
    let overrides = parse_overrides(set_values)?;
    if !overrides.is_empty() {
        info!("Applying {} beam parameter override(s).", overrides.len());
    }
    Ok(machine.alloc_state(&overrides)?)
}
