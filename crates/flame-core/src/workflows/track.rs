use crate::core::models::State;
use crate::engine::error::EngineError;
use crate::engine::machine::Machine;
use crate::engine::observer::{HistoryRecorder, Snapshot};
use tracing::{info, instrument};

/// Beam history along a lattice.
#[derive(Debug, Clone)]
pub struct TrackResult {
    /// State before the first element.
    pub initial: State,
    /// State after each applied element, in order.
    pub snapshots: Vec<Snapshot>,
}

impl TrackResult {
    /// State after the last applied element.
    pub fn final_state(&self) -> &State {
        self.snapshots
            .last()
            .map(|s| &s.state)
            .unwrap_or(&self.initial)
    }
}

/// Propagates a copy of `initial` through `[start, start + max)` recording the
/// state after every element.
#[instrument(skip_all, name = "track_workflow", fields(start = start, max = max))]
pub fn run(
    machine: &Machine,
    initial: &State,
    start: usize,
    max: usize,
) -> Result<TrackResult, EngineError> {
    let names = machine
        .elements()
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    let mut recorder = HistoryRecorder::new(names);
    let mut state = initial.clone();

    let applied = machine.propagate(&mut state, start, max, Some(&mut recorder))?;
    info!(applied, pos = state.pos(), "Tracking complete.");

    Ok(TrackResult {
        initial: initial.clone(),
        snapshots: recorder.into_snapshots(),
    })
}
