use crate::core::models::State;

/// Receives the beam state after each element during propagation.
pub trait Observer {
    fn observe(&mut self, index: usize, state: &State);
}

impl<F> Observer for F
where
    F: FnMut(usize, &State),
{
    fn observe(&mut self, index: usize, state: &State) {
        self(index, state)
    }
}

/// Beam state recorded after one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub index: usize,
    pub name: String,
    pub state: State,
}

/// Observer storing a full copy of the state after every element.
#[derive(Debug, Clone, Default)]
pub struct HistoryRecorder {
    names: Vec<String>,
    snapshots: Vec<Snapshot>,
}

impl HistoryRecorder {
    /// `names` maps element indices to the names stored in each snapshot.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            snapshots: Vec::new(),
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl Observer for HistoryRecorder {
    fn observe(&mut self, index: usize, state: &State) {
        let name = self.names.get(index).cloned().unwrap_or_default();
        self.snapshots.push(Snapshot {
            index,
            name,
            state: state.clone(),
        });
    }
}
