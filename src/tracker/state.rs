use serde::{Deserialize, Serialize};

/// Lifecycle transition that produced a state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Fetching,
    Stalled,
    Finished,
}

/// Snapshot of a tracker's request state.
///
/// The tracker never mutates a published snapshot: every transition builds a
/// new record and observers receive their own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub id: String,
    pub is_stalled: bool,
    pub is_fetching: bool,
    pub is_finished: bool,
    pub times_run: u64,
}

impl TrackerState {
    /// Idle state for a freshly constructed tracker.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn fetching(&self) -> Self {
        Self {
            id: self.id.clone(),
            is_stalled: false,
            is_fetching: true,
            is_finished: false,
            times_run: self.times_run.saturating_add(1),
        }
    }

    pub(crate) fn stalled(&self) -> Self {
        Self {
            is_stalled: true,
            ..self.clone()
        }
    }

    pub(crate) fn finished(&self) -> Self {
        Self {
            is_stalled: false,
            is_fetching: false,
            is_finished: true,
            ..self.clone()
        }
    }
}
