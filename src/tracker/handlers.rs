//! Observer callbacks and the per-transition dispatch rule.

use super::state::{Transition, TrackerState};
use std::fmt;
use std::sync::Arc;

/// Observer invoked with an owned snapshot of the tracker state.
pub type StateCallback = Arc<dyn Fn(TrackerState) + Send + Sync>;

/// Names one of the four observer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Fetching,
    Stalled,
    Finished,
    StateChange,
}

/// Set of optional observers attached to a tracker.
///
/// Used both for the tracker's own handlers and for per-invocation overrides
/// passed to [`crate::RequestTracker::run_with`]. An override set replaces the
/// callbacks it carries and removes the ones named with [`Self::clear`].
#[derive(Clone, Default)]
pub struct TrackerHandlers {
    on_fetching: Option<StateCallback>,
    on_stalled: Option<StateCallback>,
    on_finished: Option<StateCallback>,
    on_state_change: Option<StateCallback>,
    cleared: Vec<HandlerKind>,
}

impl TrackerHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetching(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.on_fetching = Some(Arc::new(callback));
        self
    }

    pub fn on_stalled(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.on_stalled = Some(Arc::new(callback));
        self
    }

    pub fn on_finished(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.on_finished = Some(Arc::new(callback));
        self
    }

    pub fn on_state_change(
        mut self,
        callback: impl Fn(TrackerState) + Send + Sync + 'static,
    ) -> Self {
        self.on_state_change = Some(Arc::new(callback));
        self
    }

    /// Removes the callback in `kind`'s slot. When used as an override, the
    /// tracker's callback in that slot is removed too.
    pub fn clear(mut self, kind: HandlerKind) -> Self {
        *self.slot_mut(kind) = None;
        if !self.cleared.contains(&kind) {
            self.cleared.push(kind);
        }
        self
    }

    pub fn is_set(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Fetching => self.on_fetching.is_some(),
            HandlerKind::Stalled => self.on_stalled.is_some(),
            HandlerKind::Finished => self.on_finished.is_some(),
            HandlerKind::StateChange => self.on_state_change.is_some(),
        }
    }

    /// True when the set neither carries a callback nor clears one.
    pub fn is_empty(&self) -> bool {
        self.on_fetching.is_none()
            && self.on_stalled.is_none()
            && self.on_finished.is_none()
            && self.on_state_change.is_none()
            && self.cleared.is_empty()
    }

    /// Applies `overrides`: its cleared slots are emptied first, then every
    /// callback it carries replaces the current one. Other slots are untouched.
    pub fn apply_overrides(&mut self, overrides: TrackerHandlers) {
        let TrackerHandlers {
            on_fetching,
            on_stalled,
            on_finished,
            on_state_change,
            cleared,
        } = overrides;

        for kind in cleared {
            *self.slot_mut(kind) = None;
        }
        if on_fetching.is_some() {
            self.on_fetching = on_fetching;
        }
        if on_stalled.is_some() {
            self.on_stalled = on_stalled;
        }
        if on_finished.is_some() {
            self.on_finished = on_finished;
        }
        if on_state_change.is_some() {
            self.on_state_change = on_state_change;
        }
    }

    /// Picks the observer for `transition`: the specific callback when set,
    /// otherwise the catch-all `on_state_change`.
    pub fn select(&self, transition: Transition) -> Option<StateCallback> {
        let specific = match transition {
            Transition::Fetching => &self.on_fetching,
            Transition::Stalled => &self.on_stalled,
            Transition::Finished => &self.on_finished,
        };

        specific.as_ref().or(self.on_state_change.as_ref()).cloned()
    }

    fn slot_mut(&mut self, kind: HandlerKind) -> &mut Option<StateCallback> {
        match kind {
            HandlerKind::Fetching => &mut self.on_fetching,
            HandlerKind::Stalled => &mut self.on_stalled,
            HandlerKind::Finished => &mut self.on_finished,
            HandlerKind::StateChange => &mut self.on_state_change,
        }
    }
}

impl fmt::Debug for TrackerHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerHandlers")
            .field("on_fetching", &self.on_fetching.is_some())
            .field("on_stalled", &self.on_stalled.is_some())
            .field("on_finished", &self.on_finished.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .field("cleared", &self.cleared)
            .finish()
    }
}
