//! `RequestTracker` construction and invocation.
//!
//! Every invocation walks the shared state record through
//! `fetching -> [stalled] -> finished`. Transitions and their notifications
//! are serialised by one lock so observers always see them in that order, and
//! a run's stall timer is cancelled before its finished transition is taken.

use super::handlers::TrackerHandlers;
use super::request::{Payload, RequestFn};
use super::stall::StallTimer;
use super::state::{Transition, TrackerState};
use crate::runtime::config::TrackerConfig;
use crate::runtime::telemetry::Telemetry;
use futures::future::try_join_all;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TRACING_TARGET: &str = "request_tracker";

/// Reusable wrapper that runs a fixed set of requests and reports their lifecycle.
///
/// Clones share the same state record, handlers, and counters.
pub struct RequestTracker<T, E> {
    inner: Arc<TrackerInner<T, E>>,
}

struct TrackerInner<T, E> {
    id: String,
    requests: Vec<RequestFn<T, E>>,
    stalled_delay: Option<Duration>,
    state: Mutex<TrackerState>,
    handlers: Mutex<TrackerHandlers>,
    transitions: Mutex<()>,
    telemetry: Arc<Telemetry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Succeeded,
    Failed,
    Dropped,
}

impl<T, E> RequestTracker<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new(config: TrackerConfig<T, E>) -> Self {
        let (id, requests, stalled_delay, handlers, telemetry) = config.into_parts();
        Self {
            inner: Arc::new(TrackerInner {
                state: Mutex::new(TrackerState::new(id.clone())),
                id,
                requests,
                stalled_delay,
                handlers: Mutex::new(handlers),
                transitions: Mutex::new(()),
                telemetry,
            }),
        }
    }

    /// Runs every request concurrently with the tracker's current handlers.
    pub async fn run(&self) -> Result<Payload<T>, E> {
        self.run_with(TrackerHandlers::default()).await
    }

    /// Replaces the handlers named in `overrides`, then runs every request.
    ///
    /// Overrides stay installed for later invocations. The result holds the
    /// single value when the tracker wraps one request, otherwise all values
    /// in request order. The first request failure is returned unchanged,
    /// after the finished transition has been reported.
    ///
    /// # Panics
    ///
    /// With a stall delay configured, the stall timer is spawned onto the
    /// current Tokio runtime, so this panics when polled outside one.
    pub async fn run_with(&self, overrides: TrackerHandlers) -> Result<Payload<T>, E> {
        if !overrides.is_empty() {
            lock(&self.inner.handlers).apply_overrides(overrides);
        }

        let mut run = RunGuard {
            inner: Arc::clone(&self.inner),
            timer: None,
            settled: false,
        };

        self.inner.begin();
        run.timer = self.inner.stalled_delay.map(|delay| {
            let inner = Arc::clone(&self.inner);
            StallTimer::arm(delay, move |token| inner.stall(token, delay))
        });

        let pending: Vec<_> = self.inner.requests.iter().map(|request| request()).collect();
        let result = try_join_all(pending).await;

        run.settle(if result.is_ok() {
            Settlement::Succeeded
        } else {
            Settlement::Failed
        });

        result.map(|values| Payload::from_values(values, self.inner.requests.len()))
    }
}

impl<T, E> RequestTracker<T, E> {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Snapshot of the current state record.
    pub fn state(&self) -> TrackerState {
        lock(&self.inner.state).clone()
    }

    pub fn stalled_delay(&self) -> Option<Duration> {
        self.inner.stalled_delay
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.len()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        Arc::clone(&self.inner.telemetry)
    }
}

impl<T, E> Clone for RequestTracker<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for RequestTracker<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTracker")
            .field("id", &self.inner.id)
            .field("requests", &self.inner.requests.len())
            .field("stalled_delay", &self.inner.stalled_delay)
            .field("state", &self.state())
            .finish()
    }
}

impl<T, E> TrackerInner<T, E> {
    fn begin(&self) {
        let _order = lock(&self.transitions);
        let snapshot = {
            let mut state = lock(&self.state);
            if state.is_fetching {
                tracing::debug!(
                    target: TRACING_TARGET,
                    id = %self.id,
                    times_run = state.times_run,
                    "request tracker already fetching; starting overlapping run"
                );
                return;
            }
            *state = state.fetching();
            state.clone()
        };

        self.telemetry.record_run();
        tracing::debug!(
            target: TRACING_TARGET,
            id = %self.id,
            times_run = snapshot.times_run,
            requests = self.requests.len(),
            "request tracker fetching"
        );
        self.notify(Transition::Fetching, snapshot);
    }

    fn stall(&self, timer: &CancellationToken, delay: Duration) {
        let _order = lock(&self.transitions);
        if timer.is_cancelled() {
            return;
        }

        let snapshot = {
            let mut state = lock(&self.state);
            if state.is_finished || !state.is_fetching || state.is_stalled {
                return;
            }
            *state = state.stalled();
            state.clone()
        };

        self.telemetry.record_stall();
        tracing::warn!(
            target: TRACING_TARGET,
            id = %self.id,
            times_run = snapshot.times_run,
            stalled_delay_ms = delay.as_millis() as u64,
            "request tracker stalled"
        );
        self.notify(Transition::Stalled, snapshot);
    }

    fn finish(&self, settlement: Settlement) {
        let _order = lock(&self.transitions);
        let snapshot = {
            let mut state = lock(&self.state);
            *state = state.finished();
            state.clone()
        };

        match settlement {
            Settlement::Succeeded => self.telemetry.record_success(),
            Settlement::Failed => self.telemetry.record_failure(),
            Settlement::Dropped => self.telemetry.record_dropped(),
        }
        tracing::debug!(
            target: TRACING_TARGET,
            id = %self.id,
            times_run = snapshot.times_run,
            settlement = ?settlement,
            "request tracker finished"
        );
        self.notify(Transition::Finished, snapshot);
    }

    fn notify(&self, transition: Transition, snapshot: TrackerState) {
        let callback = lock(&self.handlers).select(transition);
        if let Some(callback) = callback {
            callback(snapshot);
        }
    }
}

/// Owns one invocation's stall timer and guarantees the run settles exactly
/// once, even when the invocation future is dropped mid-flight.
struct RunGuard<T, E> {
    inner: Arc<TrackerInner<T, E>>,
    timer: Option<StallTimer>,
    settled: bool,
}

impl<T, E> RunGuard<T, E> {
    fn settle(&mut self, settlement: Settlement) {
        if self.settled {
            return;
        }
        self.settled = true;

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.inner.finish(settlement);
    }
}

impl<T, E> Drop for RunGuard<T, E> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(
                target: TRACING_TARGET,
                id = %self.inner.id,
                "request tracker invocation dropped before settling"
            );
            self.settle(Settlement::Dropped);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
