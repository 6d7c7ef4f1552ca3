use crate::runtime::telemetry::Telemetry;
use crate::tracker::handlers::TrackerHandlers;
use crate::tracker::request::{request_fn, RequestFn};
use crate::tracker::state::TrackerState;
use anyhow::{bail, Context, Result};
use core::future::Future;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Construction parameters for a [`crate::RequestTracker`].
///
/// All instances must be constructed via [`TrackerConfig::builder`] or [`TrackerConfig::new`]
/// so invariants are validated before a tracker observes the values.
pub struct TrackerConfig<T, E> {
    id: String,
    requests: Vec<RequestFn<T, E>>,
    stalled_delay: Option<Duration>,
    handlers: TrackerHandlers,
    telemetry: Arc<Telemetry>,
}

pub struct TrackerConfigParams<T, E> {
    pub id: String,
    pub requests: Vec<RequestFn<T, E>>,
    pub stalled_delay: Option<Duration>,
    pub handlers: TrackerHandlers,
    pub telemetry: Option<Arc<Telemetry>>,
}

impl<T, E> TrackerConfig<T, E> {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> TrackerConfigBuilder<T, E> {
        TrackerConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// The id is kept exactly as given. A zero `stalled_delay` disables stall
    /// detection, same as `None`.
    pub fn new(params: TrackerConfigParams<T, E>) -> Result<Self> {
        let TrackerConfigParams {
            id,
            requests,
            stalled_delay,
            handlers,
            telemetry,
        } = params;

        let config = Self {
            id,
            requests,
            stalled_delay: stalled_delay.filter(|delay| !delay.is_zero()),
            handlers,
            telemetry: telemetry.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Identifier reported in every state snapshot.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request factories, in the order their results are reported.
    pub fn requests(&self) -> &[RequestFn<T, E>] {
        &self.requests
    }

    /// Delay after which a still-fetching run is reported as stalled.
    pub fn stalled_delay(&self) -> Option<Duration> {
        self.stalled_delay
    }

    pub fn handlers(&self) -> &TrackerHandlers {
        &self.handlers
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// State a tracker built from this configuration starts in.
    pub fn initial_state(&self) -> TrackerState {
        TrackerState::new(self.id.clone())
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            bail!("id cannot be empty");
        }

        if self.requests.is_empty() {
            bail!("at least one request is required");
        }

        Ok(())
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        Vec<RequestFn<T, E>>,
        Option<Duration>,
        TrackerHandlers,
        Arc<Telemetry>,
    ) {
        (
            self.id,
            self.requests,
            self.stalled_delay,
            self.handlers,
            self.telemetry,
        )
    }
}

impl<T, E> Clone for TrackerConfig<T, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            requests: self.requests.clone(),
            stalled_delay: self.stalled_delay,
            handlers: self.handlers.clone(),
            telemetry: Arc::clone(&self.telemetry),
        }
    }
}

impl<T, E> fmt::Debug for TrackerConfig<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("id", &self.id)
            .field("requests", &self.requests.len())
            .field("stalled_delay", &self.stalled_delay)
            .field("handlers", &self.handlers)
            .finish()
    }
}

pub struct TrackerConfigBuilder<T, E> {
    id: Option<String>,
    requests: Vec<RequestFn<T, E>>,
    stalled_delay: Option<Duration>,
    handlers: TrackerHandlers,
    telemetry: Option<Arc<Telemetry>>,
}

impl<T, E> Default for TrackerConfigBuilder<T, E> {
    fn default() -> Self {
        Self {
            id: None,
            requests: Vec::new(),
            stalled_delay: None,
            handlers: TrackerHandlers::default(),
            telemetry: None,
        }
    }
}

impl<T, E> TrackerConfigBuilder<T, E> {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends an async request factory.
    pub fn request<F, Fut>(mut self, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: 'static,
        E: 'static,
    {
        self.requests.push(request_fn(factory));
        self
    }

    /// Appends already-boxed request factories.
    pub fn requests(mut self, requests: impl IntoIterator<Item = RequestFn<T, E>>) -> Self {
        self.requests.extend(requests);
        self
    }

    pub fn stalled_delay(mut self, delay: Duration) -> Self {
        self.stalled_delay = Some(delay);
        self
    }

    pub fn handlers(mut self, handlers: TrackerHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn on_fetching(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_fetching(callback);
        self
    }

    pub fn on_stalled(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_stalled(callback);
        self
    }

    pub fn on_finished(mut self, callback: impl Fn(TrackerState) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_finished(callback);
        self
    }

    pub fn on_state_change(
        mut self,
        callback: impl Fn(TrackerState) + Send + Sync + 'static,
    ) -> Self {
        self.handlers = self.handlers.on_state_change(callback);
        self
    }

    /// Shares counters with other trackers instead of allocating fresh ones.
    pub fn telemetry(mut self, telemetry: Arc<Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build(self) -> Result<TrackerConfig<T, E>> {
        let params = TrackerConfigParams {
            id: self.id.context("id is required")?,
            requests: self.requests,
            stalled_delay: self.stalled_delay,
            handlers: self.handlers,
            telemetry: self.telemetry,
        };

        TrackerConfig::new(params)
    }
}
