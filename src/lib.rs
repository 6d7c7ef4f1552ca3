pub mod runtime;
pub mod tracker;

pub use runtime::config::{TrackerConfig, TrackerConfigBuilder, TrackerConfigParams};
pub use runtime::telemetry::{init_tracing, spawn_metrics_reporter, Telemetry, TelemetrySnapshot};
pub use tracker::{
    request_fn, HandlerKind, Payload, RequestFn, RequestFuture, RequestTracker, StateCallback,
    Transition, TrackerHandlers, TrackerState,
};
