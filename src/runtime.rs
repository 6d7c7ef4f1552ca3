//! Runtime glue: validated tracker configuration plus tracing and telemetry.

pub mod config;
pub mod telemetry;
