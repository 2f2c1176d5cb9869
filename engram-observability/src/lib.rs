//! # engram-observability
//!
//! The passive sinks: a bounded in-process history of retrieval
//! telemetry for operator inspection, and tracing-subscriber setup.

pub mod telemetry_log;
pub mod tracing_setup;

pub use telemetry_log::TelemetryLog;
