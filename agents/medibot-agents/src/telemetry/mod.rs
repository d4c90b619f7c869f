//! Telemetry for MediBot agents
//!
//! Structured logs go through `tracing`; this module holds the Prometheus
//! side:
//! - `metrics` - dispatch, assessment, fallback and source-poll counters

pub mod metrics;

pub use metrics::{DispatchTimer, MediBotMetrics, MetricsRegistry};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
