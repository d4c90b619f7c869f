//! Prometheus metrics for MediBot agents
//!
//! - `messages_dispatched_total` (counter) - bus dispatches by receiver, type, result
//! - `dispatch_duration_seconds` (histogram) - time spent inside the receiver's handler
//! - `assessments_total` (counter) - assessments by preset and status
//! - `assessment_fallbacks_total` (counter) - AI failures recovered locally, by reason
//! - `source_poll_failures_total` (counter) - vitals sources that yielded null
//!
//! # Example
//!
//! ```rust,no_run
//! use medibot_agents::telemetry::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().unwrap();
//! let metrics = registry.metrics();
//!
//! metrics.record_dispatch("health_agent", "vitals_update", "ok");
//! metrics.record_assessment("early_warning", "normal");
//! metrics.record_fallback("timeout");
//! ```

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "medibot";

/// Agent and bus metrics
pub struct MediBotMetrics {
    dispatched_total: CounterVec,
    dispatch_duration_seconds: HistogramVec,
    assessments_total: CounterVec,
    fallbacks_total: CounterVec,
    source_poll_failures_total: CounterVec,
}

impl MediBotMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let dispatched_total = CounterVec::new(
            Opts::new(
                "messages_dispatched_total",
                "Total number of messages dispatched through the bus",
            )
            .namespace(NAMESPACE),
            &["receiver", "message_type", "result"],
        )?;

        let dispatch_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_duration_seconds",
                "Time spent handling a dispatched message",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 30.0]),
            &["receiver"],
        )?;

        let assessments_total = CounterVec::new(
            Opts::new("assessments_total", "Total number of vitals assessments")
                .namespace(NAMESPACE),
            &["preset", "status"],
        )?;

        let fallbacks_total = CounterVec::new(
            Opts::new(
                "assessment_fallbacks_total",
                "Assessment service failures recovered by the local rules",
            )
            .namespace(NAMESPACE),
            &["reason"],
        )?;

        let source_poll_failures_total = CounterVec::new(
            Opts::new(
                "source_poll_failures_total",
                "Vitals source polls that produced no value",
            )
            .namespace(NAMESPACE),
            &["source"],
        )?;

        registry.register(Box::new(dispatched_total.clone()))?;
        registry.register(Box::new(dispatch_duration_seconds.clone()))?;
        registry.register(Box::new(assessments_total.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(source_poll_failures_total.clone()))?;

        Ok(Self {
            dispatched_total,
            dispatch_duration_seconds,
            assessments_total,
            fallbacks_total,
            source_poll_failures_total,
        })
    }

    /// Record one dispatch outcome (`ok`, `error_reply` or `not_found`)
    pub fn record_dispatch(&self, receiver: &str, message_type: &str, result: &str) {
        self.dispatched_total
            .with_label_values(&[receiver, message_type, result])
            .inc();
    }

    pub fn observe_dispatch_duration(&self, receiver: &str, duration_secs: f64) {
        self.dispatch_duration_seconds
            .with_label_values(&[receiver])
            .observe(duration_secs);
    }

    pub fn record_assessment(&self, preset: &str, status: &str) {
        self.assessments_total
            .with_label_values(&[preset, status])
            .inc();
    }

    pub fn record_fallback(&self, reason: &str) {
        self.fallbacks_total.with_label_values(&[reason]).inc();
    }

    pub fn record_source_failure(&self, source: &str) {
        self.source_poll_failures_total
            .with_label_values(&[source])
            .inc();
    }

    /// Start timing a dispatch; the duration is observed when the guard drops
    pub fn start_dispatch(&self, receiver: &str) -> DispatchTimer<'_> {
        DispatchTimer {
            start: Instant::now(),
            receiver: receiver.to_string(),
            metrics: self,
        }
    }

    #[cfg(test)]
    pub(crate) fn dispatched(&self, receiver: &str, message_type: &str, result: &str) -> f64 {
        self.dispatched_total
            .with_label_values(&[receiver, message_type, result])
            .get()
    }

    #[cfg(test)]
    pub(crate) fn fallbacks(&self, reason: &str) -> f64 {
        self.fallbacks_total.with_label_values(&[reason]).get()
    }
}

/// RAII guard for timing dispatches
pub struct DispatchTimer<'a> {
    start: Instant,
    receiver: String,
    metrics: &'a MediBotMetrics,
}

impl<'a> DispatchTimer<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl<'a> Drop for DispatchTimer<'a> {
    fn drop(&mut self) {
        self.metrics
            .observe_dispatch_duration(&self.receiver, self.elapsed_secs());
    }
}

/// Owns the Prometheus registry and the MediBot metrics in it
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    metrics: Arc<MediBotMetrics>,
}

impl MetricsRegistry {
    /// Create a registry with fresh metrics
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Register the metrics in an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let metrics = Arc::new(MediBotMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    /// Shared handle for agents and handlers
    pub fn metrics(&self) -> Arc<MediBotMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Encode every metric family in the text exposition format
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_counters() {
        let registry = MetricsRegistry::new().unwrap();
        let metrics = registry.metrics();

        metrics.record_dispatch("health_agent", "vitals_update", "ok");
        metrics.record_dispatch("health_agent", "vitals_update", "ok");
        metrics.record_dispatch("nobody", "ping", "not_found");

        assert_eq!(metrics.dispatched("health_agent", "vitals_update", "ok"), 2.0);
        assert_eq!(metrics.dispatched("nobody", "ping", "not_found"), 1.0);
    }

    #[test]
    fn test_timer_observes_on_drop() {
        let registry = MetricsRegistry::new().unwrap();
        let metrics = registry.metrics();
        {
            let _timer = metrics.start_dispatch("ingest_agent");
        }

        let text = registry.encode_text().unwrap();
        assert!(text.contains("medibot_dispatch_duration_seconds_count{receiver=\"ingest_agent\"} 1"));
    }

    #[test]
    fn test_encode_text_includes_namespace() {
        let registry = MetricsRegistry::new().unwrap();
        registry.metrics().record_fallback("timeout");
        registry.metrics().record_assessment("graded_risk", "stable");
        registry.metrics().record_source_failure("spo2");

        let text = registry.encode_text().unwrap();
        assert!(text.contains("medibot_assessment_fallbacks_total{reason=\"timeout\"} 1"));
        assert!(text.contains("medibot_assessments_total"));
        assert!(text.contains("medibot_source_poll_failures_total{source=\"spo2\"} 1"));
        assert_eq!(registry.metrics().fallbacks("timeout"), 1.0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Arc::new(Registry::new());
        assert!(MetricsRegistry::with_registry(Arc::clone(&registry)).is_ok());
        assert!(MetricsRegistry::with_registry(registry).is_err());
    }
}
