//! External vitals source polling
//!
//! Each source is a URL answering `GET` with `{"value": <number>}`. Sources
//! are polled concurrently, each under its own budget. A failing source never
//! aborts the batch; it simply has no value.

use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use medibot_core::VitalsBatch;

/// Default per-source budget
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Reasons a single source produced no value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourcePollError {
    #[error("Source timed out after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Source returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response has no numeric \"value\"")]
    MissingValue,
}

impl SourcePollError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SourcePollError::Timeout(_) => "timeout",
            SourcePollError::Network(_) => "network",
            SourcePollError::Status(_) => "status",
            SourcePollError::Parse(_) => "parse",
            SourcePollError::MissingValue => "missing_value",
        }
    }
}

/// Outcome for one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReading {
    pub source: String,
    pub outcome: Result<f64, SourcePollError>,
    pub latency_ms: u64,
}

/// Concurrent poller over a fixed set of named sources
#[derive(Debug, Clone)]
pub struct SourcePoller {
    sources: BTreeMap<String, String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl SourcePoller {
    pub fn new(sources: BTreeMap<String, String>) -> Self {
        Self {
            sources,
            client: reqwest::Client::new(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Poll every source concurrently, in source-name order
    pub async fn poll(&self) -> Vec<SourceReading> {
        let futures: Vec<_> = self
            .sources
            .iter()
            .map(|(name, url)| self.poll_source(name, url))
            .collect();

        join_all(futures).await
    }

    async fn poll_source(&self, name: &str, url: &str) -> SourceReading {
        let start = Instant::now();
        let budget_ms = self.timeout.as_millis() as u64;

        let outcome = match tokio::time::timeout(self.timeout, self.fetch(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SourcePollError::Timeout(budget_ms)),
        };

        SourceReading {
            source: name.to_string(),
            outcome,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn fetch(&self, url: &str) -> Result<f64, SourcePollError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourcePollError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    SourcePollError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourcePollError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourcePollError::Parse(e.to_string()))?;

        extract_value(&body)
    }
}

/// Pull the numeric `value` out of a source response
pub fn extract_value(body: &Value) -> Result<f64, SourcePollError> {
    body.get("value")
        .and_then(Value::as_f64)
        .ok_or(SourcePollError::MissingValue)
}

/// Collapse readings into a batch, `None` for every failed source
pub fn into_batch(readings: &[SourceReading]) -> VitalsBatch {
    readings
        .iter()
        .map(|r| (r.source.clone(), r.outcome.as_ref().ok().copied()))
        .collect()
}
