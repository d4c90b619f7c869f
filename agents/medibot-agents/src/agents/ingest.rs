//! Ingest agent
//!
//! Keeps the most recent vitals batch plus a bounded history, fed either by
//! explicit `vitals_ingest` writes or by polling external sources.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use medibot_core::{
    message_types, Ack, Agent, AgentReply, Message, VitalsBatch, VitalsSnapshot,
};

use crate::poller::{into_batch, SourcePoller};
use crate::telemetry::MediBotMetrics;

/// Default number of batches kept in history
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Default)]
struct IngestCache {
    latest: VitalsBatch,
    history: VecDeque<VitalsSnapshot>,
}

/// Latest-batch cache with source polling
pub struct IngestAgent {
    poller: SourcePoller,
    cache: RwLock<IngestCache>,
    history_capacity: usize,
    metrics: Option<Arc<MediBotMetrics>>,
}

impl IngestAgent {
    pub const ID: &'static str = "ingest_agent";

    pub fn new(poller: SourcePoller) -> Self {
        Self {
            poller,
            cache: RwLock::new(IngestCache::default()),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            metrics: None,
        }
    }

    /// Keep at most `capacity` batches (at least one)
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MediBotMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Most recent batch, empty before the first write
    pub fn latest(&self) -> VitalsBatch {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .latest
            .clone()
    }

    /// Stored batches, oldest first
    pub fn history(&self) -> Vec<VitalsSnapshot> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .history
            .iter()
            .cloned()
            .collect()
    }

    /// Replace the latest batch and append it to history. Last writer wins.
    pub fn store(&self, batch: VitalsBatch) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.history.push_back(VitalsSnapshot::now(batch.clone()));
        while cache.history.len() > self.history_capacity {
            cache.history.pop_front();
        }
        cache.latest = batch;
    }

    /// Poll every source and cache the resulting batch
    pub async fn poll_sources(&self) -> VitalsBatch {
        let readings = self.poller.poll().await;

        for reading in &readings {
            if let Err(e) = &reading.outcome {
                tracing::warn!(
                    source = %reading.source,
                    error = %e,
                    kind = e.kind(),
                    latency_ms = reading.latency_ms,
                    "Vitals source poll failed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_source_failure(&reading.source);
                }
            }
        }

        let batch = into_batch(&readings);
        self.store(batch.clone());
        batch
    }

    fn ingest(&self, message: &Message) -> AgentReply {
        match serde_json::from_value::<VitalsBatch>(message.payload().clone()) {
            Ok(batch) => {
                let processed = batch.len();
                self.store(batch);
                AgentReply::Ack(Ack::success(processed))
            }
            Err(e) => AgentReply::invalid_payload(e.to_string()),
        }
    }
}

#[async_trait]
impl Agent for IngestAgent {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn handle(&self, message: &Message) -> AgentReply {
        match message.message_type() {
            message_types::GET_LATEST => AgentReply::Batch(self.latest()),
            message_types::GET_HISTORY => AgentReply::History(self.history()),
            message_types::VITALS_INGEST => self.ingest(message),
            message_types::POLL_SOURCES => AgentReply::Batch(self.poll_sources().await),
            other => AgentReply::unknown_message_type(other),
        }
    }
}

/// Poll on a fixed interval until the returned task is aborted
pub fn spawn_polling(agent: Arc<IngestAgent>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let batch = agent.poll_sources().await;
            tracing::debug!(sources = batch.len(), "Scheduled poll complete");
        }
    })
}
