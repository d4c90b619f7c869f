//! Bundled agents
//!
//! - `HealthAgent` (`health_agent`): early-warning triage
//! - `DoctorAssistantAgent` (`doctor_assistant`): AI assessment with graded fallback
//! - `IngestAgent` (`ingest_agent`): latest-batch cache and source polling

pub mod doctor;
pub mod health;
pub mod ingest;

pub use doctor::DoctorAssistantAgent;
pub use health::HealthAgent;
pub use ingest::{spawn_polling, IngestAgent};

use std::sync::Arc;

use medibot_core::{MessageBus, RulePreset, VitalsClassifier};

use crate::client::OllamaAssessmentClient;
use crate::config::ServiceConfig;
use crate::poller::SourcePoller;
use crate::telemetry::MediBotMetrics;

/// The three agents built from one configuration
pub struct AgentSet {
    pub health: Arc<HealthAgent>,
    pub doctor: Arc<DoctorAssistantAgent>,
    pub ingest: Arc<IngestAgent>,
}

impl AgentSet {
    pub fn from_config(config: &ServiceConfig, metrics: Arc<MediBotMetrics>) -> Self {
        let thresholds = &config.thresholds;

        let health = HealthAgent::with_classifier(VitalsClassifier::from_preset(
            RulePreset::EarlyWarning,
            thresholds,
        ))
        .with_metrics(Arc::clone(&metrics));

        let service = Arc::new(OllamaAssessmentClient::from_config(&config.assessment));
        let doctor = DoctorAssistantAgent::with_fallback(
            service,
            VitalsClassifier::from_preset(RulePreset::GradedRisk, thresholds),
        )
        .with_metrics(Arc::clone(&metrics));

        let poller = SourcePoller::new(config.ingest.sources.clone())
            .with_timeout(config.ingest.timeout());
        let ingest = IngestAgent::new(poller)
            .with_history_capacity(config.ingest.history_capacity)
            .with_metrics(metrics);

        Self {
            health: Arc::new(health),
            doctor: Arc::new(doctor),
            ingest: Arc::new(ingest),
        }
    }

    /// Register every agent under its id
    pub fn register(&self, bus: &MessageBus) -> medibot_core::Result<()> {
        bus.register_agent(self.health.clone())?;
        bus.register_agent(self.doctor.clone())?;
        bus.register_agent(self.ingest.clone())?;
        Ok(())
    }
}
