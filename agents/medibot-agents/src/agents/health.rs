//! Health agent: early-warning triage of a single reading

use async_trait::async_trait;
use std::sync::Arc;

use medibot_core::{
    message_types, Agent, AgentReply, Message, VitalsClassifier, VitalsReading,
};

use crate::telemetry::MediBotMetrics;

/// Classifies `vitals_update` payloads with the early-warning preset
pub struct HealthAgent {
    classifier: VitalsClassifier,
    metrics: Option<Arc<MediBotMetrics>>,
}

impl HealthAgent {
    pub const ID: &'static str = "health_agent";

    pub fn new() -> Self {
        Self::with_classifier(VitalsClassifier::early_warning())
    }

    pub fn with_classifier(classifier: VitalsClassifier) -> Self {
        Self {
            classifier,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MediBotMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn analyze(&self, message: &Message) -> AgentReply {
        let reading = match VitalsReading::from_json(message.payload()) {
            Ok(reading) => reading,
            Err(e) => return AgentReply::invalid_payload(e.to_string()),
        };

        let assessment = self.classifier.classify(&reading);
        if let Some(metrics) = &self.metrics {
            metrics.record_assessment(&assessment.preset, &assessment.status.to_string());
        }
        if assessment.is_critical() {
            tracing::info!(
                message_id = %message.message_id(),
                warnings = assessment.findings.len(),
                "Early-warning escalation"
            );
        }

        AgentReply::Health(assessment.health_report())
    }
}

impl Default for HealthAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for HealthAgent {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn handle(&self, message: &Message) -> AgentReply {
        match message.message_type() {
            message_types::VITALS_UPDATE => self.analyze(message),
            other => AgentReply::unknown_message_type(other),
        }
    }
}
