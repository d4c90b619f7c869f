//! Doctor-assistant agent
//!
//! Asks the assessment service first and falls back to the local graded-risk
//! rules on any failure, so `analyze_vitals` always yields a clinical view.

use async_trait::async_trait;
use std::sync::Arc;

use medibot_core::{
    message_types, Agent, AgentReply, AssessmentSource, ClinicalAssessment, Message,
    VitalsClassifier, VitalsReading,
};

use crate::client::AssessmentService;
use crate::telemetry::MediBotMetrics;

/// AI-backed assessment with a rule-based safety net
pub struct DoctorAssistantAgent {
    service: Arc<dyn AssessmentService>,
    fallback: VitalsClassifier,
    metrics: Option<Arc<MediBotMetrics>>,
}

impl DoctorAssistantAgent {
    pub const ID: &'static str = "doctor_assistant";

    pub fn new(service: Arc<dyn AssessmentService>) -> Self {
        Self::with_fallback(service, VitalsClassifier::graded_risk())
    }

    pub fn with_fallback(service: Arc<dyn AssessmentService>, fallback: VitalsClassifier) -> Self {
        Self {
            service,
            fallback,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MediBotMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Assess a reading; never fails
    pub async fn assess(&self, reading: &VitalsReading) -> ClinicalAssessment {
        let assessment = match self.service.assess(reading).await {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    reason = e.reason(),
                    "Assessment service failed, using local rules"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_fallback(e.reason());
                }
                self.fallback
                    .classify(reading)
                    .to_clinical(AssessmentSource::Fallback)
            }
        };

        if let Some(metrics) = &self.metrics {
            let preset = match assessment.source {
                AssessmentSource::Ai => "ai",
                AssessmentSource::Fallback => self.fallback.preset().name(),
            };
            metrics.record_assessment(preset, &assessment.overall_status.to_string());
        }

        assessment
    }
}

#[async_trait]
impl Agent for DoctorAssistantAgent {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn handle(&self, message: &Message) -> AgentReply {
        match message.message_type() {
            message_types::ANALYZE_VITALS => match VitalsReading::from_json(message.payload()) {
                Ok(reading) => AgentReply::Clinical(self.assess(&reading).await),
                Err(e) => AgentReply::invalid_payload(e.to_string()),
            },
            other => AgentReply::unknown_message_type(other),
        }
    }
}
