//! Client for the external assessment service
//!
//! The service speaks the Ollama generate API. The model is asked for a JSON
//! object; anything short of a complete, well-typed object is an error, and
//! the caller decides how to recover.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use medibot_core::{
    AssessmentSource, AssessmentStatus, ClinicalAssessment, RiskLevel, VitalsReading,
};

use crate::config::AssessmentConfig;

/// Keys the model's JSON object must carry
pub const REQUIRED_FIELDS: [&str; 5] = [
    "overall_status",
    "risk_level",
    "medical_notes",
    "recommendations",
    "follow_up",
];

/// Assessment service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Assessment timed out after {0}ms")]
    Timeout(u64),

    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field in assessment: {0}")]
    MissingField(String),
}

impl AssessmentServiceError {
    /// Short label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            AssessmentServiceError::Network(_) => "network",
            AssessmentServiceError::Timeout(_) => "timeout",
            AssessmentServiceError::Status { .. } => "status",
            AssessmentServiceError::Parse(_) => "parse",
            AssessmentServiceError::MissingField(_) => "missing_field",
        }
    }
}

/// Source of AI-generated clinical assessments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentService: Send + Sync {
    async fn assess(
        &self,
        reading: &VitalsReading,
    ) -> Result<ClinicalAssessment, AssessmentServiceError>;
}

/// Ollama-compatible assessment client
#[derive(Debug, Clone)]
pub struct OllamaAssessmentClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaAssessmentClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AssessmentConfig) -> Self {
        Self::new(&config.base_url, &config.model).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: String) -> Result<String, AssessmentServiceError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssessmentServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| match self.transport_error(e) {
                AssessmentServiceError::Network(msg) => AssessmentServiceError::Parse(msg),
                other => other,
            })?;

        Ok(body.response)
    }

    fn transport_error(&self, e: reqwest::Error) -> AssessmentServiceError {
        if e.is_timeout() {
            AssessmentServiceError::Timeout(self.timeout.as_millis() as u64)
        } else {
            AssessmentServiceError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl AssessmentService for OllamaAssessmentClient {
    async fn assess(
        &self,
        reading: &VitalsReading,
    ) -> Result<ClinicalAssessment, AssessmentServiceError> {
        let raw = self.generate(build_prompt(reading)).await?;
        parse_assessment(&raw)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ModelAssessment {
    overall_status: AssessmentStatus,
    risk_level: RiskLevel,
    medical_notes: Vec<String>,
    recommendations: Vec<String>,
    follow_up: Vec<String>,
}

/// Prompt asking the model for a structured assessment of the dashboard vitals
pub fn build_prompt(reading: &VitalsReading) -> String {
    let show = |value: Option<f64>| value.map_or_else(|| "not recorded".to_string(), |v| v.to_string());

    format!(
        r#"You are MediBot AI, a specialized medical assistant. ONLY respond to medical and health questions.

Analyze these vital signs and provide a structured medical assessment:

Vital Signs:
- Heart Rate: {} bpm
- Blood Pressure: {} mmHg (systolic)
- SpO2: {}%
- Glucose: {} mg/dL

Provide analysis in this exact JSON format:
{{
  "overall_status": "stable/concerning/critical",
  "risk_level": "low/medium/high",
  "medical_notes": ["list of clinical observations"],
  "recommendations": ["list of medical recommendations"],
  "follow_up": ["list of follow-up actions"]
}}

Be concise and medically accurate. Focus on actionable insights."#,
        show(reading.pulse),
        show(reading.bp_sys),
        show(reading.spo2),
        show(reading.glucose),
    )
}

/// Parse the model's `response` text into a clinical assessment
pub fn parse_assessment(raw: &str) -> Result<ClinicalAssessment, AssessmentServiceError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AssessmentServiceError::Parse(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| AssessmentServiceError::Parse("response is not a JSON object".to_string()))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|key| !object.contains_key(**key)) {
        return Err(AssessmentServiceError::MissingField(missing.to_string()));
    }

    let parsed: ModelAssessment =
        serde_json::from_value(value).map_err(|e| AssessmentServiceError::Parse(e.to_string()))?;

    Ok(ClinicalAssessment {
        overall_status: parsed.overall_status,
        risk_level: parsed.risk_level,
        medical_notes: parsed.medical_notes,
        recommendations: parsed.recommendations,
        follow_up: parsed.follow_up,
        source: AssessmentSource::Ai,
    })
}
