//! Agent contract
//!
//! Every agent exposes one entry point, `handle`, and selects its branch by
//! message type. A type the agent does not know, or a payload it cannot read,
//! comes back as `AgentReply::Error` rather than as a Rust error.

use async_trait::async_trait;
use serde::Serialize;

use crate::contracts::{ClinicalAssessment, HealthReport, VitalsBatch, VitalsSnapshot};
use crate::message::Message;

/// Trait for message-handling agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier the agent registers under
    fn id(&self) -> &str;

    /// Handle one message and produce a reply
    async fn handle(&self, message: &Message) -> AgentReply;
}

/// Reply produced by an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentReply {
    /// Early-warning classification
    Health(HealthReport),
    /// Doctor-assistant assessment
    Clinical(ClinicalAssessment),
    /// Latest batch of named values
    Batch(VitalsBatch),
    /// Batch history, oldest first
    History(Vec<VitalsSnapshot>),
    /// Acknowledgement of a write
    Ack(Ack),
    /// Structured failure
    Error(ErrorReply),
}

impl AgentReply {
    pub fn is_error(&self) -> bool {
        matches!(self, AgentReply::Error(_))
    }

    /// Reply for a message type the agent does not handle
    pub fn unknown_message_type(message_type: &str) -> Self {
        AgentReply::Error(ErrorReply::unknown_message_type(message_type))
    }

    /// Reply for a payload the agent cannot interpret
    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        AgentReply::Error(ErrorReply::invalid_payload(detail))
    }
}

/// Acknowledgement body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: String,
    pub processed: usize,
}

impl Ack {
    pub fn success(processed: usize) -> Self {
        Self {
            status: "success".to_string(),
            processed,
        }
    }
}

/// Structured error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReply {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorReply {
    pub const UNKNOWN_MESSAGE_TYPE: &'static str = "Unknown message type";
    pub const INVALID_PAYLOAD: &'static str = "Invalid payload";

    pub fn unknown_message_type(message_type: &str) -> Self {
        Self {
            error: Self::UNKNOWN_MESSAGE_TYPE.to_string(),
            message_type: Some(message_type.to_string()),
            detail: None,
        }
    }

    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self {
            error: Self::INVALID_PAYLOAD.to_string(),
            message_type: None,
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_message_type_shape() {
        let reply = AgentReply::unknown_message_type("dance");
        assert!(reply.is_error());
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"error": "Unknown message type", "message_type": "dance"})
        );
    }

    #[test]
    fn test_batch_reply_serializes_as_map() {
        let mut batch = VitalsBatch::new();
        batch.insert("spo2".to_string(), Some(97.0));
        batch.insert("glucose".to_string(), None);

        let value = serde_json::to_value(AgentReply::Batch(batch)).unwrap();
        assert_eq!(value, json!({"glucose": null, "spo2": 97.0}));
    }

    #[test]
    fn test_ack_shape() {
        let value = serde_json::to_value(AgentReply::Ack(Ack::success(4))).unwrap();
        assert_eq!(value, json!({"status": "success", "processed": 4}));
    }
}
