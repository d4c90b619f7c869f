//! Message envelope for inter-agent communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default (low) message priority
pub const DEFAULT_PRIORITY: i32 = 1;

/// Message types understood by the bundled agents
pub mod message_types {
    /// Health agent: classify a reading with the early-warning preset
    pub const VITALS_UPDATE: &str = "vitals_update";
    /// Doctor assistant: AI-backed assessment with local fallback
    pub const ANALYZE_VITALS: &str = "analyze_vitals";
    /// Ingest agent: return the cached batch
    pub const GET_LATEST: &str = "get_latest";
    /// Ingest agent: return the bounded batch history
    pub const GET_HISTORY: &str = "get_history";
    /// Ingest agent: store the payload as the latest batch
    pub const VITALS_INGEST: &str = "vitals_ingest";
    /// Ingest agent: poll every configured source now
    pub const POLL_SOURCES: &str = "poll_sources";
}

/// One request unit passed to an agent.
///
/// Fields are fixed at construction; the builder methods consume the
/// envelope and return a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    message_id: Uuid,
    conversation_id: Uuid,
    sender: String,
    receiver: String,
    message_type: String,
    payload: Value,
    priority: i32,
    timestamp: DateTime<Utc>,
    processed: bool,
}

impl Message {
    /// Create a message with fresh ids, the current UTC time and default priority
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type: message_type.into(),
            payload,
            priority: DEFAULT_PRIORITY,
            timestamp: Utc::now(),
            processed: false,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Join an existing conversation
    pub fn with_conversation_id(mut self, conversation_id: Uuid) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    /// Copy flagged as consumed. Informational only.
    pub fn mark_processed(mut self) -> Self {
        self.processed = true;
        self
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Flat record for logging and transport, timestamp in RFC 3339
    pub fn to_record(&self) -> MessageRecord {
        MessageRecord {
            message_id: self.message_id.to_string(),
            conversation_id: self.conversation_id.to_string(),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            message_type: self.message_type.clone(),
            payload: self.payload.clone(),
            priority: self.priority,
            timestamp: self.timestamp.to_rfc3339(),
            processed: self.processed,
        }
    }
}

/// Serializable key-value form of a `Message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: String,
    pub conversation_id: String,
    pub sender: String,
    pub receiver: String,
    pub message_type: String,
    pub payload: Value,
    pub priority: i32,
    pub timestamp: String,
    pub processed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message_defaults() {
        let msg = Message::new("api", "health_agent", message_types::VITALS_UPDATE, json!({}));

        assert_eq!(msg.sender(), "api");
        assert_eq!(msg.receiver(), "health_agent");
        assert_eq!(msg.message_type(), "vitals_update");
        assert_eq!(msg.priority(), DEFAULT_PRIORITY);
        assert!(!msg.is_processed());
        assert_ne!(msg.message_id(), msg.conversation_id());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::new("a", "b", "t", Value::Null);
        let b = Message::new("a", "b", "t", Value::Null);
        assert_ne!(a.message_id(), b.message_id());
    }

    #[test]
    fn test_record_timestamp_is_iso8601() {
        let msg = Message::new("api", "ingest_agent", "get_latest", Value::Null).with_priority(5);
        let record = msg.to_record();

        let parsed = chrono::DateTime::parse_from_rfc3339(&record.timestamp).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), msg.timestamp());
        assert_eq!(record.priority, 5);
        assert_eq!(record.message_id, msg.message_id().to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["receiver"], "ingest_agent");
        assert_eq!(json["processed"], false);
    }
}
