//! Error types for message dispatch
//!
//! Only bus-level failures are errors. Agents report unknown message types
//! and bad payloads as structured replies, and the classifier cannot fail.

use thiserror::Error;

/// Errors raised by the message bus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// No agent is registered under the receiver id
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    /// An agent is already registered under this id
    #[error("Agent already registered: {0}")]
    AgentAlreadyRegistered(String),

    /// The agent directory lock was poisoned by a panicking writer
    #[error("Agent directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl BusError {
    /// Whether the caller addressed something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, BusError::RecipientNotFound(_))
    }
}

/// Result type alias for bus operations
pub type Result<T> = std::result::Result<T, BusError>;
