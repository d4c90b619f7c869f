//! MediBot core
//!
//! In-process agent messaging and rule-based vital-sign classification.
//!
//! # Components
//! - `Message`: envelope for one unit of inter-agent communication
//! - `MessageBus`: owned agent directory with direct awaited dispatch
//! - `Agent`: single-entry-point trait every agent implements
//! - `VitalsClassifier`: ordered threshold rules with two named presets

pub mod agent;
pub mod bus;
pub mod engine;
pub mod error;
pub mod message;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use agent::{Ack, Agent, AgentReply, ErrorReply};
pub use bus::MessageBus;
pub use contracts::*;
pub use engine::presets::{
    EarlyWarningThresholds, GradedThresholds, InvalidThreshold, RulePreset, ThresholdTable,
};
pub use engine::rules::{VitalBands, VitalRule};
pub use engine::VitalsClassifier;
pub use error::{BusError, Result};
pub use message::{message_types, Message, MessageRecord, DEFAULT_PRIORITY};
