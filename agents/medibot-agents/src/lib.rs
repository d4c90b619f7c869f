//! MediBot agents
//!
//! The health, doctor-assistant and ingest agents, the clients they call out
//! to, and the HTTP service that exposes them.
//!
//! # Design Principles
//! - Owned wiring: the bus, agents and cache live in `AppState`, no globals
//! - Degrade, don't fail: AI and source failures are recovered and logged
//! - One dispatch path: HTTP routes go through the message bus

pub mod agents;
pub mod cli;
pub mod client;
pub mod config;
pub mod handler;
pub mod poller;
pub mod telemetry;

pub use agents::{AgentSet, DoctorAssistantAgent, HealthAgent, IngestAgent};
pub use client::{AssessmentService, AssessmentServiceError, OllamaAssessmentClient};
pub use config::{ConfigError, ServiceConfig};
pub use handler::{create_router, AppState};
pub use poller::{SourcePollError, SourcePoller};
