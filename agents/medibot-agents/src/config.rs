//! Service configuration
//!
//! Defaults, then an optional JSON/YAML/TOML file, then environment
//! variables. `validate` runs after every layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use medibot_core::ThresholdTable;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// External assessment service (Ollama-compatible generate API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl AssessmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Vitals ingest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Source name to URL; each URL answers `{"value": <number>}`
    pub sources: BTreeMap<String, String>,
    /// Per-source budget
    pub timeout_ms: u64,
    /// Batches kept in history
    pub history_capacity: usize,
    /// Poll every source on this interval when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sources: BTreeMap::new(),
            timeout_ms: 2_000,
            history_capacity: 50,
            poll_interval_secs: None,
        }
    }
}

impl IngestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub assessment: AssessmentConfig,
    pub ingest: IngestConfig,
    pub thresholds: ThresholdTable,
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load a file, picking the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let config: Self = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        config.validate()?;
        Ok(config)
    }

    /// File (when given) then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `MEDIBOT_HOST`, `PORT`, `ASSESSMENT_*` and `INGEST_*` overrides
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("MEDIBOT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(url) = lookup("ASSESSMENT_BASE_URL") {
            self.assessment.base_url = url;
        }
        if let Some(model) = lookup("ASSESSMENT_MODEL") {
            self.assessment.model = model;
        }
        if let Some(ms) = lookup("ASSESSMENT_TIMEOUT_MS") {
            self.assessment.timeout_ms = parse_var("ASSESSMENT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("INGEST_TIMEOUT_MS") {
            self.ingest.timeout_ms = parse_var("INGEST_TIMEOUT_MS", &ms)?;
        }
        if let Some(capacity) = lookup("INGEST_HISTORY_CAPACITY") {
            self.ingest.history_capacity = parse_var("INGEST_HISTORY_CAPACITY", &capacity)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assessment.timeout_ms == 0 {
            return Err(ConfigError::invalid("assessment.timeout_ms", "must be positive"));
        }
        if self.ingest.timeout_ms == 0 {
            return Err(ConfigError::invalid("ingest.timeout_ms", "must be positive"));
        }
        if self.ingest.history_capacity == 0 {
            return Err(ConfigError::invalid("ingest.history_capacity", "must be positive"));
        }
        if self.ingest.poll_interval_secs == Some(0) {
            return Err(ConfigError::invalid("ingest.poll_interval_secs", "must be positive"));
        }
        for (name, url) in &self.ingest.sources {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(
                    format!("ingest.sources.{}", name),
                    format!("not an http(s) URL: {}", url),
                ));
            }
        }
        self.thresholds
            .validate()
            .map_err(|e| ConfigError::invalid("thresholds", e.to_string()))
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

/// Builder for ServiceConfig
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn assessment_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.assessment.base_url = base_url.into();
        self
    }

    pub fn assessment_model(mut self, model: impl Into<String>) -> Self {
        self.config.assessment.model = model.into();
        self
    }

    pub fn assessment_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.assessment.timeout_ms = timeout_ms;
        self
    }

    /// Add a named vitals source
    pub fn source(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.config.ingest.sources.insert(name.into(), url.into());
        self
    }

    pub fn ingest_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.ingest.timeout_ms = timeout_ms;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.ingest.history_capacity = capacity;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.ingest.poll_interval_secs = Some(secs);
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
