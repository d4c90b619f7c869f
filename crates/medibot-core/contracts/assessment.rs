//! Assessment contracts
//!
//! `Assessment` is the classifier's canonical output. Agents expose it through
//! one of two wire views: the health view (`status` + `warnings`) or the
//! clinical view (`overall_status`, `risk_level`, notes and actions).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Vital;

/// Overall status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// No rule fired (early-warning preset)
    Normal,
    /// Low risk (graded-risk preset)
    Stable,
    /// Medium risk, or high risk without a critical vital
    Concerning,
    /// Emergency response warranted
    Critical,
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentStatus::Normal => write!(f, "normal"),
            AssessmentStatus::Stable => write!(f, "stable"),
            AssessmentStatus::Concerning => write!(f, "concerning"),
            AssessmentStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Risk level, correlated with but independent of the status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Risk level from the number of vitals outside their normal band
    pub fn from_abnormal_count(count: usize) -> Self {
        match count {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Severity band of a single vital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalTier {
    CriticalLow,
    Low,
    Normal,
    High,
    CriticalHigh,
    /// Non-numeric abnormality (e.g. altered consciousness)
    Abnormal,
}

impl VitalTier {
    pub fn is_critical(&self) -> bool {
        matches!(self, VitalTier::CriticalLow | VitalTier::CriticalHigh)
    }

    pub fn is_abnormal(&self) -> bool {
        !matches!(self, VitalTier::Normal)
    }
}

/// A rule that fired during classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule that produced the finding
    pub rule_id: String,

    /// Vital the rule looked at
    pub vital: Vital,

    /// Value the rule evaluated (after default substitution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Band the value fell into
    pub tier: VitalTier,

    /// Observation text
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rule_id, self.vital, self.message)
    }
}

/// Result of classifying one vitals reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Preset that produced this assessment
    pub preset: String,

    pub status: AssessmentStatus,

    pub risk_level: RiskLevel,

    /// Observations in rule-evaluation order
    pub observations: Vec<String>,

    /// Recommended actions
    pub recommendations: Vec<String>,

    /// Follow-up actions, when the preset defines them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<Vec<String>>,

    /// Per-rule detail, same order as `observations` for fired rules
    pub findings: Vec<Finding>,
}

impl Assessment {
    pub fn is_critical(&self) -> bool {
        self.status == AssessmentStatus::Critical
    }

    /// Health view: `{status, warnings}`
    pub fn health_report(&self) -> HealthReport {
        HealthReport {
            status: self.status,
            warnings: self.findings.iter().map(|f| f.message.clone()).collect(),
        }
    }

    /// Clinical view tagged with where it came from
    pub fn to_clinical(&self, source: AssessmentSource) -> ClinicalAssessment {
        ClinicalAssessment {
            overall_status: self.status,
            risk_level: self.risk_level,
            medical_notes: self.observations.clone(),
            recommendations: self.recommendations.clone(),
            follow_up: self.follow_up.clone().unwrap_or_default(),
            source,
        }
    }
}

/// Health-agent reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: AssessmentStatus,
    pub warnings: Vec<String>,
}

/// Origin of a clinical assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    /// Produced by the external assessment service
    Ai,
    /// Produced by the local graded-risk rules
    Fallback,
}

/// Doctor-assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalAssessment {
    pub overall_status: AssessmentStatus,
    pub risk_level: RiskLevel,
    pub medical_notes: Vec<String>,
    pub recommendations: Vec<String>,
    pub follow_up: Vec<String>,
    pub source: AssessmentSource,
}
