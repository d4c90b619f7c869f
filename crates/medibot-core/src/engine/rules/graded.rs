//! Graded band rules
//!
//! Place a vital in one of five tiers (critical low, low, normal, high,
//! critical high). Critical cutoffs are checked before the plain ones, and
//! every comparison is strict.

use serde::{Deserialize, Serialize};

use super::{value_or_default, VitalRule};
use crate::contracts::{Finding, Vital, VitalTier, VitalsReading};

/// Band cutoffs for one vital. A missing cutoff never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalBands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,
}

impl VitalBands {
    /// Bands with no cutoffs
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Critical below this value
    pub fn critical_low(mut self, value: f64) -> Self {
        self.critical_low = Some(value);
        self
    }

    /// Low below this value
    pub fn low(mut self, value: f64) -> Self {
        self.low = Some(value);
        self
    }

    /// High above this value
    pub fn high(mut self, value: f64) -> Self {
        self.high = Some(value);
        self
    }

    /// Critical above this value
    pub fn critical_high(mut self, value: f64) -> Self {
        self.critical_high = Some(value);
        self
    }

    /// Tier for a value
    pub fn classify(&self, value: f64) -> VitalTier {
        if self.critical_low.is_some_and(|c| value < c) {
            VitalTier::CriticalLow
        } else if self.critical_high.is_some_and(|c| value > c) {
            VitalTier::CriticalHigh
        } else if self.low.is_some_and(|c| value < c) {
            VitalTier::Low
        } else if self.high.is_some_and(|c| value > c) {
            VitalTier::High
        } else {
            VitalTier::Normal
        }
    }

    /// Check that cutoffs are ordered and `neutral` sits in the normal band
    pub fn check(&self, neutral: f64) -> Result<(), String> {
        let ordered = [self.critical_low, self.low, self.high, self.critical_high];
        let present: Vec<f64> = ordered.iter().flatten().copied().collect();
        if present.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!("cutoffs out of order: {}", self.describe()));
        }
        if self.classify(neutral) != VitalTier::Normal {
            return Err(format!(
                "neutral default {} falls outside the normal band {}",
                neutral,
                self.describe()
            ));
        }
        Ok(())
    }

    /// Human-readable normal band
    pub fn describe(&self) -> String {
        match (self.low.or(self.critical_low), self.high.or(self.critical_high)) {
            (Some(min), Some(max)) => format!("[{}, {}]", min, max),
            (Some(min), None) => format!(">= {}", min),
            (None, Some(max)) => format!("<= {}", max),
            (None, None) => "unbounded".to_string(),
        }
    }
}

/// Rule classifying one vital into graded tiers
#[derive(Debug, Clone)]
pub struct GradedRule {
    id: String,
    vital: Vital,
    bands: VitalBands,
    neutral: f64,
    messages: Vec<(VitalTier, String)>,
}

impl GradedRule {
    pub fn new(id: impl Into<String>, vital: Vital, bands: VitalBands, neutral: f64) -> Self {
        Self {
            id: id.into(),
            vital,
            bands,
            neutral,
            messages: Vec::new(),
        }
    }

    /// Observation text for a tier
    pub fn message(mut self, tier: VitalTier, text: impl Into<String>) -> Self {
        self.messages.retain(|(t, _)| *t != tier);
        self.messages.push((tier, text.into()));
        self
    }

    fn text_for(&self, tier: VitalTier, value: f64) -> String {
        self.messages
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, text)| text.clone())
            .unwrap_or_else(|| {
                format!(
                    "{} {} outside normal range {} ({:?})",
                    self.vital,
                    value,
                    self.bands.describe(),
                    tier
                )
            })
    }
}

impl VitalRule for GradedRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn vital(&self) -> Vital {
        self.vital
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Finding> {
        let value = value_or_default(reading, self.vital, self.neutral);
        let tier = self.bands.classify(value);
        if !tier.is_abnormal() {
            return None;
        }

        Some(Finding {
            rule_id: self.id.clone(),
            vital: self.vital,
            value: Some(value),
            tier,
            message: self.text_for(tier, value),
        })
    }
}
