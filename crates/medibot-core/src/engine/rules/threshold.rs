//! Single-cutoff rules
//!
//! Fire when a vital crosses one strict cutoff. Used by the early-warning
//! preset, where every check is a plain "above" or "below" test.

use serde::{Deserialize, Serialize};

use super::{value_or_default, VitalRule};
use crate::contracts::{Finding, Vital, VitalTier, VitalsReading};

/// Strict comparison against a cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Fires when value > cutoff
    Above(f64),
    /// Fires when value < cutoff
    Below(f64),
}

impl Cutoff {
    pub fn is_breached(&self, value: f64) -> bool {
        match *self {
            Cutoff::Above(cutoff) => value > cutoff,
            Cutoff::Below(cutoff) => value < cutoff,
        }
    }

    fn tier(&self) -> VitalTier {
        match self {
            Cutoff::Above(_) => VitalTier::High,
            Cutoff::Below(_) => VitalTier::Low,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Cutoff::Above(cutoff) => format!("> {}", cutoff),
            Cutoff::Below(cutoff) => format!("< {}", cutoff),
        }
    }
}

/// Rule firing when one vital crosses a cutoff
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    id: String,
    vital: Vital,
    cutoff: Cutoff,
    neutral: f64,
    message: String,
}

impl ThresholdRule {
    pub fn new(
        id: impl Into<String>,
        vital: Vital,
        cutoff: Cutoff,
        neutral: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vital,
            cutoff,
            neutral,
            message: message.into(),
        }
    }
}

impl VitalRule for ThresholdRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn vital(&self) -> Vital {
        self.vital
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Finding> {
        let value = value_or_default(reading, self.vital, self.neutral);
        if !self.cutoff.is_breached(value) {
            return None;
        }

        Some(Finding {
            rule_id: self.id.clone(),
            vital: self.vital,
            value: Some(value),
            tier: self.cutoff.tier(),
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fever_rule() -> ThresholdRule {
        ThresholdRule::new("fever", Vital::Temperature, Cutoff::Above(37.5), 37.0, "Fever detected")
    }

    #[test]
    fn test_cutoff_is_strict() {
        assert!(!Cutoff::Above(37.5).is_breached(37.5));
        assert!(Cutoff::Above(37.5).is_breached(37.6));
        assert!(!Cutoff::Below(92.0).is_breached(92.0));
        assert!(Cutoff::Below(92.0).is_breached(91.9));
    }

    #[test]
    fn test_rule_fires_above_cutoff() {
        let reading = VitalsReading::new().with_value(Vital::Temperature, 38.2);
        let finding = fever_rule().evaluate(&reading).unwrap();

        assert_eq!(finding.rule_id, "fever");
        assert_eq!(finding.tier, VitalTier::High);
        assert_eq!(finding.value, Some(38.2));
        assert_eq!(finding.message, "Fever detected");
    }

    #[test]
    fn test_missing_value_uses_neutral_default() {
        assert!(fever_rule().evaluate(&VitalsReading::new()).is_none());
    }

    #[test]
    fn test_describe() {
        assert_eq!(Cutoff::Above(160.0).describe(), "> 160");
        assert_eq!(Cutoff::Below(92.5).describe(), "< 92.5");
    }
}
