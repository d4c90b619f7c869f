//! Consciousness level rule

use super::VitalRule;
use crate::contracts::{Finding, Vital, VitalTier, VitalsReading};

/// Level treated as normal, compared case-insensitively
pub const ALERT: &str = "alert";

/// Fires for any consciousness level other than "alert"
#[derive(Debug, Clone)]
pub struct ConsciousnessRule {
    id: String,
    message: String,
}

impl ConsciousnessRule {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl VitalRule for ConsciousnessRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn vital(&self) -> Vital {
        Vital::Consciousness
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Finding> {
        let level = reading.consciousness.as_deref().unwrap_or(ALERT);
        if level.eq_ignore_ascii_case(ALERT) {
            return None;
        }

        Some(Finding {
            rule_id: self.id.clone(),
            vital: Vital::Consciousness,
            value: None,
            tier: VitalTier::Abnormal,
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> ConsciousnessRule {
        ConsciousnessRule::new("altered_consciousness", "Altered consciousness level")
    }

    #[test]
    fn test_alert_any_case_is_normal() {
        for level in ["alert", "Alert", "ALERT"] {
            let reading = VitalsReading::new().with_consciousness(level);
            assert!(rule().evaluate(&reading).is_none(), "{level}");
        }
    }

    #[test]
    fn test_other_levels_fire() {
        for level in ["Voice", "Pain", "Unresponsive", "Confused", ""] {
            let reading = VitalsReading::new().with_consciousness(level);
            let finding = rule().evaluate(&reading).unwrap();
            assert_eq!(finding.tier, VitalTier::Abnormal);
            assert_eq!(finding.value, None);
        }
    }

    #[test]
    fn test_missing_level_reads_as_alert() {
        assert!(rule().evaluate(&VitalsReading::new()).is_none());
    }
}
