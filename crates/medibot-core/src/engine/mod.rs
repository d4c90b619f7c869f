//! Vital-sign classification engine
//!
//! `VitalsClassifier` runs an ordered rule list over one reading and hands the
//! findings to its preset's aggregation policy. Classification is pure and
//! cannot fail: every rule runs, and each contributes zero or one finding.

pub mod presets;
pub mod rules;

use std::sync::Arc;

use crate::contracts::{Assessment, VitalsReading};
use presets::{RulePreset, ThresholdTable};
use rules::{BoxedRule, VitalRule};

/// Rule-driven classifier bound to one preset
#[derive(Clone)]
pub struct VitalsClassifier {
    preset: RulePreset,
    rules: Vec<Arc<dyn VitalRule>>,
}

impl std::fmt::Debug for VitalsClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitalsClassifier")
            .field("preset", &self.preset)
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl VitalsClassifier {
    /// Early-warning preset with default thresholds
    pub fn early_warning() -> Self {
        Self::from_preset(RulePreset::EarlyWarning, &ThresholdTable::default())
    }

    /// Graded-risk preset with default thresholds
    pub fn graded_risk() -> Self {
        Self::from_preset(RulePreset::GradedRisk, &ThresholdTable::default())
    }

    /// Build a preset from a threshold table
    pub fn from_preset(preset: RulePreset, table: &ThresholdTable) -> Self {
        Self {
            preset,
            rules: preset.rules(table),
        }
    }

    /// A preset's aggregation with no rules registered
    pub fn empty(preset: RulePreset) -> Self {
        Self {
            preset,
            rules: Vec::new(),
        }
    }

    /// Append a rule; it runs after every rule already registered
    pub fn register(&mut self, rule: Arc<dyn VitalRule>) {
        self.rules.push(rule);
    }

    pub fn register_boxed(&mut self, rule: BoxedRule) {
        self.rules.push(Arc::from(rule));
    }

    pub fn rules(&self) -> &[Arc<dyn VitalRule>] {
        &self.rules
    }

    pub fn preset(&self) -> RulePreset {
        self.preset
    }

    /// Classify one reading.
    ///
    /// Deterministic: the same reading always yields the same assessment.
    pub fn classify(&self, reading: &VitalsReading) -> Assessment {
        let findings = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(reading))
            .collect::<Vec<_>>();

        tracing::trace!(
            preset = %self.preset,
            rules_evaluated = self.rules.len(),
            findings = findings.len(),
            "Classified reading"
        );

        self.preset.aggregate(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{AssessmentStatus, RiskLevel, Vital};
    use rules::{Cutoff, ThresholdRule};

    #[test]
    fn test_empty_reading_is_normal() {
        let assessment = VitalsClassifier::early_warning().classify(&VitalsReading::new());
        assert_eq!(assessment.status, AssessmentStatus::Normal);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.observations.is_empty());
        assert_eq!(assessment.recommendations, vec!["Normal Observation"]);

        let assessment = VitalsClassifier::graded_risk().classify(&VitalsReading::new());
        assert_eq!(assessment.status, AssessmentStatus::Stable);
        assert_eq!(
            assessment.observations,
            vec!["All vitals within acceptable range"]
        );
    }

    #[test]
    fn test_single_early_warning_finding_escalates() {
        let reading = VitalsReading::new().with_value(Vital::Temperature, 38.1);
        let assessment = VitalsClassifier::early_warning().classify(&reading);

        assert_eq!(assessment.status, AssessmentStatus::Critical);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.observations, vec!["Fever detected"]);
        assert_eq!(assessment.recommendations, vec!["MER Call"]);
        assert!(assessment.follow_up.is_none());
    }

    #[test]
    fn test_graded_risk_levels() {
        let classifier = VitalsClassifier::graded_risk();

        let one = VitalsReading::new().with_value(Vital::HeartRate, 110.0);
        let assessment = classifier.classify(&one);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.status, AssessmentStatus::Concerning);
        assert_eq!(
            assessment.follow_up,
            Some(vec![
                "Trend vital signs".to_string(),
                "Notify physician of changes".to_string()
            ])
        );

        let two_critical = VitalsReading::new()
            .with_value(Vital::HeartRate, 150.0)
            .with_value(Vital::OxygenSaturation, 85.0);
        let assessment = classifier.classify(&two_critical);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.status, AssessmentStatus::Critical);
        assert_eq!(assessment.findings.len(), 2);
    }

    #[test]
    fn test_registered_rule_runs_last() {
        let mut classifier = VitalsClassifier::empty(RulePreset::EarlyWarning);
        assert!(classifier.rules().is_empty());

        classifier.register(Arc::new(ThresholdRule::new(
            "hyperglycemia",
            Vital::Glucose,
            Cutoff::Above(200.0),
            100.0,
            "High glucose",
        )));
        classifier.register_boxed(Box::new(ThresholdRule::new(
            "bradycardia",
            Vital::HeartRate,
            Cutoff::Below(50.0),
            75.0,
            "Low pulse",
        )));

        let reading = VitalsReading::new()
            .with_value(Vital::HeartRate, 45.0)
            .with_value(Vital::Glucose, 250.0);
        let assessment = classifier.classify(&reading);
        assert_eq!(assessment.observations, vec!["High glucose", "Low pulse"]);
    }
}
