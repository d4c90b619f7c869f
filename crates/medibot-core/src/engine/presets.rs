//! Classifier presets
//!
//! A preset is an ordered rule list plus an aggregation policy. The threshold
//! tables hold every cutoff so deployments can tune them without code changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::rules::{ConsciousnessRule, Cutoff, GradedRule, ThresholdRule, VitalBands, VitalRule};
use crate::contracts::{Assessment, AssessmentStatus, Finding, RiskLevel, Vital, VitalTier};

/// Observation used by the graded preset when nothing fired
pub const ALL_WITHIN_RANGE: &str = "All vitals within acceptable range";

/// Recommendation when the early-warning preset finds nothing
pub const NORMAL_OBSERVATION: &str = "Normal Observation";

/// Recommendation when any early-warning rule fires
pub const MER_CALL: &str = "MER Call";

/// Neutral in-range values substituted for missing vitals
pub mod neutral {
    pub const RESP_RATE: f64 = 16.0;
    pub const SPO2: f64 = 98.0;
    pub const BP_SYS: f64 = 120.0;
    pub const HEART_RATE: f64 = 75.0;
    pub const TEMP: f64 = 37.0;
    pub const GLUCOSE: f64 = 100.0;
}

/// Named rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    /// Binary escalation used by the health agent
    EarlyWarning,
    /// Four-vital risk grading used as the doctor-assistant fallback
    GradedRisk,
}

impl RulePreset {
    pub fn name(&self) -> &'static str {
        match self {
            RulePreset::EarlyWarning => "early_warning",
            RulePreset::GradedRisk => "graded_risk",
        }
    }

    /// Build this preset's rules, in evaluation order
    pub fn rules(&self, table: &ThresholdTable) -> Vec<Arc<dyn VitalRule>> {
        match self {
            RulePreset::EarlyWarning => early_warning_rules(&table.early_warning),
            RulePreset::GradedRisk => graded_rules(&table.graded),
        }
    }

    /// Turn the ordered findings into an assessment
    pub fn aggregate(&self, findings: Vec<Finding>) -> Assessment {
        match self {
            RulePreset::EarlyWarning => aggregate_early_warning(findings),
            RulePreset::GradedRisk => aggregate_graded(findings),
        }
    }
}

impl fmt::Display for RulePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RulePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "early_warning" | "news" => Ok(RulePreset::EarlyWarning),
            "graded_risk" | "graded" => Ok(RulePreset::GradedRisk),
            _ => Err(format!(
                "Unknown preset: {} (expected early_warning or graded_risk)",
                s
            )),
        }
    }
}

/// Cutoffs for the early-warning preset. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyWarningThresholds {
    pub resp_rate_above: f64,
    pub spo2_below: f64,
    pub bp_sys_above: f64,
    pub pulse_above: f64,
    pub temp_above: f64,
}

impl Default for EarlyWarningThresholds {
    fn default() -> Self {
        Self {
            resp_rate_above: 25.0,
            spo2_below: 92.0,
            bp_sys_above: 160.0,
            pulse_above: 120.0,
            temp_above: 37.5,
        }
    }
}

/// Band tables for the graded-risk preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradedThresholds {
    pub heart_rate: VitalBands,
    pub bp_sys: VitalBands,
    pub spo2: VitalBands,
    pub glucose: VitalBands,
}

impl Default for GradedThresholds {
    fn default() -> Self {
        Self {
            heart_rate: VitalBands::unbounded()
                .critical_low(40.0)
                .low(60.0)
                .high(100.0)
                .critical_high(140.0),
            bp_sys: VitalBands::unbounded()
                .critical_low(80.0)
                .low(90.0)
                .high(140.0)
                .critical_high(180.0),
            spo2: VitalBands::unbounded().critical_low(90.0).low(95.0),
            glucose: VitalBands::unbounded()
                .critical_low(60.0)
                .low(70.0)
                .high(180.0)
                .critical_high(250.0),
        }
    }
}

/// Every tunable cutoff, grouped by preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTable {
    pub early_warning: EarlyWarningThresholds,
    pub graded: GradedThresholds,
}

/// A threshold table that would misclassify its own neutral defaults
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid threshold for {vital}: {reason}")]
pub struct InvalidThreshold {
    pub vital: Vital,
    pub reason: String,
}

impl ThresholdTable {
    /// Check band ordering and that every neutral default reads as normal
    pub fn validate(&self) -> Result<(), InvalidThreshold> {
        let ew = &self.early_warning;
        let singles = [
            (Vital::RespiratoryRate, Cutoff::Above(ew.resp_rate_above), neutral::RESP_RATE),
            (Vital::OxygenSaturation, Cutoff::Below(ew.spo2_below), neutral::SPO2),
            (Vital::SystolicBp, Cutoff::Above(ew.bp_sys_above), neutral::BP_SYS),
            (Vital::HeartRate, Cutoff::Above(ew.pulse_above), neutral::HEART_RATE),
            (Vital::Temperature, Cutoff::Above(ew.temp_above), neutral::TEMP),
        ];
        for (vital, cutoff, neutral) in singles {
            if cutoff.is_breached(neutral) {
                return Err(InvalidThreshold {
                    vital,
                    reason: format!("neutral default {} breaches {}", neutral, cutoff.describe()),
                });
            }
        }

        let graded = &self.graded;
        let bands = [
            (Vital::HeartRate, graded.heart_rate, neutral::HEART_RATE),
            (Vital::SystolicBp, graded.bp_sys, neutral::BP_SYS),
            (Vital::OxygenSaturation, graded.spo2, neutral::SPO2),
            (Vital::Glucose, graded.glucose, neutral::GLUCOSE),
        ];
        for (vital, bands, neutral) in bands {
            bands
                .check(neutral)
                .map_err(|reason| InvalidThreshold { vital, reason })?;
        }

        Ok(())
    }
}

fn early_warning_rules(t: &EarlyWarningThresholds) -> Vec<Arc<dyn VitalRule>> {
    vec![
        Arc::new(ThresholdRule::new(
            "tachypnea",
            Vital::RespiratoryRate,
            Cutoff::Above(t.resp_rate_above),
            neutral::RESP_RATE,
            "High respiration rate (tachypnea)",
        )),
        Arc::new(ThresholdRule::new(
            "hypoxia",
            Vital::OxygenSaturation,
            Cutoff::Below(t.spo2_below),
            neutral::SPO2,
            "Low oxygen saturation – possible hypoxia",
        )),
        Arc::new(ThresholdRule::new(
            "hypertension",
            Vital::SystolicBp,
            Cutoff::Above(t.bp_sys_above),
            neutral::BP_SYS,
            "High blood pressure – hypertension risk",
        )),
        Arc::new(ThresholdRule::new(
            "tachycardia",
            Vital::HeartRate,
            Cutoff::Above(t.pulse_above),
            neutral::HEART_RATE,
            "High pulse rate – tachycardia",
        )),
        Arc::new(ThresholdRule::new(
            "fever",
            Vital::Temperature,
            Cutoff::Above(t.temp_above),
            neutral::TEMP,
            "Fever detected",
        )),
        Arc::new(ConsciousnessRule::new(
            "altered_consciousness",
            "Altered consciousness level",
        )),
    ]
}

fn graded_rules(t: &GradedThresholds) -> Vec<Arc<dyn VitalRule>> {
    vec![
        Arc::new(
            GradedRule::new("heart_rate", Vital::HeartRate, t.heart_rate, neutral::HEART_RATE)
                .message(
                    VitalTier::CriticalLow,
                    "Severe bradycardia detected. Consider atropine or pacing.",
                )
                .message(
                    VitalTier::Low,
                    "Bradycardia present. Monitor for symptoms of decreased cardiac output.",
                )
                .message(
                    VitalTier::High,
                    "Mild tachycardia. Consider causes: anxiety, pain, medications.",
                )
                .message(
                    VitalTier::CriticalHigh,
                    "Significant tachycardia. Evaluate for underlying causes (fever, dehydration, arrhythmia).",
                ),
        ),
        Arc::new(
            GradedRule::new("blood_pressure", Vital::SystolicBp, t.bp_sys, neutral::BP_SYS)
                .message(
                    VitalTier::CriticalLow,
                    "Severe hypotension. Assess for shock, consider fluid resuscitation.",
                )
                .message(
                    VitalTier::Low,
                    "Hypotension present. Monitor closely, evaluate causes.",
                )
                .message(
                    VitalTier::High,
                    "Stage 2 hypertension. Evaluate for target organ damage.",
                )
                .message(
                    VitalTier::CriticalHigh,
                    "Hypertensive crisis. Immediate intervention required.",
                ),
        ),
        Arc::new(
            GradedRule::new("oxygen_saturation", Vital::OxygenSaturation, t.spo2, neutral::SPO2)
                .message(
                    VitalTier::CriticalLow,
                    "Severe hypoxemia. Immediate oxygen therapy and respiratory support needed.",
                )
                .message(
                    VitalTier::Low,
                    "Mild hypoxemia. Supplemental oxygen may be beneficial.",
                ),
        ),
        Arc::new(
            GradedRule::new("glucose", Vital::Glucose, t.glucose, neutral::GLUCOSE)
                .message(
                    VitalTier::CriticalLow,
                    "Hypoglycemia detected. Immediate glucose administration needed.",
                )
                .message(
                    VitalTier::Low,
                    "Mild hypoglycemia. Monitor closely, consider glucose supplementation.",
                )
                .message(
                    VitalTier::High,
                    "Hyperglycemia present. Monitor for complications.",
                )
                .message(
                    VitalTier::CriticalHigh,
                    "Severe hyperglycemia. Check for DKA, consider insulin therapy.",
                ),
        ),
    ]
}

fn aggregate_early_warning(findings: Vec<Finding>) -> Assessment {
    let (status, risk_level, recommendation) = if findings.is_empty() {
        (AssessmentStatus::Normal, RiskLevel::Low, NORMAL_OBSERVATION)
    } else {
        (AssessmentStatus::Critical, RiskLevel::High, MER_CALL)
    };

    Assessment {
        preset: RulePreset::EarlyWarning.name().to_string(),
        status,
        risk_level,
        observations: findings.iter().map(|f| f.message.clone()).collect(),
        recommendations: vec![recommendation.to_string()],
        follow_up: None,
        findings,
    }
}

fn aggregate_graded(findings: Vec<Finding>) -> Assessment {
    let risk_level = RiskLevel::from_abnormal_count(findings.len());
    let status = match risk_level {
        RiskLevel::Low => AssessmentStatus::Stable,
        RiskLevel::Medium => AssessmentStatus::Concerning,
        RiskLevel::High if findings.iter().any(|f| f.tier.is_critical()) => {
            AssessmentStatus::Critical
        }
        RiskLevel::High => AssessmentStatus::Concerning,
    };

    let observations = if findings.is_empty() {
        vec![ALL_WITHIN_RANGE.to_string()]
    } else {
        findings.iter().map(|f| f.message.clone()).collect()
    };

    Assessment {
        preset: RulePreset::GradedRisk.name().to_string(),
        status,
        risk_level,
        observations,
        recommendations: to_strings(graded_recommendations(risk_level)),
        follow_up: Some(to_strings(graded_follow_up(risk_level))),
        findings,
    }
}

/// Fixed recommendation lookup for the graded preset
fn graded_recommendations(risk: RiskLevel) -> &'static [&'static str] {
    match risk {
        RiskLevel::Low => &["Continue standard care", "Document trends"],
        RiskLevel::Medium => &[
            "Monitor closely",
            "Enhanced monitoring (q30min)",
            "Consider additional diagnostics",
        ],
        RiskLevel::High => &[
            "Immediate medical attention required",
            "Continuous monitoring required",
            "Consider ICU consultation",
        ],
    }
}

fn graded_follow_up(risk: RiskLevel) -> &'static [&'static str] {
    match risk {
        RiskLevel::Low => &["Continue monitoring"],
        RiskLevel::Medium => &["Trend vital signs", "Notify physician of changes"],
        RiskLevel::High => &[
            "Frequent vital sign checks (q15min)",
            "Prepare for potential interventions",
        ],
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_round_trip() {
        for preset in [RulePreset::EarlyWarning, RulePreset::GradedRisk] {
            assert_eq!(preset.name().parse::<RulePreset>().unwrap(), preset);
        }
        assert_eq!("graded-risk".parse::<RulePreset>().unwrap(), RulePreset::GradedRisk);
        assert!("mews".parse::<RulePreset>().is_err());
    }

    #[test]
    fn test_default_tables_validate() {
        assert!(ThresholdTable::default().validate().is_ok());
    }

    #[test]
    fn test_table_rejecting_neutral_default() {
        let mut table = ThresholdTable::default();
        table.early_warning.temp_above = 36.5;

        let err = table.validate().unwrap_err();
        assert_eq!(err.vital, Vital::Temperature);

        let mut table = ThresholdTable::default();
        table.graded.glucose = VitalBands::unbounded().high(90.0);
        assert_eq!(table.validate().unwrap_err().vital, Vital::Glucose);
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let table: ThresholdTable =
            serde_json::from_str(r#"{"early_warning": {"temp_above": 38.0}}"#).unwrap();

        assert_eq!(table.early_warning.temp_above, 38.0);
        assert_eq!(table.early_warning.pulse_above, 120.0);
        assert_eq!(table.graded, GradedThresholds::default());
    }

    #[test]
    fn test_rule_order() {
        let ids: Vec<String> = RulePreset::EarlyWarning
            .rules(&ThresholdTable::default())
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "tachypnea",
                "hypoxia",
                "hypertension",
                "tachycardia",
                "fever",
                "altered_consciousness"
            ]
        );

        let vitals: Vec<Vital> = RulePreset::GradedRisk
            .rules(&ThresholdTable::default())
            .iter()
            .map(|r| r.vital())
            .collect();
        assert_eq!(
            vitals,
            vec![
                Vital::HeartRate,
                Vital::SystolicBp,
                Vital::OxygenSaturation,
                Vital::Glucose
            ]
        );
    }

    #[test]
    fn test_graded_high_risk_without_critical_is_concerning() {
        let finding = |tier| Finding {
            rule_id: "x".to_string(),
            vital: Vital::HeartRate,
            value: Some(0.0),
            tier,
            message: "m".to_string(),
        };

        let assessment = RulePreset::GradedRisk
            .aggregate(vec![finding(VitalTier::High), finding(VitalTier::Low)]);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.status, AssessmentStatus::Concerning);

        let assessment = RulePreset::GradedRisk
            .aggregate(vec![finding(VitalTier::High), finding(VitalTier::CriticalLow)]);
        assert_eq!(assessment.status, AssessmentStatus::Critical);
    }
}
