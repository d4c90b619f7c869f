//! Integration tests for MediBot core
//!
//! Covers:
//! - Early-warning classification of full readings
//! - Graded-risk grading
//! - Classifier properties (rule order, idempotence, normal ranges)
//! - Bus dispatch against a direct handler call

use async_trait::async_trait;
use medibot_core::{
    message_types, Agent, AgentReply, AssessmentStatus, BusError, Message, MessageBus, RiskLevel,
    RulePreset, ThresholdTable, VitalsClassifier, VitalsReading,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const EARLY_WARNING_TEXTS: [&str; 6] = [
    "High respiration rate (tachypnea)",
    "Low oxygen saturation – possible hypoxia",
    "High blood pressure – hypertension risk",
    "High pulse rate – tachycardia",
    "Fever detected",
    "Altered consciousness level",
];

/// Minimal health-style agent over the early-warning preset
struct TriageAgent {
    classifier: VitalsClassifier,
}

impl TriageAgent {
    fn new() -> Self {
        Self {
            classifier: VitalsClassifier::early_warning(),
        }
    }
}

#[async_trait]
impl Agent for TriageAgent {
    fn id(&self) -> &str {
        "triage"
    }

    async fn handle(&self, message: &Message) -> AgentReply {
        match message.message_type() {
            message_types::VITALS_UPDATE => match VitalsReading::from_json(message.payload()) {
                Ok(reading) => AgentReply::Health(self.classifier.classify(&reading).health_report()),
                Err(e) => AgentReply::invalid_payload(e.to_string()),
            },
            other => AgentReply::unknown_message_type(other),
        }
    }
}

fn classify_json(classifier: &VitalsClassifier, value: Value) -> medibot_core::Assessment {
    let reading = VitalsReading::from_json(&value).unwrap();
    classifier.classify(&reading)
}

#[test]
fn test_normal_reading_health_view() {
    let assessment = classify_json(
        &VitalsClassifier::early_warning(),
        json!({
            "resp_rate": 18, "spo2": 98, "bp_sys": 120,
            "pulse": 75, "temp": 37.0, "consciousness": "Alert"
        }),
    );

    assert_eq!(
        serde_json::to_value(assessment.health_report()).unwrap(),
        json!({"status": "normal", "warnings": []})
    );
}

#[test]
fn test_critical_reading_lists_every_warning_in_order() {
    let assessment = classify_json(
        &VitalsClassifier::early_warning(),
        json!({
            "resp_rate": 30, "spo2": 90, "bp_sys": 170,
            "pulse": 125, "temp": 38.0, "consciousness": "Confused"
        }),
    );

    assert_eq!(
        serde_json::to_value(assessment.health_report()).unwrap(),
        json!({"status": "critical", "warnings": EARLY_WARNING_TEXTS})
    );
    assert_eq!(assessment.recommendations, vec!["MER Call"]);
}

#[test]
fn test_graded_risk_dashboard_reading() {
    let classifier = VitalsClassifier::graded_risk();

    let stable = classify_json(
        &classifier,
        json!({"heart_rate": 72, "bp": 118, "spo2": 98, "glucose": 95}),
    );
    assert_eq!(stable.status, AssessmentStatus::Stable);
    assert_eq!(stable.risk_level, RiskLevel::Low);
    assert_eq!(
        stable.recommendations,
        vec!["Continue standard care", "Document trends"]
    );

    let crisis = classify_json(
        &classifier,
        json!({"heart_rate": 35, "bp": 190, "spo2": 88, "glucose": 300}),
    );
    assert_eq!(crisis.status, AssessmentStatus::Critical);
    assert_eq!(crisis.risk_level, RiskLevel::High);
    assert_eq!(crisis.observations.len(), 4);
    assert!(crisis.observations[0].starts_with("Severe bradycardia"));
    assert!(crisis.observations[3].starts_with("Severe hyperglycemia"));
}

#[test]
fn test_custom_thresholds_change_outcome() {
    let mut table = ThresholdTable::default();
    table.early_warning.temp_above = 38.5;
    let classifier = VitalsClassifier::from_preset(RulePreset::EarlyWarning, &table);

    let assessment = classify_json(&classifier, json!({"temp": 38.0}));
    assert_eq!(assessment.status, AssessmentStatus::Normal);
}

#[tokio::test]
async fn test_bus_round_trip_matches_direct_call() {
    let agent = Arc::new(TriageAgent::new());
    let bus = MessageBus::new();
    bus.register_agent(agent.clone()).unwrap();

    let payload = json!({"pulse": 130, "temp": 39.2});
    let message = Message::new("test", "triage", message_types::VITALS_UPDATE, payload);

    let direct = agent.handle(&message).await;
    let via_bus = bus.send_and_wait(message).await.unwrap();

    assert_eq!(direct, via_bus);
    assert!(!via_bus.is_error());
}

#[tokio::test]
async fn test_unknown_receiver_and_message_type() {
    let bus = MessageBus::new();
    bus.register_agent(Arc::new(TriageAgent::new())).unwrap();

    let err = bus
        .send_and_wait(Message::new("test", "pharmacy", "refill", Value::Null))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err, BusError::RecipientNotFound("pharmacy".to_string()));

    let reply = bus
        .send_and_wait(Message::new("test", "triage", "refill", Value::Null))
        .await
        .unwrap();
    assert_eq!(reply, AgentReply::unknown_message_type("refill"));
}

fn reading_entries() -> impl Strategy<Value = Vec<(String, Value)>> {
    (
        0.0f64..60.0,
        70.0f64..100.0,
        60.0f64..220.0,
        30.0f64..180.0,
        34.0f64..41.0,
        prop::sample::select(vec!["alert", "Alert", "Voice", "Pain", "Confused"]),
    )
        .prop_map(|(resp, spo2, bp, pulse, temp, level)| {
            vec![
                ("resp_rate".to_string(), json!(resp)),
                ("spo2".to_string(), json!(spo2)),
                ("bp_sys".to_string(), json!(bp)),
                ("pulse".to_string(), json!(pulse)),
                ("temp".to_string(), json!(temp)),
                ("consciousness".to_string(), json!(level)),
            ]
        })
        .prop_shuffle()
}

fn to_object(entries: Vec<(String, Value)>) -> Value {
    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
}

proptest! {
    #[test]
    fn prop_observations_follow_rule_order(entries in reading_entries()) {
        let assessment = classify_json(&VitalsClassifier::early_warning(), to_object(entries));

        let positions: Vec<usize> = assessment
            .observations
            .iter()
            .map(|o| EARLY_WARNING_TEXTS.iter().position(|t| t == o).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_classify_is_idempotent(entries in reading_entries()) {
        let reading = VitalsReading::from_json(&to_object(entries)).unwrap();
        for classifier in [VitalsClassifier::early_warning(), VitalsClassifier::graded_risk()] {
            prop_assert_eq!(classifier.classify(&reading), classifier.classify(&reading));
        }
    }

    #[test]
    fn prop_in_range_readings_are_normal(
        resp in 12.0f64..=25.0,
        spo2 in 95.0f64..=100.0,
        bp in 90.0f64..=140.0,
        pulse in 60.0f64..=100.0,
        temp in 36.0f64..=37.5,
        glucose in 70.0f64..=180.0,
    ) {
        let reading = VitalsReading::from_json(&json!({
            "resp_rate": resp, "spo2": spo2, "bp_sys": bp,
            "pulse": pulse, "temp": temp, "glucose": glucose,
            "consciousness": "alert"
        })).unwrap();

        let early = VitalsClassifier::early_warning().classify(&reading);
        prop_assert_eq!(early.status, AssessmentStatus::Normal);
        prop_assert!(early.observations.is_empty());

        let graded = VitalsClassifier::graded_risk().classify(&reading);
        prop_assert_eq!(graded.status, AssessmentStatus::Stable);
        prop_assert_eq!(graded.observations, vec!["All vitals within acceptable range".to_string()]);
    }
}
