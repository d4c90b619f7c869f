//! Vital-sign reading contracts

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single physiological measurement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    /// Respiratory rate (breaths/min)
    RespiratoryRate,
    /// Peripheral oxygen saturation (%)
    OxygenSaturation,
    /// Systolic blood pressure (mmHg)
    SystolicBp,
    /// Heart rate / pulse (bpm)
    HeartRate,
    /// Body temperature (°C)
    Temperature,
    /// Blood glucose (mg/dL)
    Glucose,
    /// Level of consciousness (alert or altered)
    Consciousness,
}

impl Vital {
    /// JSON key used for this vital in a reading
    pub fn key(&self) -> &'static str {
        match self {
            Vital::RespiratoryRate => "resp_rate",
            Vital::OxygenSaturation => "spo2",
            Vital::SystolicBp => "bp_sys",
            Vital::HeartRate => "pulse",
            Vital::Temperature => "temp",
            Vital::Glucose => "glucose",
            Vital::Consciousness => "consciousness",
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One snapshot of a patient's measurements.
///
/// Every field is optional. Classifier presets substitute a neutral in-range
/// default for anything missing, so an absent value reads as normal. Values
/// are not checked for physical plausibility.
///
/// Only a mapping deserializes into a reading. The dashboard spellings `bp`,
/// `heart_rate` and `temperature` are accepted; when a payload carries both
/// spellings the canonical key wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VitalsReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_rate: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp_sys: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub glucose: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub consciousness: Option<String>,
}

/// Wire layout with every accepted spelling as its own key
#[derive(Default, Deserialize)]
#[serde(default)]
struct ReadingFields {
    resp_rate: Option<f64>,
    spo2: Option<f64>,
    bp_sys: Option<f64>,
    bp: Option<f64>,
    pulse: Option<f64>,
    heart_rate: Option<f64>,
    temp: Option<f64>,
    temperature: Option<f64>,
    glucose: Option<f64>,
    consciousness: Option<String>,
}

impl From<ReadingFields> for VitalsReading {
    fn from(fields: ReadingFields) -> Self {
        Self {
            resp_rate: fields.resp_rate,
            spo2: fields.spo2,
            bp_sys: fields.bp_sys.or(fields.bp),
            pulse: fields.pulse.or(fields.heart_rate),
            temp: fields.temp.or(fields.temperature),
            glucose: fields.glucose,
            consciousness: fields.consciousness,
        }
    }
}

impl<'de> Deserialize<'de> for VitalsReading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Going through a map first rejects sequences, which would otherwise
        // fill the fields by position.
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        ReadingFields::deserialize(serde_json::Value::Object(map))
            .map(Self::from)
            .map_err(de::Error::custom)
    }
}

impl VitalsReading {
    /// Create an empty reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a reading from an arbitrary JSON payload
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Numeric value of a vital, if present
    pub fn numeric(&self, vital: Vital) -> Option<f64> {
        match vital {
            Vital::RespiratoryRate => self.resp_rate,
            Vital::OxygenSaturation => self.spo2,
            Vital::SystolicBp => self.bp_sys,
            Vital::HeartRate => self.pulse,
            Vital::Temperature => self.temp,
            Vital::Glucose => self.glucose,
            Vital::Consciousness => None,
        }
    }

    /// Set a numeric vital (consciousness is ignored, use `with_consciousness`)
    pub fn with_value(mut self, vital: Vital, value: f64) -> Self {
        match vital {
            Vital::RespiratoryRate => self.resp_rate = Some(value),
            Vital::OxygenSaturation => self.spo2 = Some(value),
            Vital::SystolicBp => self.bp_sys = Some(value),
            Vital::HeartRate => self.pulse = Some(value),
            Vital::Temperature => self.temp = Some(value),
            Vital::Glucose => self.glucose = Some(value),
            Vital::Consciousness => {}
        }
        self
    }

    /// Set the consciousness level
    pub fn with_consciousness(mut self, level: impl Into<String>) -> Self {
        self.consciousness = Some(level.into());
        self
    }

    /// Summary in the key layout the dashboard and ingest cache use.
    ///
    /// Glucose falls back to 100 mg/dL when the reading does not carry it.
    pub fn dashboard_batch(&self) -> VitalsBatch {
        let mut batch = VitalsBatch::new();
        batch.insert("heart_rate".to_string(), self.pulse);
        batch.insert("bp".to_string(), self.bp_sys);
        batch.insert("spo2".to_string(), self.spo2);
        batch.insert("glucose".to_string(), Some(self.glucose.unwrap_or(100.0)));
        batch
    }
}

/// Named vital values, `None` where a source had nothing usable
pub type VitalsBatch = BTreeMap<String, Option<f64>>;

/// A batch stored in the ingest history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub recorded_at: DateTime<Utc>,
    pub values: VitalsBatch,
}

impl VitalsSnapshot {
    pub fn now(values: VitalsBatch) -> Self {
        Self {
            recorded_at: Utc::now(),
            values,
        }
    }
}
