//! Rule framework for vital-sign classification
//!
//! A rule looks at one vital, substitutes its neutral default when the
//! reading lacks that vital, and yields at most one finding.

pub mod consciousness;
pub mod graded;
pub mod threshold;

pub use consciousness::ConsciousnessRule;
pub use graded::{GradedRule, VitalBands};
pub use threshold::{Cutoff, ThresholdRule};

use crate::contracts::{Finding, Vital, VitalsReading};

/// Trait for classification rules
///
/// Rules are pure: the same reading always produces the same finding.
pub trait VitalRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &str;

    /// Vital this rule consumes
    fn vital(&self) -> Vital;

    /// Evaluate the rule, returning a finding if it fires
    fn evaluate(&self, reading: &VitalsReading) -> Option<Finding>;
}

/// A boxed rule for dynamic dispatch
pub type BoxedRule = Box<dyn VitalRule>;

/// Value of a numeric vital, or the rule's neutral default
pub(crate) fn value_or_default(reading: &VitalsReading, vital: Vital, neutral: f64) -> f64 {
    reading.numeric(vital).unwrap_or(neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_or_default() {
        let reading = VitalsReading::new().with_value(Vital::HeartRate, 130.0);
        assert_eq!(value_or_default(&reading, Vital::HeartRate, 75.0), 130.0);
        assert_eq!(value_or_default(&reading, Vital::Glucose, 100.0), 100.0);
    }
}
