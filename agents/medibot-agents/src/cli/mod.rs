//! CLI support for the `medibot` binary
//!
//! Argument parsing lives in the binary; this module loads vitals input and
//! renders assessments.

use clap::ValueEnum;
use colored::Colorize;
use std::path::Path;

use medibot_core::{Assessment, AssessmentStatus, RiskLevel, VitalsReading};

/// Output format for `classify`
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable, colored by status
    #[default]
    Table,
    /// JSON for machine processing
    Json,
    /// YAML
    Yaml,
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Nothing abnormal
    Success = 0,
    /// Something needs attention but is not critical
    Concerning = 1,
    /// Critical assessment
    Critical = 2,
    /// Input could not be read or parsed
    InvalidInput = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_status(status: AssessmentStatus) -> Self {
        match status {
            AssessmentStatus::Normal | AssessmentStatus::Stable => ExitCode::Success,
            AssessmentStatus::Concerning => ExitCode::Concerning,
            AssessmentStatus::Critical => ExitCode::Critical,
        }
    }
}

/// Read vitals from inline JSON or `@path` (JSON or YAML by extension)
pub fn load_vitals(arg: &str) -> anyhow::Result<VitalsReading> {
    let value: serde_json::Value = match arg.strip_prefix('@') {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let is_yaml = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
            if is_yaml {
                serde_yaml::from_str(&content)?
            } else {
                serde_json::from_str(&content)?
            }
        }
        None => serde_json::from_str(arg)?,
    };

    Ok(VitalsReading::from_json(&value)?)
}

/// Render an assessment to a string in the requested format
pub fn render(assessment: &Assessment, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(assessment)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(assessment)?),
        OutputFormat::Table => Ok(render_table(assessment)),
    }
}

fn render_table(assessment: &Assessment) -> String {
    let status = assessment.status.to_string().to_uppercase();
    let status = match assessment.status {
        AssessmentStatus::Normal | AssessmentStatus::Stable => status.green().bold(),
        AssessmentStatus::Concerning => status.yellow().bold(),
        AssessmentStatus::Critical => status.red().bold(),
    };
    let risk = match assessment.risk_level {
        RiskLevel::Low => assessment.risk_level.to_string().green(),
        RiskLevel::Medium => assessment.risk_level.to_string().yellow(),
        RiskLevel::High => assessment.risk_level.to_string().red(),
    };

    let mut out = format!(
        "{} {}  {} {}  ({})\n",
        "Status:".bold(),
        status,
        "Risk:".bold(),
        risk,
        assessment.preset.dimmed()
    );

    if !assessment.findings.is_empty() {
        out.push_str(&format!("\n{}\n", "Findings".bold()));
        for finding in &assessment.findings {
            let value = finding
                .value
                .map(|v| format!(" ({})", v))
                .unwrap_or_default();
            out.push_str(&format!("  {} {}{}\n", "•".red(), finding.message, value.dimmed()));
        }
    } else if !assessment.observations.is_empty() {
        out.push_str(&format!("\n{}\n", "Observations".bold()));
        for note in &assessment.observations {
            out.push_str(&format!("  {} {}\n", "•".green(), note));
        }
    }

    out.push_str(&format!("\n{}\n", "Recommendations".bold()));
    for item in &assessment.recommendations {
        out.push_str(&format!("  - {}\n", item));
    }

    if let Some(follow_up) = &assessment.follow_up {
        out.push_str(&format!("\n{}\n", "Follow-up".bold()));
        for item in follow_up {
            out.push_str(&format!("  - {}\n", item));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibot_core::VitalsClassifier;
    use std::io::Write;

    #[test]
    fn test_load_inline_json() {
        let reading = load_vitals(r#"{"pulse": 130, "consciousness": "Voice"}"#).unwrap();
        assert_eq!(reading.pulse, Some(130.0));
        assert_eq!(reading.consciousness.as_deref(), Some("Voice"));
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "heart_rate: 55\nspo2: 93").unwrap();

        let arg = format!("@{}", file.path().display());
        let reading = load_vitals(&arg).unwrap();
        assert_eq!(reading.pulse, Some(55.0));
        assert_eq!(reading.spo2, Some(93.0));
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(load_vitals("not json").is_err());
        assert!(load_vitals(r#"{"temp": "hot"}"#).is_err());
        assert!(load_vitals("@/definitely/not/here.json").is_err());
    }

    #[test]
    fn test_render_table_and_exit_code() {
        colored::control::set_override(false);
        let reading = load_vitals(r#"{"temp": 39.0}"#).unwrap();
        let assessment = VitalsClassifier::early_warning().classify(&reading);

        let text = render(&assessment, OutputFormat::Table).unwrap();
        assert!(text.contains("Status: CRITICAL"));
        assert!(text.contains("Fever detected (39)"));
        assert!(text.contains("- MER Call"));
        assert_eq!(ExitCode::from_status(assessment.status), ExitCode::Critical);
    }

    #[test]
    fn test_render_json() {
        let assessment = VitalsClassifier::graded_risk().classify(&VitalsReading::new());
        let text = render(&assessment, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "stable");
        assert_eq!(value["preset"], "graded_risk");
    }
}
