//! Clinical records passed between the three agents.
//!
//! Risk travels as the string the diagnostics agent produced, so a report
//! embeds exactly what it was given. [`RiskLevel`] is only the parsed view.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Triage risk level. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Case-insensitive parse; `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        [Self::Low, Self::Medium, Self::High]
            .into_iter()
            .find(|level| raw.eq_ignore_ascii_case(level.as_str()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the diagnostics agent, input of the report agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default = "unknown")]
    pub condition: String,
    #[serde(default = "unknown")]
    pub risk: String,
}

impl Diagnosis {
    pub fn new(condition: impl Into<String>, risk: RiskLevel) -> Self {
        Self {
            condition: condition.into(),
            risk: risk.to_string(),
        }
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// Structured medical report; travels between agents as pretty-printed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MedicalReport {
    #[serde(default = "unknown")]
    pub condition: String,
    #[serde(default = "unknown")]
    pub risk_level: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl MedicalReport {
    pub fn risk(&self) -> Option<RiskLevel> {
        RiskLevel::parse(&self.risk_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_risk_is_kept_verbatim() {
        let d: Diagnosis = serde_json::from_value(json!({"condition": "X", "risk": "Severe"}))
            .expect("decode");
        assert_eq!(d.risk, "Severe");

        let d: Diagnosis = serde_json::from_value(json!({"risk": "high"})).expect("decode");
        assert_eq!(d.condition, "Unknown");
        assert_eq!(d.risk, "high");
    }

    #[test]
    fn test_risk_parse_ignores_case() {
        assert_eq!(RiskLevel::parse("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse(" HIGH "), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("medium"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("Severe"), None);
        assert!(RiskLevel::High > RiskLevel::Medium && RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn test_report_field_names() {
        let report = MedicalReport {
            condition: "Hypertension".to_string(),
            risk_level: "Medium".to_string(),
            recommendations: vec!["Rest".to_string()],
        };
        assert_eq!(report.risk(), Some(RiskLevel::Medium));
        assert_eq!(
            serde_json::to_value(&report).expect("encode"),
            json!({"Condition": "Hypertension", "RiskLevel": "Medium", "Recommendations": ["Rest"]})
        );
    }
}
