//! Report agent: formats a diagnosis into a structured medical report.

use crate::a2a::dispatcher::SkillHandler;
use crate::a2a::manifest::AgentIdentity;
use crate::a2a::types::*;
use crate::agents::records::{Diagnosis, MedicalReport};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

pub const IDENTITY: AgentIdentity = AgentIdentity {
    id: "report-agent",
    name: "ReportAgent",
    description: "Generates medical reports from diagnostic results.",
    tags: &["healthcare", "reporting", "medical"],
};

pub const SKILL_ID: &str = "generate-report";

/// Recommendations attached to every report.
pub const STANDARD_RECOMMENDATIONS: [&str; 2] = ["Follow up in 2 weeks", "Monitor vitals daily"];

pub fn skill() -> SkillDescriptor {
    SkillDescriptor {
        id: SKILL_ID.to_string(),
        name: "Generate Patient Report".to_string(),
        description: "Create a human-readable report from diagnosis data".to_string(),
        tags: vec![
            "reporting".to_string(),
            "healthcare".to_string(),
            "medical-reports".to_string(),
        ],
        examples: vec![SkillExample {
            description: "Generate report from diagnosis".to_string(),
            input: json!({"diagnosis": {"condition": "Hypertension", "risk": "Medium"}}),
            output: json!({
                "report": "{\n  \"Condition\": \"Hypertension\",\n  \"RiskLevel\": \"Medium\",\n  \"Recommendations\": [\n    \"Follow up in 2 weeks\",\n    \"Monitor vitals daily\"\n  ]\n}"
            }),
        }],
        input_schema: Schema::object().required_property(
            "diagnosis",
            Schema::object()
                .required_property("condition", Schema::string())
                .required_property("risk", Schema::string()),
        ),
        output_schema: Schema::object().required_property(
            "report",
            Schema::string().describe("Formatted medical report (JSON text)"),
        ),
        invocation: InvocationEndpoint::post_json(format!("/skills/{}", SKILL_ID)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub diagnosis: Diagnosis,
}

/// Deterministic formatter for `generate-report`.
pub struct ReportFormatter;

#[async_trait]
impl SkillHandler for ReportFormatter {
    type Params = ReportParams;
    type Output = String;

    async fn handle(&self, params: ReportParams) -> anyhow::Result<String> {
        format_report(&params.diagnosis)
    }
}

pub fn format_report(diagnosis: &Diagnosis) -> anyhow::Result<String> {
    let report = MedicalReport {
        condition: diagnosis.condition.clone(),
        risk_level: diagnosis.risk.clone(),
        recommendations: STANDARD_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::records::RiskLevel;

    #[test]
    fn test_format_matches_example() {
        let report = format_report(&Diagnosis::new("Hypertension", RiskLevel::Medium))
            .expect("format");
        let example = skill().examples[0].output["report"].clone();
        assert_eq!(report, example.as_str().expect("string"));
    }

    #[tokio::test]
    async fn test_missing_fields_render_unknown() {
        let params: ReportParams =
            serde_json::from_value(json!({"diagnosis": {"note": "n/a"}})).expect("decode");
        let report = ReportFormatter.handle(params).await.expect("report");
        let parsed: MedicalReport = serde_json::from_str(&report).expect("parse");
        assert_eq!(parsed.condition, "Unknown");
        assert_eq!(parsed.risk_level, "Unknown");
        assert_eq!(parsed.recommendations.len(), 2);
    }

    #[test]
    fn test_risk_passes_through_unchanged() {
        for risk in ["high", "Severe"] {
            let diagnosis = Diagnosis {
                condition: "Hypertension".to_string(),
                risk: risk.to_string(),
            };
            let report = format_report(&diagnosis).expect("format");
            let parsed: MedicalReport = serde_json::from_str(&report).expect("parse");
            assert_eq!(parsed.risk_level, risk);
            assert_eq!(parsed.condition, "Hypertension");
        }
    }
}
