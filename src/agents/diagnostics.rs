//! Diagnostics agent: turns symptoms and vitals into a probable diagnosis.
//!
//! The built-in handler is a rule-based triage over vital signs. It stands in
//! for a model-backed analyzer behind the same [`SkillHandler`] seam.

use crate::a2a::dispatcher::SkillHandler;
use crate::a2a::manifest::AgentIdentity;
use crate::a2a::types::*;
use crate::agents::records::{Diagnosis, RiskLevel};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const IDENTITY: AgentIdentity = AgentIdentity {
    id: "diagnostics-agent",
    name: "DiagnosticsAgent",
    description: "Analyzes patient symptoms and vitals to return a probable diagnosis.",
    tags: &["healthcare", "diagnosis", "medical"],
};

pub const SKILL_ID: &str = "analyze-patient-data";

pub fn skill() -> SkillDescriptor {
    SkillDescriptor {
        id: SKILL_ID.to_string(),
        name: "Analyze Patient Data".to_string(),
        description: "Analyze symptoms & vitals to derive a medical diagnosis".to_string(),
        tags: vec![
            "diagnosis".to_string(),
            "healthcare".to_string(),
            "medical-analysis".to_string(),
        ],
        examples: vec![SkillExample {
            description: "Analyze patient with respiratory symptoms".to_string(),
            input: json!({
                "patient_data": {
                    "symptoms": ["persistent cough", "fever", "shortness of breath"],
                    "vitals": {"temperature": "101.5 F", "pulse": "110 bpm", "spo2": "94%"}
                }
            }),
            output: json!({
                "diagnosis": {"condition": "Possible respiratory infection", "risk": "Medium"}
            }),
        }],
        input_schema: Schema::object().required_property(
            "patient_data",
            Schema::object()
                .required_property(
                    "symptoms",
                    Schema::array_of(Schema::string()).describe("List of patient symptoms"),
                )
                .property("vitals", Schema::object().describe("Patient vital signs")),
        ),
        output_schema: Schema::object().required_property(
            "diagnosis",
            Schema::object()
                .required_property("condition", Schema::string())
                .required_property("risk", Schema::string().one_of(&["Low", "Medium", "High"])),
        ),
        invocation: InvocationEndpoint::post_json(format!("/skills/{}", SKILL_ID)),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientData {
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub patient_data: PatientData,
}

/// Rule-based triage handler for `analyze-patient-data`.
pub struct TriageHandler;

#[async_trait]
impl SkillHandler for TriageHandler {
    type Params = AnalyzeParams;
    type Output = Diagnosis;

    async fn handle(&self, params: AnalyzeParams) -> anyhow::Result<Diagnosis> {
        Ok(triage(&params.patient_data))
    }
}

struct Finding {
    condition: &'static str,
    risk: RiskLevel,
}

impl Finding {
    fn new(condition: &'static str, risk: RiskLevel) -> Self {
        Self { condition, risk }
    }
}

const RESPIRATORY: [&str; 3] = ["cough", "breath", "wheez"];

/// Pick the most severe finding; ties go to the first rule that fired.
pub fn triage(patient: &PatientData) -> Diagnosis {
    let mut findings = Vec::new();

    let bp = vital(patient, &["bp", "blood_pressure"]).and_then(blood_pressure);
    if let Some((systolic, diastolic)) = bp {
        if systolic >= 180.0 || diastolic >= 120.0 {
            findings.push(Finding::new("Hypertensive crisis", RiskLevel::High));
        } else if systolic >= 160.0 || diastolic >= 100.0 {
            findings.push(Finding::new("Hypertension", RiskLevel::High));
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            findings.push(Finding::new("Hypertension", RiskLevel::Medium));
        }
    }

    let respiratory = has_symptom(patient, &RESPIRATORY);

    if let Some(spo2) = vital(patient, &["spo2", "oxygen_saturation"]).and_then(number) {
        if spo2 < 90.0 {
            findings.push(Finding::new("Hypoxemia", RiskLevel::High));
        } else if spo2 < 95.0 && respiratory {
            findings.push(Finding::new(
                "Possible respiratory infection",
                RiskLevel::Medium,
            ));
        }
    }

    if let Some(temp_f) = vital(patient, &["temperature", "temp"]).and_then(fahrenheit) {
        if temp_f >= 103.0 {
            findings.push(Finding::new("High fever", RiskLevel::High));
        } else if temp_f >= 100.4 && respiratory {
            findings.push(Finding::new(
                "Possible respiratory infection",
                RiskLevel::Medium,
            ));
        } else if temp_f >= 100.4 {
            findings.push(Finding::new("Febrile illness", RiskLevel::Low));
        }
    }

    if let Some(pulse) = vital(patient, &["pulse", "heart_rate"]).and_then(number) {
        if pulse > 130.0 {
            findings.push(Finding::new("Tachycardia", RiskLevel::High));
        } else if pulse > 100.0 {
            findings.push(Finding::new("Tachycardia", RiskLevel::Medium));
        }
    }

    let worst = findings
        .iter()
        .fold(None::<&Finding>, |worst, f| match worst {
            Some(w) if w.risk >= f.risk => Some(w),
            _ => Some(f),
        });

    match worst {
        Some(f) => Diagnosis::new(f.condition, f.risk),
        None if patient.symptoms.is_empty() => Diagnosis::new("No acute findings", RiskLevel::Low),
        None => Diagnosis::new("Non-specific symptoms", RiskLevel::Low),
    }
}

fn vital<'a>(patient: &'a PatientData, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| patient.vitals.get(*k))
}

fn has_symptom(patient: &PatientData, needles: &[&str]) -> bool {
    patient.symptoms.iter().any(|s| {
        let s = s.to_lowercase();
        needles.iter().any(|n| s.contains(n))
    })
}

/// Leading numeric part of a vital: `90`, `"110 bpm"`, `"94%"`.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Temperature in Fahrenheit; bare values under 50 are read as Celsius.
fn fahrenheit(value: &Value) -> Option<f64> {
    let reading = number(value)?;
    let celsius = match value {
        Value::String(s) => {
            let unit = s
                .trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
                .trim();
            unit.to_uppercase().starts_with('C') || (unit.is_empty() && reading < 50.0)
        }
        _ => reading < 50.0,
    };
    Some(if celsius { reading * 9.0 / 5.0 + 32.0 } else { reading })
}

/// `"150/95"` → `(150, 95)`.
fn blood_pressure(value: &Value) -> Option<(f64, f64)> {
    let s = value.as_str()?;
    let (sys, dia) = s.split_once('/')?;
    let sys = number(&Value::String(sys.to_string()))?;
    let dia = number(&Value::String(dia.to_string()))?;
    Some((sys, dia))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(symptoms: &[&str], vitals: Value) -> PatientData {
        PatientData {
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            vitals: vitals.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_demo_patient_is_medium_hypertension() {
        let p = patient(
            &["headache", "dizziness", "chest pain"],
            json!({"bp": "150/95", "pulse": 90, "temperature": "99.2 F"}),
        );
        assert_eq!(triage(&p), Diagnosis::new("Hypertension", RiskLevel::Medium));
    }

    #[test]
    fn test_respiratory_example() {
        let p = patient(
            &["persistent cough", "fever", "shortness of breath"],
            json!({"temperature": "101.5 F", "pulse": "110 bpm", "spo2": "94%"}),
        );
        let d = triage(&p);
        assert_eq!(d.condition, "Possible respiratory infection");
        assert_eq!(d.risk, "Medium");
    }

    #[test]
    fn test_most_severe_finding_wins() {
        let p = patient(&["confusion"], json!({"bp": "150/95", "spo2": 86}));
        let d = triage(&p);
        assert_eq!(d.condition, "Hypoxemia");
        assert_eq!(d.risk, "High");
    }

    #[test]
    fn test_celsius_fever() {
        let p = patient(&["chills"], json!({"temperature": "39.8 C"}));
        assert_eq!(triage(&p).risk, "High");
    }

    #[test]
    fn test_no_vitals() {
        let p = patient(&["fatigue"], json!({}));
        let d = triage(&p);
        assert_eq!(d.condition, "Non-specific symptoms");
        assert_eq!(d.risk, "Low");
    }
}
