//! Admin agent: schedules a follow-up appointment from a medical report.
//!
//! High-risk reports get a follow-up in one week, everything else in two.
//! Reports that are not structured JSON take a logged degradation path: a
//! booking URL found in the free text is reused, otherwise a generic
//! calendar link is synthesized.

use crate::a2a::dispatcher::SkillHandler;
use crate::a2a::manifest::AgentIdentity;
use crate::a2a::types::*;
use crate::agents::records::{MedicalReport, RiskLevel};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const IDENTITY: AgentIdentity = AgentIdentity {
    id: "admin-agent",
    name: "AdminAgent",
    description: "Schedules patient follow-up appointments based on medical reports.",
    tags: &["healthcare", "scheduling", "admin"],
};

pub const SKILL_ID: &str = "schedule-followup";

pub const HIGH_RISK_FOLLOWUP_DAYS: i64 = 7;
pub const DEFAULT_FOLLOWUP_DAYS: i64 = 14;

const CALENDAR_BASE: &str = "https://calendar.google.com/calendar/event?action=TEMPLATE";
const GENERIC_TITLE: &str = "Follow-up Appointment";

static URL_PATTERN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"https?://\S+"));

pub fn skill() -> SkillDescriptor {
    SkillDescriptor {
        id: SKILL_ID.to_string(),
        name: "Schedule Follow-up".to_string(),
        description: "Schedule a follow-up appointment based on medical report".to_string(),
        tags: vec![
            "scheduling".to_string(),
            "admin".to_string(),
            "healthcare".to_string(),
        ],
        examples: vec![SkillExample {
            description: "Schedule based on hypertension report".to_string(),
            input: json!({
                "report": "{\n  \"Condition\": \"Hypertension\",\n  \"RiskLevel\": \"Medium\",\n  \"Recommendations\": [\n    \"Follow up in 2 weeks\",\n    \"Monitor vitals daily\"\n  ]\n}"
            }),
            output: json!({
                "appointment_info": {
                    "appointment": "2025-06-25T10:00:00Z",
                    "link": "https://example.com/appointment"
                }
            }),
        }],
        input_schema: Schema::object().required_property(
            "report",
            Schema::string().describe("Medical report in JSON format"),
        ),
        output_schema: Schema::object().required_property(
            "appointment_info",
            Schema::object()
                .required_property("appointment", Schema::string())
                .property("link", Schema::string()),
        ),
        invocation: InvocationEndpoint::post_json(format!("/skills/{}", SKILL_ID)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleParams {
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInfo {
    pub appointment: String,
    pub link: String,
}

/// Scheduler for `schedule-followup`.
pub struct FollowupScheduler;

#[async_trait]
impl SkillHandler for FollowupScheduler {
    type Params = ScheduleParams;
    type Output = AppointmentInfo;

    async fn handle(&self, params: ScheduleParams) -> anyhow::Result<AppointmentInfo> {
        Ok(plan_followup(&params.report, Utc::now()))
    }
}

/// Schedule a follow-up for `report` relative to `now`.
pub fn plan_followup(report: &str, now: DateTime<Utc>) -> AppointmentInfo {
    match serde_json::from_str::<MedicalReport>(report) {
        Ok(parsed) => {
            let date = now + Duration::days(followup_days(&parsed));
            let title = format!("Follow-up: {}", parsed.condition);
            AppointmentInfo {
                appointment: format_appointment(date),
                link: calendar_link(&title, date),
            }
        }
        Err(e) => {
            tracing::warn!(
                "Report is not structured JSON ({}); scheduling default {}-day follow-up",
                e,
                DEFAULT_FOLLOWUP_DAYS
            );
            let date = now + Duration::days(DEFAULT_FOLLOWUP_DAYS);
            let link = match extract_link(report) {
                Some(link) => link,
                None => {
                    tracing::warn!("No booking URL in report; synthesizing calendar link");
                    calendar_link(GENERIC_TITLE, date)
                }
            };
            AppointmentInfo {
                appointment: format_appointment(date),
                link,
            }
        }
    }
}

fn followup_days(report: &MedicalReport) -> i64 {
    if report.risk() == Some(RiskLevel::High) {
        HIGH_RISK_FOLLOWUP_DAYS
    } else {
        DEFAULT_FOLLOWUP_DAYS
    }
}

fn format_appointment(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Google Calendar template link for a single-instant event.
pub fn calendar_link(title: &str, date: DateTime<Utc>) -> String {
    let stamp = date.format("%Y%m%dT%H%M%S").to_string();
    format!(
        "{}&text={}&dates={}/{}",
        CALENDAR_BASE,
        urlencoding::encode(title),
        stamp,
        stamp
    )
}

/// First `http(s)://` URL in free text.
pub fn extract_link(text: &str) -> Option<String> {
    let pattern = URL_PATTERN.as_ref().ok()?;
    pattern.find(text).map(|m| m.as_str().to_string())
}
