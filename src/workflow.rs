//! Three-stage care workflow: diagnostics → report → admin.
//!
//! ```text
//! Start ─▶ DiagnosticsInvoked ─▶ ReportInvoked ─▶ AdminInvoked ─▶ Done
//!   └──────────────┴─────────────────┴────────────────┴──▶ Failed
//! ```
//!
//! Each step's extracted output becomes the next step's only parameter.
//! A failed step ends the run: later steps are never invoked, nothing is
//! substituted and nothing is retried.

use crate::a2a::client::AgentCaller;
use crate::a2a::error::ClientError;
use crate::a2a::types::AgentManifest;
use crate::agents::{admin, diagnostics, report, AgentKind};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowState {
    Start,
    DiagnosticsInvoked,
    ReportInvoked,
    AdminInvoked,
    Done,
    Failed,
}

/// One hop of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowStep {
    pub agent: AgentKind,
    pub skill_id: &'static str,
    /// Parameter name the carried value is sent under.
    pub input_key: &'static str,
    /// Result member extracted and carried forward.
    pub output_key: &'static str,
    /// State reached once the step succeeds.
    pub reached: WorkflowState,
}

pub const PIPELINE: [WorkflowStep; 3] = [
    WorkflowStep {
        agent: AgentKind::Diagnostics,
        skill_id: diagnostics::SKILL_ID,
        input_key: "patient_data",
        output_key: "diagnosis",
        reached: WorkflowState::DiagnosticsInvoked,
    },
    WorkflowStep {
        agent: AgentKind::Report,
        skill_id: report::SKILL_ID,
        input_key: "diagnosis",
        output_key: "report",
        reached: WorkflowState::ReportInvoked,
    },
    WorkflowStep {
        agent: AgentKind::Admin,
        skill_id: admin::SKILL_ID,
        input_key: "report",
        output_key: "appointment_info",
        reached: WorkflowState::AdminInvoked,
    },
];

/// Per-run state. Dropped when the run ends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    /// Correlation id for logs; never sent over the wire.
    pub conversation_id: Uuid,
    pub state: WorkflowState,
    pub diagnosis: Option<Value>,
    pub report: Option<Value>,
    pub appointment_info: Option<Value>,
}

impl WorkflowContext {
    fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            state: WorkflowState::Start,
            diagnosis: None,
            report: None,
            appointment_info: None,
        }
    }

    fn record(&mut self, step: &WorkflowStep, output: Value) {
        match step.agent {
            AgentKind::Diagnostics => self.diagnosis = Some(output),
            AgentKind::Report => self.report = Some(output),
            AgentKind::Admin => self.appointment_info = Some(output),
        }
        self.state = step.reached;
    }

    fn field<'a>(value: &'a Option<Value>, key: &str) -> &'a str {
        value
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .unwrap_or("N/A")
    }

    pub fn condition(&self) -> &str {
        Self::field(&self.diagnosis, "condition")
    }

    pub fn risk(&self) -> &str {
        Self::field(&self.diagnosis, "risk")
    }

    pub fn appointment(&self) -> &str {
        Self::field(&self.appointment_info, "appointment")
    }

    pub fn link(&self) -> &str {
        Self::field(&self.appointment_info, "link")
    }

    /// Human-readable run summary.
    pub fn summary(&self) -> String {
        let report = self
            .report
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or("N/A");
        format!(
            "[Diagnostics] Result:\n   • Condition: {}\n   • Risk Level: {}\n\n\
             [Report] Generated:\n   {}\n\n\
             [Admin] Appointment Scheduled:\n   • Date: {}\n   • Link: {}\n\n\
             Workflow {:?}. Conversation ID: {}",
            self.condition(),
            self.risk(),
            report,
            self.appointment(),
            self.link(),
            self.state,
            self.conversation_id
        )
    }
}

/// Why a step failed.
#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("result has no '{key}' member")]
    MissingOutput { key: &'static str },
}

impl StepFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(e) => e.kind(),
            Self::MissingOutput { .. } => "MissingOutput",
        }
    }
}

/// Terminal failure of a run. The context is in the `Failed` state and
/// keeps whatever the completed steps produced.
#[derive(Debug, thiserror::Error)]
#[error("workflow failed at {step} ({kind}): {cause}", kind = .cause.kind())]
pub struct WorkflowError {
    pub step: AgentKind,
    pub context: Box<WorkflowContext>,
    #[source]
    pub cause: StepFailure,
}

/// Static mapping of agents to base URLs.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    urls: HashMap<AgentKind, String>,
}

impl AgentDirectory {
    pub fn new(urls: impl IntoIterator<Item = (AgentKind, String)>) -> Self {
        Self {
            urls: urls.into_iter().collect(),
        }
    }

    pub fn base_url(&self, agent: AgentKind) -> String {
        self.urls
            .get(&agent)
            .cloned()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", agent.default_port()))
    }
}

/// Drives [`PIPELINE`] through an [`AgentCaller`].
///
/// Manifests are cached per base URL and reused across runs.
pub struct Orchestrator<C> {
    caller: C,
    directory: AgentDirectory,
    manifests: HashMap<String, Arc<AgentManifest>>,
}

impl<C: AgentCaller> Orchestrator<C> {
    pub fn new(caller: C, directory: AgentDirectory) -> Self {
        Self {
            caller,
            directory,
            manifests: HashMap::new(),
        }
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    /// Run the pipeline for one patient.
    pub async fn run(
        &mut self,
        patient_data: Value,
        cancel: &CancellationToken,
    ) -> Result<WorkflowContext, WorkflowError> {
        let mut context = WorkflowContext::new();
        tracing::info!(
            conversation_id = %context.conversation_id,
            "Starting A2A workflow"
        );

        let mut carried = patient_data;
        for (n, step) in PIPELINE.iter().enumerate() {
            tracing::info!(
                conversation_id = %context.conversation_id,
                "Step {}: invoking {} ({})",
                n + 1,
                step.agent,
                step.skill_id
            );
            match self.run_step(step, carried, cancel).await {
                Ok(output) => {
                    context.record(step, output.clone());
                    carried = output;
                }
                Err(cause) => {
                    context.state = WorkflowState::Failed;
                    tracing::error!(
                        conversation_id = %context.conversation_id,
                        step = %step.agent,
                        kind = cause.kind(),
                        "Workflow failed: {}",
                        cause
                    );
                    return Err(WorkflowError {
                        step: step.agent,
                        context: Box::new(context),
                        cause,
                    });
                }
            }
        }

        context.state = WorkflowState::Done;
        tracing::info!(
            conversation_id = %context.conversation_id,
            "A2A workflow completed"
        );
        Ok(context)
    }

    async fn run_step(
        &mut self,
        step: &WorkflowStep,
        input: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, StepFailure> {
        let manifest = self.manifest_for(step.agent, cancel).await?;

        let mut params = Map::new();
        params.insert(step.input_key.to_string(), input);

        let mut result = self
            .caller
            .invoke(&manifest, step.skill_id, params, cancel)
            .await?;
        result
            .remove(step.output_key)
            .ok_or(StepFailure::MissingOutput {
                key: step.output_key,
            })
    }

    async fn manifest_for(
        &mut self,
        agent: AgentKind,
        cancel: &CancellationToken,
    ) -> Result<Arc<AgentManifest>, ClientError> {
        let base_url = self.directory.base_url(agent);
        if let Some(cached) = self.manifests.get(&base_url) {
            return Ok(cached.clone());
        }

        let manifest = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            m = self.caller.discover(&base_url) => Arc::new(m?),
        };
        self.manifests.insert(base_url, manifest.clone());
        Ok(manifest)
    }
}

/// Demo patient used when no input file is given.
pub fn demo_patient() -> Value {
    json!({
        "symptoms": ["headache", "dizziness", "chest pain"],
        "vitals": {"bp": "150/95", "pulse": 90, "temperature": "99.2 F"}
    })
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted caller: answers each skill with a canned result or error.
    #[derive(Default)]
    struct ScriptedCaller {
        discovered: Mutex<Vec<String>>,
        invoked: Mutex<Vec<(String, Map<String, Value>)>>,
        fail_skill: Option<&'static str>,
        drop_output: Option<&'static str>,
    }

    impl ScriptedCaller {
        fn invocations(&self, skill: &str) -> usize {
            self.invoked
                .lock()
                .expect("lock")
                .iter()
                .filter(|(s, _)| s == skill)
                .count()
        }
    }

    #[async_trait]
    impl AgentCaller for ScriptedCaller {
        async fn discover(&self, base_url: &str) -> Result<AgentManifest, ClientError> {
            self.discovered.lock().expect("lock").push(base_url.to_string());
            let kind = AgentKind::ALL
                .into_iter()
                .find(|k| base_url.ends_with(&k.default_port().to_string()))
                .ok_or_else(|| ClientError::Discovery {
                    url: base_url.to_string(),
                    reason: "unknown agent".to_string(),
                })?;
            Ok(kind.manifest(base_url))
        }

        async fn invoke(
            &self,
            manifest: &AgentManifest,
            skill_id: &str,
            params: Map<String, Value>,
            _cancel: &CancellationToken,
        ) -> Result<Map<String, Value>, ClientError> {
            self.invoked
                .lock()
                .expect("lock")
                .push((skill_id.to_string(), params.clone()));
            if self.fail_skill == Some(skill_id) {
                return Err(ClientError::Transport {
                    url: manifest.service_url().to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            let (key, value) = match skill_id {
                "analyze-patient-data" => (
                    "diagnosis",
                    json!({"condition": "Hypertension", "risk": "Medium"}),
                ),
                "generate-report" => ("report", json!("{\"Condition\": \"Hypertension\"}")),
                _ => (
                    "appointment_info",
                    json!({"appointment": "2025-06-25T10:00:00Z", "link": "https://cal/x"}),
                ),
            };
            let mut result = Map::new();
            if self.drop_output != Some(skill_id) {
                result.insert(key.to_string(), value);
            }
            Ok(result)
        }
    }

    fn orchestrator(caller: ScriptedCaller) -> Orchestrator<ScriptedCaller> {
        Orchestrator::new(caller, AgentDirectory::default())
    }

    #[tokio::test]
    async fn test_happy_path_threads_outputs() {
        let mut orch = orchestrator(ScriptedCaller::default());
        let ctx = orch
            .run(demo_patient(), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(ctx.state, WorkflowState::Done);
        assert_eq!(ctx.condition(), "Hypertension");
        assert_eq!(ctx.appointment(), "2025-06-25T10:00:00Z");

        let invoked = orch.caller().invoked.lock().expect("lock").clone();
        assert_eq!(invoked.len(), 3);
        assert_eq!(invoked[0].1.get("patient_data"), Some(&demo_patient()));
        assert_eq!(invoked[1].1.get("diagnosis"), ctx.diagnosis.as_ref());
        assert_eq!(invoked[2].1.get("report"), ctx.report.as_ref());
    }

    #[tokio::test]
    async fn test_report_transport_failure_stops_pipeline() {
        let mut orch = orchestrator(ScriptedCaller {
            fail_skill: Some("generate-report"),
            ..Default::default()
        });
        let err = orch
            .run(demo_patient(), &CancellationToken::new())
            .await
            .expect_err("should fail");

        assert_eq!(err.step, AgentKind::Report);
        assert_eq!(err.context.state, WorkflowState::Failed);
        assert_eq!(err.cause.kind(), "TransportError");
        assert!(err.context.diagnosis.is_some());
        assert!(err.context.report.is_none());
        assert_eq!(orch.caller().invocations("schedule-followup"), 0);
        assert_eq!(orch.caller().discovered.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn test_missing_output_is_not_substituted() {
        let mut orch = orchestrator(ScriptedCaller {
            drop_output: Some("analyze-patient-data"),
            ..Default::default()
        });
        let err = orch
            .run(demo_patient(), &CancellationToken::new())
            .await
            .expect_err("should fail");

        assert_eq!(err.step, AgentKind::Diagnostics);
        assert!(matches!(err.cause, StepFailure::MissingOutput { key: "diagnosis" }));
        assert_eq!(orch.caller().invocations("generate-report"), 0);
    }

    #[tokio::test]
    async fn test_manifests_cached_across_runs() {
        let mut orch = orchestrator(ScriptedCaller::default());
        let cancel = CancellationToken::new();
        orch.run(demo_patient(), &cancel).await.expect("first run");
        let second = orch.run(demo_patient(), &cancel).await.expect("second run");

        assert_eq!(orch.caller().discovered.lock().expect("lock").len(), 3);
        assert_eq!(orch.caller().invocations("schedule-followup"), 2);
        assert_eq!(second.state, WorkflowState::Done);
    }

    #[tokio::test]
    async fn test_discovery_failure_fails_first_step() {
        let directory =
            AgentDirectory::new([(AgentKind::Diagnostics, "http://nowhere:1".to_string())]);
        let mut orch = Orchestrator::new(ScriptedCaller::default(), directory);
        let err = orch
            .run(demo_patient(), &CancellationToken::new())
            .await
            .expect_err("should fail");

        assert_eq!(err.step, AgentKind::Diagnostics);
        assert_eq!(err.cause.kind(), "DiscoveryError");
        assert!(orch.caller().invoked.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut orch = orchestrator(ScriptedCaller::default());
        let err = orch.run(demo_patient(), &cancel).await.expect_err("cancelled");
        assert_eq!(err.cause.kind(), "Cancelled");
        assert_eq!(err.context.state, WorkflowState::Failed);
    }

    #[test]
    fn test_summary_mentions_outputs() {
        let mut ctx = WorkflowContext::new();
        ctx.record(
            &PIPELINE[0],
            json!({"condition": "Hypertension", "risk": "Medium"}),
        );
        let summary = ctx.summary();
        assert!(summary.contains("Condition: Hypertension"));
        assert!(summary.contains("Date: N/A"));
        assert_eq!(ctx.state, WorkflowState::DiagnosticsInvoked);
    }
}
