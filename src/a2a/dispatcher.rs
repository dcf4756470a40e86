//! Skill dispatcher: validates inbound JSON-RPC envelopes and routes them to
//! bound skill handlers.
//!
//! Validation is ordered and short-circuiting:
//! 1. envelope has `jsonrpc`, `method`, `params`, `id`  → -32600
//! 2. `jsonrpc == "2.0"`                               → -32600
//! 3. `method == "invoke"`                             → -32601
//! 4. required params present and non-empty            → -32602
//! 5. handler runs; any failure                        → -32603

use crate::a2a::error::DispatchError;
use crate::a2a::manifest::ManifestValidationError;
use crate::a2a::types::*;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

const ENVELOPE_FIELDS: [&str; 4] = ["jsonrpc", "method", "params", "id"];

/// Domain computation behind a skill.
///
/// `Params` is decoded from the JSON-RPC `params` object once presence
/// checks have passed, so handlers only ever see typed input.
#[async_trait]
pub trait SkillHandler: Send + Sync + 'static {
    type Params: DeserializeOwned + Send;
    type Output: Serialize + Send;

    async fn handle(&self, params: Self::Params) -> anyhow::Result<Self::Output>;
}

/// Type-erased handler stored in the dispatcher.
#[async_trait]
trait BoundSkill: Send + Sync {
    async fn call(&self, params: Map<String, Value>) -> Result<Value, DispatchError>;
}

struct Bound<H>(H);

#[async_trait]
impl<H: SkillHandler> BoundSkill for Bound<H> {
    async fn call(&self, params: Map<String, Value>) -> Result<Value, DispatchError> {
        let typed: H::Params = serde_json::from_value(Value::Object(params))
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;
        let output = self
            .0
            .handle(typed)
            .await
            .map_err(|e| DispatchError::Internal(format!("{e:#}")))?;
        serde_json::to_value(output).map_err(|e| DispatchError::Internal(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("skill '{0}' is not declared in the manifest")]
    UnknownSkill(String),

    #[error(transparent)]
    Manifest(#[from] ManifestValidationError),
}

/// Per-service request handler.
#[derive(Clone)]
pub struct SkillDispatcher {
    manifest: Arc<AgentManifest>,
    skills: HashMap<String, Arc<dyn BoundSkill>>,
}

impl SkillDispatcher {
    pub fn new(manifest: AgentManifest) -> Result<Self, BindError> {
        manifest.validate()?;
        Ok(Self {
            manifest: Arc::new(manifest),
            skills: HashMap::new(),
        })
    }

    /// Bind `handler` to a skill declared in the manifest.
    pub fn bind<H: SkillHandler>(mut self, skill_id: &str, handler: H) -> Result<Self, BindError> {
        if self.manifest.skill(skill_id).is_none() {
            return Err(BindError::UnknownSkill(skill_id.to_string()));
        }
        self.skills
            .insert(skill_id.to_string(), Arc::new(Bound(handler)));
        Ok(self)
    }

    pub fn manifest(&self) -> &Arc<AgentManifest> {
        &self.manifest
    }

    /// Descriptors of every skill that has a handler bound.
    pub fn bound_skills(&self) -> impl Iterator<Item = &SkillDescriptor> {
        self.manifest
            .skills()
            .iter()
            .filter(|s| self.skills.contains_key(&s.id))
    }

    /// Handle one raw request body addressed to `skill_id`.
    ///
    /// Always yields a well-formed response; failures are encoded as
    /// JSON-RPC errors.
    pub async fn handle_invoke(&self, skill_id: &str, body: &[u8]) -> JsonRpcResponse {
        let envelope: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(skill = %skill_id, "A2A: unparseable request body: {}", e);
                return DispatchError::MalformedRequest("body is not valid JSON".to_string())
                    .into_response(Value::Null);
            }
        };
        let id = envelope.get("id").cloned().unwrap_or(Value::Null);
        let method = envelope
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match self.dispatch(skill_id, envelope).await {
            Ok(result) => {
                tracing::info!(
                    skill = %skill_id,
                    method = %method,
                    outcome = "success",
                    "A2A: skill invoked"
                );
                JsonRpcResponse::success(id, result)
            }
            Err(err) => {
                if err.is_client_fault() {
                    tracing::warn!(
                        skill = %skill_id,
                        method = %method,
                        code = err.code(),
                        "A2A: rejected invocation: {}",
                        err
                    );
                } else {
                    tracing::error!(
                        skill = %skill_id,
                        method = %method,
                        code = err.code(),
                        "A2A: skill failed: {:?}",
                        err
                    );
                }
                err.into_response(id)
            }
        }
    }

    async fn dispatch(
        &self,
        skill_id: &str,
        envelope: Value,
    ) -> Result<Map<String, Value>, DispatchError> {
        let Value::Object(mut envelope) = envelope else {
            return Err(DispatchError::MalformedRequest(
                "request must be a JSON object".to_string(),
            ));
        };

        if !ENVELOPE_FIELDS.iter().all(|k| envelope.contains_key(*k)) {
            return Err(DispatchError::MalformedRequest(
                "Missing required JSON-RPC fields".to_string(),
            ));
        }

        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(DispatchError::MalformedRequest(
                "jsonrpc must be '2.0'".to_string(),
            ));
        }

        match envelope.get("method").unwrap_or(&Value::Null) {
            Value::String(m) if m == INVOKE_METHOD => {}
            Value::String(m) => return Err(DispatchError::UnknownMethod(m.clone())),
            other => return Err(DispatchError::UnknownMethod(other.to_string())),
        }

        let skill = self.manifest.skill(skill_id).ok_or_else(|| {
            DispatchError::Internal(format!("skill '{}' is not declared", skill_id))
        })?;
        let handler = self.skills.get(skill_id).ok_or_else(|| {
            DispatchError::Internal(format!("no handler bound for '{}'", skill_id))
        })?;

        let params = match envelope.remove("params") {
            Some(Value::Object(p)) => p,
            _ => {
                return Err(DispatchError::InvalidParams(
                    "params must be an object".to_string(),
                ));
            }
        };

        for field in &skill.input_schema.required {
            if params.get(field).is_none_or(is_blank) {
                return Err(DispatchError::InvalidParams(format!("Missing '{}'", field)));
            }
        }

        let output = handler.call(params).await?;

        let key = skill.result_key().ok_or_else(|| {
            DispatchError::Internal(format!("skill '{}' declares no output key", skill_id))
        })?;
        let mut result = Map::new();
        result.insert(key.to_string(), output);
        Ok(result)
    }
}

/// Falsy-style emptiness for required parameters: null, false, zero and
/// empty strings, arrays or objects.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}
