//! Caller side of the A2A protocol.
//!
//! Fetches manifests, resolves skills and performs JSON-RPC invocations over
//! one process-wide `reqwest::Client`. Every call is bounded by the client
//! timeout and can be abandoned through a `CancellationToken`. Nothing is
//! retried.

use crate::a2a::error::ClientError;
use crate::a2a::types::*;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Upper bound on a single discovery or invocation round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

static SHARED_HTTP: OnceCell<reqwest::Client> = OnceCell::new();

/// Outbound A2A operations, as seen by the workflow orchestrator.
#[async_trait]
pub trait AgentCaller: Send + Sync {
    /// Fetch and parse the manifest published under `base_url`.
    async fn discover(&self, base_url: &str) -> Result<AgentManifest, ClientError>;

    /// Invoke `skill_id` on the agent described by `manifest` and return the
    /// `result` member untouched.
    async fn invoke(
        &self,
        manifest: &AgentManifest,
        skill_id: &str,
        params: Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Map<String, Value>, ClientError>;
}

/// HTTP implementation of [`AgentCaller`].
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
}

impl A2aClient {
    /// Client backed by the process-wide HTTP handle.
    ///
    /// The handle is built on first use; `timeout` only takes effect for
    /// that first call.
    pub fn shared(timeout: Duration) -> Result<Self, ClientError> {
        let http = SHARED_HTTP.get_or_try_init(|| build_http(timeout))?;
        Ok(Self { http: http.clone() })
    }

    /// Client with its own HTTP handle and timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http(timeout)?,
        })
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Transport {
            url: String::new(),
            reason: format!("failed to build HTTP client: {}", e),
        })
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out ({})", e)
    } else if e.is_connect() {
        format!("connection failed ({})", e)
    } else {
        e.to_string()
    }
}

/// Resolve a skill on a discovered manifest.
///
/// Returns `NotDiscovered` when no manifest has been fetched yet and
/// `Ok(None)` when the manifest lacks the skill.
pub fn find_skill<'a>(
    manifest: Option<&'a AgentManifest>,
    skill_id: &str,
) -> Result<Option<&'a SkillDescriptor>, ClientError> {
    let manifest = manifest.ok_or(ClientError::NotDiscovered)?;
    Ok(manifest.skill(skill_id))
}

#[async_trait]
impl AgentCaller for A2aClient {
    async fn discover(&self, base_url: &str) -> Result<AgentManifest, ClientError> {
        let url = format!("{}/.well-known/agent.json", base_url.trim_end_matches('/'));
        tracing::info!("Discovering agent at: {}", url);

        let discovery = |reason: String| ClientError::Discovery {
            url: url.clone(),
            reason,
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| discovery(describe(&e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(discovery(format!("HTTP {}", status)));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| discovery(describe(&e)))?;

        let manifest: AgentManifest =
            serde_json::from_slice(&body).map_err(|e| ClientError::Manifest {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        manifest.check_shape().map_err(|e| ClientError::Manifest {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            "Discovered agent: {} (protocol {})",
            manifest.metadata.name,
            manifest.api_version
        );
        Ok(manifest)
    }

    async fn invoke(
        &self,
        manifest: &AgentManifest,
        skill_id: &str,
        params: Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Map<String, Value>, ClientError> {
        let skill = find_skill(Some(manifest), skill_id)?.ok_or_else(|| {
            ClientError::SkillNotFound {
                skill_id: skill_id.to_string(),
                agent_id: manifest.id().to_string(),
            }
        })?;
        let url = manifest.endpoint_url(skill);
        let request = JsonRpcRequest::invoke(Uuid::new_v4().to_string(), params);

        tracing::info!("Invoking skill '{}' at {}", skill_id, url);
        tracing::debug!("Request payload: {:?}", request);

        let transport = |reason: String| ClientError::Transport {
            url: url.clone(),
            reason,
        };

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| transport(describe(&e)))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| transport(describe(&e)))?;
            if !status.is_success() {
                let detail = serde_json::from_slice::<JsonRpcResponse>(&body)
                    .ok()
                    .and_then(|r| {
                        r.error_body()
                            .map(|e| format!(": {} (code {})", e.message, e.code))
                    })
                    .unwrap_or_default();
                return Err(transport(format!("HTTP {}{}", status, detail)));
            }
            Ok::<_, ClientError>(body)
        };

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            body = exchange => body?,
        };

        let response: JsonRpcResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::Protocol(format!("invalid JSON-RPC 2.0 response: {}", e)))?;
        if response.jsonrpc != JSONRPC_VERSION {
            return Err(ClientError::Protocol(format!(
                "unexpected jsonrpc version '{}'",
                response.jsonrpc
            )));
        }
        if response.id != request.id {
            tracing::warn!(
                "Response id {} does not match request id {}",
                response.id,
                request.id
            );
        }

        match response.outcome {
            RpcOutcome::Result(result) => Ok(result),
            RpcOutcome::Error(err) => Err(ClientError::RemoteSkill {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
        }
    }
}
