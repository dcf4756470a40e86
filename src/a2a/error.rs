//! Error taxonomies for both sides of an invocation.
//!
//! Dispatcher errors are always recovered into a JSON-RPC error envelope.
//! Client errors are terminal for the call that raised them; nothing here
//! is retried.

use crate::a2a::types::{error_codes, JsonRpcResponse};
use axum::http::StatusCode;
use serde_json::Value;

/// Server-side failure of a single invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid Request - {0}")]
    MalformedRequest(String),

    #[error("Method not found: {0}")]
    UnknownMethod(String),

    #[error("Invalid params - {0}")]
    InvalidParams(String),

    /// Handler-side failure. The detail goes to `error.data`, never into the
    /// message.
    #[error("Internal error")]
    Internal(String),
}

impl DispatchError {
    pub fn code(&self) -> i64 {
        match self {
            Self::MalformedRequest(_) => error_codes::INVALID_REQUEST,
            Self::UnknownMethod(_) => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => error_codes::INVALID_PARAMS,
            Self::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Caller mistakes are 4xx, handler failures 5xx.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub fn into_response(self, id: Value) -> JsonRpcResponse {
        let code = self.code();
        let message = self.to_string();
        let data = match self {
            Self::Internal(detail) => Some(Value::String(detail)),
            _ => None,
        };
        JsonRpcResponse::error(id, code, message, data)
    }
}

/// HTTP status mirroring an embedded JSON-RPC error code.
pub fn status_for_code(code: i64) -> StatusCode {
    match code {
        error_codes::METHOD_NOT_FOUND => StatusCode::NOT_FOUND,
        error_codes::INVALID_REQUEST | error_codes::INVALID_PARAMS => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Caller-side failure of discovery or invocation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("discovery of {url} failed: {reason}")]
    Discovery { url: String, reason: String },

    #[error("manifest at {url} is malformed: {reason}")]
    Manifest { url: String, reason: String },

    #[error("agent not discovered yet; discover it before resolving skills")]
    NotDiscovered,

    #[error("skill '{skill_id}' not found on agent '{agent_id}'")]
    SkillNotFound { skill_id: String, agent_id: String },

    #[error("transport failure calling {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("skill invocation failed: {message} (code: {code})")]
    RemoteSkill {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("call cancelled")]
    Cancelled,
}

impl ClientError {
    /// Stable kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "DiscoveryError",
            Self::Manifest { .. } => "ManifestError",
            Self::NotDiscovered => "NotDiscoveredError",
            Self::SkillNotFound { .. } => "SkillNotFoundError",
            Self::Transport { .. } => "TransportError",
            Self::Protocol(_) => "ProtocolError",
            Self::RemoteSkill { .. } => "RemoteSkillError",
            Self::Cancelled => "Cancelled",
        }
    }
}
