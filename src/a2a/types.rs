//! A2A v0.2 wire types.
//!
//! Agent manifests (served at `.well-known/agent.json`) and the JSON-RPC 2.0
//! envelopes exchanged with skill endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Protocol revision advertised in every manifest.
pub const API_VERSION: &str = "a2a/v0.2";

/// Manifest `kind` discriminator.
pub const MANIFEST_KIND: &str = "AgentCard";

/// The only JSON-RPC version accepted on the wire.
pub const JSONRPC_VERSION: &str = "2.0";

/// The only JSON-RPC method a skill endpoint understands.
pub const INVOKE_METHOD: &str = "invoke";

// ─── Manifest ────────────────────────────────────────────────

/// Discoverable capability descriptor of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: ManifestSpec,
}

/// Identity block of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Where and how the agent can be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSpec {
    /// Base URL skill endpoints are resolved against.
    pub url: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub authentication: Authentication,
    pub skills: Vec<SkillDescriptor>,
}

/// Declared capabilities. Streaming and push notifications are advertised
/// as unsupported by every agent in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub interaction_modes: Vec<String>,
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self {
            streaming: false,
            push_notifications: false,
            interaction_modes: vec!["synchronous".to_string()],
        }
    }
}

/// Declared auth schemes. Nothing enforces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub schemes: Vec<String>,
}

impl Default for Authentication {
    fn default() -> Self {
        Self {
            schemes: vec!["none".to_string()],
        }
    }
}

/// A single named, schema-described operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<SkillExample>,
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub invocation: InvocationEndpoint,
}

impl SkillDescriptor {
    /// Key the skill's output is wrapped under in a JSON-RPC result.
    pub fn result_key(&self) -> Option<&str> {
        self.output_schema.required.first().map(String::as_str)
    }
}

/// Documentation-only input/output pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillExample {
    pub description: String,
    pub input: Value,
    pub output: Value,
}

/// HTTP binding of a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEndpoint {
    pub method: String,
    pub endpoint: String,
    pub content_type: String,
}

impl InvocationEndpoint {
    pub fn post_json(endpoint: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            endpoint: endpoint.into(),
            content_type: "application/json".to_string(),
        }
    }
}

/// JSON-Schema subset: structural type, required keys and per-key types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
            allowed: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        self.allowed = allowed.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add an optional property.
    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    /// Add a property and mark it required. Declaration order is kept.
    pub fn required_property(mut self, name: &str, schema: Schema) -> Self {
        self.required.push(name.to_string());
        self.property(name, schema)
    }
}

// ─── JSON-RPC ────────────────────────────────────────────────

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Outbound skill invocation envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Map<String, Value>,
    pub id: Value,
}

impl JsonRpcRequest {
    /// Build an `invoke` request carrying `params`.
    pub fn invoke(id: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: INVOKE_METHOD.to_string(),
            params,
            id: Value::String(id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Map<String, Value>),
    Error(JsonRpcError),
}

/// Skill endpoint response envelope.
///
/// Decoding rejects envelopes carrying both or neither of `result` and
/// `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJsonRpcResponse")]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Map<String, Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: RpcOutcome::Result(result),
            id,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: RpcOutcome::Error(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
            id,
        }
    }

    pub fn result(&self) -> Option<&Map<String, Value>> {
        match &self.outcome {
            RpcOutcome::Result(r) => Some(r),
            RpcOutcome::Error(_) => None,
        }
    }

    pub fn error_body(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            RpcOutcome::Error(e) => Some(e),
            RpcOutcome::Result(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct RawJsonRpcResponse {
    jsonrpc: String,
    #[serde(default)]
    result: Option<Map<String, Value>>,
    #[serde(default)]
    error: Option<JsonRpcError>,
    #[serde(default)]
    id: Value,
}

impl TryFrom<RawJsonRpcResponse> for JsonRpcResponse {
    type Error = String;

    fn try_from(raw: RawJsonRpcResponse) -> Result<Self, Self::Error> {
        let outcome = match (raw.result, raw.error) {
            (Some(result), None) => RpcOutcome::Result(result),
            (None, Some(error)) => RpcOutcome::Error(error),
            (Some(_), Some(_)) => {
                return Err("response carries both `result` and `error`".to_string());
            }
            (None, None) => {
                return Err("response carries neither `result` nor `error`".to_string());
            }
        };
        Ok(Self {
            jsonrpc: raw.jsonrpc,
            outcome,
            id: raw.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_serializes_single_member() {
        let mut result = Map::new();
        result.insert("report".to_string(), json!("ok"));
        let resp = JsonRpcResponse::success(json!("abc"), result);
        let value = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(value, json!({"jsonrpc": "2.0", "result": {"report": "ok"}, "id": "abc"}));

        let err = JsonRpcResponse::error(
            Value::Null,
            error_codes::INTERNAL_ERROR,
            "Internal error",
            None,
        );
        let value = serde_json::to_value(&err).expect("serialize");
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], json!(-32603));
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_response_rejects_both_members() {
        let raw = json!({
            "jsonrpc": "2.0",
            "result": {"a": 1},
            "error": {"code": -32603, "message": "boom"},
            "id": "1"
        });
        assert!(serde_json::from_value::<JsonRpcResponse>(raw).is_err());

        let neither = json!({"jsonrpc": "2.0", "id": "1"});
        assert!(serde_json::from_value::<JsonRpcResponse>(neither).is_err());
    }

    #[test]
    fn test_response_decodes_error() {
        let raw = json!({
            "jsonrpc": "2.0",
            "error": {"code": -32602, "message": "Invalid params - Missing 'report'"},
            "id": "7"
        });
        let resp: JsonRpcResponse = serde_json::from_value(raw).expect("decode");
        let err = resp.error_body().expect("error member");
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert!(resp.result().is_none());
    }

    #[test]
    fn test_schema_keeps_required_order() {
        let schema = Schema::object()
            .required_property("b", Schema::string())
            .required_property("a", Schema::string())
            .property("c", Schema::string());
        assert_eq!(schema.required, vec!["b", "a"]);
        assert_eq!(schema.properties.len(), 3);

        let value = serde_json::to_value(&schema).expect("serialize");
        assert_eq!(value["type"], json!("object"));
        assert_eq!(value["properties"]["a"], json!({"type": "string"}));
    }
}
