//! A2A agent HTTP server powered by axum.
//!
//! Serves:
//! - `GET  /.well-known/agent.json`: manifest discovery
//! - `POST <skill endpoint>`       : JSON-RPC 2.0 invocation, one route per bound skill
//! - `GET  /health`                : health check

use crate::a2a::dispatcher::SkillDispatcher;
use crate::a2a::error::status_for_code;
use crate::a2a::types::*;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for an agent server.
#[derive(Clone)]
pub struct AgentState {
    pub dispatcher: Arc<SkillDispatcher>,
}

/// Build the axum router for one agent.
pub fn build_router(dispatcher: SkillDispatcher) -> Router {
    let state = AgentState {
        dispatcher: Arc::new(dispatcher),
    };

    let mut router = Router::new()
        .route("/.well-known/agent.json", get(get_manifest))
        .route("/health", get(health_check));

    let skills: Vec<(String, String)> = state
        .dispatcher
        .bound_skills()
        .map(|s| (s.id.clone(), s.invocation.endpoint.clone()))
        .collect();
    for (skill_id, endpoint) in skills {
        router = router.route(
            &endpoint,
            post(move |State(state): State<AgentState>, body: Bytes| async move {
                invoke_skill(state, &skill_id, &body).await
            }),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind address of an agent server.
pub struct ServerParams {
    pub host: String,
    pub port: u16,
}

/// Run an agent server until the process is stopped.
pub async fn start_server(
    params: &ServerParams,
    dispatcher: SkillDispatcher,
) -> anyhow::Result<()> {
    let agent_id = dispatcher.manifest().id().to_string();
    let endpoints: Vec<String> = dispatcher
        .bound_skills()
        .map(|s| s.invocation.endpoint.clone())
        .collect();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    tracing::info!("A2A agent '{}' starting on http://{}", agent_id, addr);
    tracing::info!("   Manifest: http://{}/.well-known/agent.json", addr);
    for endpoint in &endpoints {
        tracing::info!("   Skill:    http://{}{}", addr, endpoint);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(dispatcher)).await?;

    Ok(())
}

/// GET /.well-known/agent.json: manifest discovery.
async fn get_manifest(State(state): State<AgentState>) -> Json<AgentManifest> {
    Json(state.dispatcher.manifest().as_ref().clone())
}

/// POST <skill endpoint>: JSON-RPC 2.0 invocation.
async fn invoke_skill(
    state: AgentState,
    skill_id: &str,
    body: &[u8],
) -> (StatusCode, Json<JsonRpcResponse>) {
    let response = state.dispatcher.handle_invoke(skill_id, body).await;
    let status = response
        .error_body()
        .map_or(StatusCode::OK, |e| status_for_code(e.code));
    (status, Json(response))
}

/// GET /health: health check.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "protocol": "A2A v0.2"
    }))
}
