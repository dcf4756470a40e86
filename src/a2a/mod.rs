//! A2A (Agent-to-Agent) protocol layer, v0.2 manifest dialect.
//!
//! - Manifest discovery (`/.well-known/agent.json`)
//! - JSON-RPC 2.0 skill invocation (`invoke`)
//! - HTTP server (axum) and client (reqwest)

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod manifest;
pub mod server;
pub mod types;
