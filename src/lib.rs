//! Multi-agent care coordination over A2A.
//!
//! Three single-skill agents (diagnostics, report, admin) publish manifests
//! and accept JSON-RPC invocations; the [`workflow`] orchestrator chains
//! them for one patient.

pub mod a2a;
pub mod agents;
pub mod config;
pub mod logging;
pub mod workflow;


/// Crate version, published as the manifest `metadata.version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
