//! The three care agents: diagnostics, report and admin.
//!
//! Each agent owns a static identity, one skill descriptor and the handler
//! bound to it.

pub mod admin;
pub mod diagnostics;
pub mod records;
pub mod report;

use crate::a2a::dispatcher::{BindError, SkillDispatcher};
use crate::a2a::manifest::{build_manifest, AgentIdentity};
use crate::a2a::types::AgentManifest;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Diagnostics,
    Report,
    Admin,
}

impl AgentKind {
    /// Workflow order.
    pub const ALL: [AgentKind; 3] = [Self::Diagnostics, Self::Report, Self::Admin];

    pub fn identity(self) -> &'static AgentIdentity {
        match self {
            Self::Diagnostics => &diagnostics::IDENTITY,
            Self::Report => &report::IDENTITY,
            Self::Admin => &admin::IDENTITY,
        }
    }

    /// Manifest `metadata.id`.
    pub fn agent_id(self) -> &'static str {
        self.identity().id
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Diagnostics => 8001,
            Self::Report => 8002,
            Self::Admin => 8003,
        }
    }

    pub fn manifest(self, service_url: &str) -> AgentManifest {
        let skill = match self {
            Self::Diagnostics => diagnostics::skill(),
            Self::Report => report::skill(),
            Self::Admin => admin::skill(),
        };
        build_manifest(self.identity(), service_url, vec![skill])
    }

    /// Dispatcher with the built-in handler bound.
    pub fn dispatcher(self, service_url: &str) -> Result<SkillDispatcher, BindError> {
        let dispatcher = SkillDispatcher::new(self.manifest(service_url))?;
        match self {
            Self::Diagnostics => dispatcher.bind(diagnostics::SKILL_ID, diagnostics::TriageHandler),
            Self::Report => dispatcher.bind(report::SKILL_ID, report::ReportFormatter),
            Self::Admin => dispatcher.bind(admin::SKILL_ID, admin::FollowupScheduler),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifests_are_valid_and_distinct() {
        for kind in AgentKind::ALL {
            let url = format!("http://127.0.0.1:{}", kind.default_port());
            let manifest = kind.manifest(&url);
            assert!(manifest.validate().is_ok(), "{kind} manifest invalid");
            assert_eq!(manifest.id(), kind.agent_id());
            assert_eq!(manifest.skills().len(), 1);
            assert!(kind.dispatcher(&url).is_ok());
        }
    }

    #[test]
    fn test_result_keys() {
        let keys: Vec<String> = AgentKind::ALL
            .iter()
            .map(|k| {
                k.manifest("http://x").skills()[0]
                    .result_key()
                    .expect("result key")
                    .to_string()
            })
            .collect();
        assert_eq!(keys, vec!["diagnosis", "report", "appointment_info"]);
    }
}
