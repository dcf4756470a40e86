//! Agent manifest construction and validation for `.well-known/agent.json`.
//!
//! Each service builds its manifest once at startup from a static identity
//! and its skill descriptors; the result is never mutated afterwards.

use crate::a2a::types::*;
use std::collections::HashSet;

/// Static identity of an agent service.
#[derive(Debug, Clone, Copy)]
pub struct AgentIdentity {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
}

/// Structural defects that make a manifest unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestValidationError {
    #[error("unsupported apiVersion '{0}'")]
    ApiVersion(String),

    #[error("duplicate skill id '{0}'")]
    DuplicateSkill(String),

    #[error("skill '{0}' declares no output key")]
    MissingResultKey(String),

    #[error("skill '{skill}' has invalid endpoint '{endpoint}'")]
    InvalidEndpoint { skill: String, endpoint: String },
}

/// Build the manifest for a service reachable at `service_url`.
pub fn build_manifest(
    identity: &AgentIdentity,
    service_url: &str,
    skills: Vec<SkillDescriptor>,
) -> AgentManifest {
    AgentManifest {
        api_version: API_VERSION.to_string(),
        kind: MANIFEST_KIND.to_string(),
        metadata: ManifestMetadata {
            id: identity.id.to_string(),
            name: identity.name.to_string(),
            description: identity.description.to_string(),
            version: crate::VERSION.to_string(),
            tags: identity.tags.iter().map(|t| t.to_string()).collect(),
        },
        spec: ManifestSpec {
            url: service_url.trim_end_matches('/').to_string(),
            capabilities: AgentCapabilities::default(),
            authentication: Authentication::default(),
            skills,
        },
    }
}

impl AgentManifest {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn service_url(&self) -> &str {
        &self.spec.url
    }

    pub fn skills(&self) -> &[SkillDescriptor] {
        &self.spec.skills
    }

    /// Look a skill up by id.
    pub fn skill(&self, skill_id: &str) -> Option<&SkillDescriptor> {
        self.spec.skills.iter().find(|s| s.id == skill_id)
    }

    /// Full URL of a skill's invocation endpoint.
    pub fn endpoint_url(&self, skill: &SkillDescriptor) -> String {
        format!(
            "{}{}",
            self.service_url().trim_end_matches('/'),
            skill.invocation.endpoint
        )
    }

    /// Checks a discovered manifest can be used for skill lookup: skill ids
    /// must be unique.
    pub fn check_shape(&self) -> Result<(), ManifestValidationError> {
        let mut seen = HashSet::new();
        for skill in &self.spec.skills {
            if !seen.insert(skill.id.as_str()) {
                return Err(ManifestValidationError::DuplicateSkill(skill.id.clone()));
            }
        }
        Ok(())
    }

    /// Full check for a manifest this crate serves.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.api_version != API_VERSION {
            return Err(ManifestValidationError::ApiVersion(self.api_version.clone()));
        }
        self.check_shape()?;

        for skill in &self.spec.skills {
            if skill.result_key().is_none() {
                return Err(ManifestValidationError::MissingResultKey(skill.id.clone()));
            }
            if !skill.invocation.endpoint.starts_with('/') {
                return Err(ManifestValidationError::InvalidEndpoint {
                    skill: skill.id.clone(),
                    endpoint: skill.invocation.endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}
