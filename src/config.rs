//! Layered configuration.
//!
//! Precedence, lowest first: compiled defaults, the TOML file
//! (`--config`, else `~/.a2a-care/config.toml` when present), then
//! `A2A_CARE__*` environment variables (`A2A_CARE__AGENTS__ADMIN__PORT=9003`).
//! Loaded once at startup; never reloaded.

use crate::agents::AgentKind;
use crate::workflow::AgentDirectory;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub agents: AgentsConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub diagnostics: ServiceConfig,
    pub report: ServiceConfig,
    pub admin: ServiceConfig,
}

/// Bind address and public URL of one agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL; derived from host and port when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ServiceConfig {
    fn local(kind: AgentKind) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: kind.default_port(),
            base_url: None,
        }
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: AgentsConfig {
                diagnostics: ServiceConfig::local(AgentKind::Diagnostics),
                report: ServiceConfig::local(AgentKind::Report),
                admin: ServiceConfig::local(AgentKind::Admin),
            },
            client: ClientConfig {
                timeout_secs: crate::a2a::client::DEFAULT_TIMEOUT.as_secs(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

/// `~/.a2a-care/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".a2a-care").join("config.toml"))
}

impl Config {
    /// Load configuration. An explicit `path` must exist; the default path
    /// is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        match path {
            Some(p) => {
                builder = builder.add_source(File::from(p).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(p) = default_config_path() {
                    builder =
                        builder.add_source(File::from(p).format(FileFormat::Toml).required(false));
                }
            }
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix("A2A_CARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "client.timeout_secs must be positive".to_string(),
            ));
        }
        for kind in AgentKind::ALL {
            let service = self.service(kind);
            if service.port == 0 {
                return Err(ConfigError::Invalid(format!("{} port must be non-zero", kind)));
            }
        }
        Ok(())
    }

    pub fn service(&self, kind: AgentKind) -> &ServiceConfig {
        match kind {
            AgentKind::Diagnostics => &self.agents.diagnostics,
            AgentKind::Report => &self.agents.report,
            AgentKind::Admin => &self.agents.admin,
        }
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }

    /// Logical agent name → base URL, as used by the orchestrator.
    pub fn directory(&self) -> AgentDirectory {
        AgentDirectory::new(
            AgentKind::ALL
                .into_iter()
                .map(|kind| (kind, self.service(kind).base_url())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client_timeout(), Duration::from_secs(120));
        assert_eq!(config.service(AgentKind::Report).base_url(), "http://127.0.0.1:8002");
        assert_eq!(
            config.directory().base_url(AgentKind::Admin),
            "http://127.0.0.1:8003"
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
[agents.admin]
port = 9003
base_url = "https://admin.example.org/"

[client]
timeout_secs = 30
"#,
        );
        let config = Config::load(Some(file.path())).expect("load");
        assert_eq!(config.agents.admin.port, 9003);
        assert_eq!(config.service(AgentKind::Admin).base_url(), "https://admin.example.org");
        assert_eq!(config.client_timeout(), Duration::from_secs(30));
        assert_eq!(config.agents.diagnostics.port, 8001);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_config("[client]\ntimeout_secs = 0\n");
        let err = Config::load(Some(file.path())).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).expect_err("missing");
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).expect("toml");
        let file = write_config(&text);
        assert_eq!(Config::load(Some(file.path())).expect("load"), config);
    }
}
