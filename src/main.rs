use a2a_care::a2a::client::A2aClient;
use a2a_care::a2a::server::{start_server, ServerParams};
use a2a_care::agents::AgentKind;
use a2a_care::config::Config;
use a2a_care::workflow::{demo_patient, Orchestrator};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Care coordination agents speaking A2A
#[derive(Parser)]
#[command(name = "a2a-care")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "A2A_CARE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one agent over HTTP
    Serve {
        #[arg(value_enum)]
        agent: AgentKind,

        /// Bind host (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the diagnostics → report → admin workflow once
    Run {
        /// Patient data JSON file (defaults to the built-in demo patient)
        #[arg(long)]
        patient: Option<PathBuf>,
    },

    /// Print an agent's manifest
    Manifest {
        #[arg(value_enum)]
        agent: AgentKind,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    a2a_care::logging::init(level, cli.log_json || config.logging.json)?;

    match cli.command {
        Commands::Serve { agent, host, port } => serve(&config, agent, host, port).await,
        Commands::Run { patient } => run(&config, patient.as_deref()).await,
        Commands::Manifest { agent } => {
            let url = config.service(agent).base_url();
            println!("{}", serde_json::to_string_pretty(&agent.manifest(&url))?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn serve(
    config: &Config,
    agent: AgentKind,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let service = config.service(agent);
    let params = ServerParams {
        host: host.unwrap_or_else(|| service.host.clone()),
        port: port.unwrap_or(service.port),
    };
    let service_url = match &service.base_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!("http://{}:{}", params.host, params.port),
    };

    let dispatcher = agent
        .dispatcher(&service_url)
        .with_context(|| format!("Failed to build {} dispatcher", agent))?;
    start_server(&params, dispatcher).await
}

async fn run(config: &Config, patient: Option<&Path>) -> Result<()> {
    let patient_data = match patient {
        Some(path) => load_patient(path)?,
        None => demo_patient(),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling workflow");
            on_signal.cancel();
        }
    });

    let client = A2aClient::shared(config.client_timeout())?;
    let mut orchestrator = Orchestrator::new(client, config.directory());

    match orchestrator.run(patient_data, &cancel).await {
        Ok(context) => {
            println!("{}", context.summary());
            Ok(())
        }
        Err(e) => {
            eprintln!("Workflow failed at step '{}' [{}]: {}", e.step, e.cause.kind(), e.cause);
            eprintln!("Conversation ID: {}", e.context.conversation_id);
            std::process::exit(1);
        }
    }
}

fn load_patient(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patient file {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Patient file {} is not valid JSON", path.display()))?;
    anyhow::ensure!(value.is_object(), "Patient data must be a JSON object");
    Ok(value)
}
