use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use vigil_agent::LiveAgentFactory;
use vigil_core::{SessionManager, VigilConfig};

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "Wellness-check video agent service")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = format!(
        "vigil_cli={level},vigil_core={level},vigil_agent={level},vigil_web={level}",
        level = log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .init();

    // Load configuration with CLI overrides
    let mut config = VigilConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if config.edge.api_key.is_empty() || config.llm.api_key.is_empty() {
        warn!("edge/llm credentials are not configured; agent sessions will refuse to start");
    }

    let factory = Arc::new(LiveAgentFactory::new(
        config.edge.clone(),
        config.llm.clone(),
    ));
    let manager = Arc::new(SessionManager::new(factory));

    info!(
        "vigil starting, dashboard API at http://{}:{}",
        config.server.host, config.server.port
    );
    vigil_web::start_server(&config.server, manager).await?;

    Ok(())
}
