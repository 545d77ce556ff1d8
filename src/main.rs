//! LLM Gateway - provider gateway with circuit breaking and streaming relay

#![allow(missing_docs)]

use clap::Parser;
use llm_gateway::server;
use llm_gateway::utils::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "gateway", version, about = "LLM provider gateway")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = server::load_config(cli.config.as_deref()).await?;
    if let Some(host) = cli.host {
        config.gateway.server.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.server.port = port;
    }

    init_logging(config.logging())?;
    tracing::info!("Configuration loaded, {} provider(s)", config.providers().len());

    server::run_server(config).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
