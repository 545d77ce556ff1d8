//! Server builder and run_server function

use crate::config::Config;
use crate::core::traits::LLMProvider;
use crate::server::server::HttpServer;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Server builder for easier configuration
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    adapters: Option<Vec<Arc<dyn LLMProvider>>>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use these adapters instead of building HTTP clients from the configuration
    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn LLMProvider>>) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Build the HTTP server
    pub fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| GatewayError::Config("Configuration is required".to_string()))?;

        let state = match self.adapters {
            Some(adapters) => AppState::with_adapters(config, adapters)?,
            None => AppState::from_config(config)?,
        };
        Ok(HttpServer::with_state(state))
    }
}

/// Load the configuration, falling back to environment variables when no file is given
pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path).await,
        None => {
            info!("No configuration file given, reading providers from the environment");
            Config::from_env()
        }
    }
}

/// Run the server with an already loaded configuration
pub async fn run_server(config: Config) -> Result<()> {
    let server = ServerBuilder::new().with_config(config).build()?;
    let build = crate::build_info();
    info!(
        version = build.version,
        commit = build.git_commit,
        rustc = build.rustc,
        "LLM Gateway build"
    );
    info!("Server starting at: http://{}", server.config().address());
    info!("API Endpoints:");
    info!("   POST /completions - Completion");
    info!("   POST /completions/stream - Streaming completion (SSE)");
    info!("   GET  /providers - Provider status");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Gateway metrics");

    server.start().await
}
