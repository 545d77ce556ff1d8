//! # LLM Gateway
//!
//! A gateway in front of several upstream language model providers.
//!
//! ## Features
//!
//! - **Priority routing**: explicit or automatic provider selection by priority and model
//! - **Circuit breaking**: per-provider, rate-based, with half-open trial calls
//! - **Deduplication**: concurrent identical requests share one upstream call
//! - **Response cache**: fingerprint-keyed with TTL
//! - **Streaming relay**: token-by-token Server-Sent Events with cancellation
//! - **Cost estimation**: per-model token and price estimates
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use llm_gateway::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config)?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::cache_manager::ResponseCache;
pub use core::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState, FallbackHandler,
};
pub use core::completion::CompletionService;
pub use core::cost::CostEstimator;
pub use core::fingerprint::Fingerprint;
pub use core::providers::{ProviderDescriptor, ProviderError, ProviderRegistry};
pub use core::streaming::{CancelHandle, CompletionStream, StreamEvent, StreamingRelay};
pub use core::traits::LLMProvider;
pub use core::types::{
    ChatMessage, CompletionRequest, CompletionResponse, MessageRole, RequestContext, Usage,
    assistant_message, system_message, user_message,
};

use tracing::info;

/// The gateway: configuration plus the HTTP server built from it
pub struct Gateway {
    config: Config,
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    pub fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");

        let server = server::HttpServer::new(&config)?;

        Ok(Self { config, server })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &server::AppState {
        self.server.state()
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        let build = build_info();
        info!(
            version = build.version,
            commit = build.git_commit,
            "Starting LLM Gateway with {} configured provider(s)",
            self.config.providers().len()
        );

        self.server.start().await
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// What was built, from which commit, with which compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Short commit hash, "unknown" outside a git checkout
    pub git_commit: &'static str,
    /// Seconds since the epoch
    pub build_time: &'static str,
    pub rustc: &'static str,
}

/// Build information stamped in at compile time
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION,
        git_commit: env!("GATEWAY_GIT_COMMIT"),
        build_time: env!("GATEWAY_BUILD_TIME"),
        rustc: env!("GATEWAY_RUSTC"),
    }
}
