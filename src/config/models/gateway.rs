//! Main gateway configuration

#![allow(missing_docs)]

use super::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Breaker defaults for every provider
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    /// Streaming relay configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Provider health monitor configuration
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Configuration built purely from the environment.
    ///
    /// One provider is configured per vendor whose API key is present.
    pub fn from_env() -> crate::utils::error::Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = Self::default();

        if lookup(ProviderType::Anthropic.api_key_env()).is_some() {
            let mut claude =
                ProviderConfig::new("claude", ProviderType::Anthropic, "claude-3-5-sonnet-20241022");
            claude.priority = 1;
            claude.models = vec![
                ModelConfig {
                    max_output_tokens: 8192,
                    context_window: 200_000,
                    input_cost_per_1k: 0.003,
                    output_cost_per_1k: 0.015,
                    ..ModelConfig::new("claude-3-5-sonnet-20241022")
                },
                ModelConfig {
                    max_output_tokens: 4096,
                    context_window: 200_000,
                    input_cost_per_1k: 0.00025,
                    output_cost_per_1k: 0.00125,
                    ..ModelConfig::new("claude-3-haiku-20240307")
                },
            ];
            config.providers.push(claude);
        }
        if lookup(ProviderType::OpenAI.api_key_env()).is_some() {
            let mut openai = ProviderConfig::new("openai", ProviderType::OpenAI, "gpt-4o");
            openai.priority = 2;
            openai.models = vec![
                ModelConfig {
                    max_output_tokens: 16_384,
                    context_window: 128_000,
                    input_cost_per_1k: 0.0025,
                    output_cost_per_1k: 0.01,
                    ..ModelConfig::new("gpt-4o")
                },
                ModelConfig {
                    max_output_tokens: 16_384,
                    context_window: 128_000,
                    input_cost_per_1k: 0.00015,
                    output_cost_per_1k: 0.0006,
                    ..ModelConfig::new("gpt-4o-mini")
                },
            ];
            config.providers.push(openai);
        }

        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `GATEWAY_*` overrides and fill missing API keys from the vendor variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> crate::utils::error::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        use crate::utils::error::GatewayError;

        if let Some(host) = lookup("GATEWAY_HOST") {
            debug!("Overriding server host from environment");
            self.server.host = host;
        }
        if let Some(port) = lookup("GATEWAY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid GATEWAY_PORT: {}", port)))?;
        }
        if let Some(ttl) = lookup("GATEWAY_CACHE_TTL") {
            self.cache.ttl = ttl
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid GATEWAY_CACHE_TTL: {}", ttl)))?;
        }

        for provider in &mut self.providers {
            if provider.api_key().is_none() {
                match lookup(provider.provider_type.api_key_env()) {
                    Some(key) => provider.api_key = Some(key),
                    None => warn!(
                        "No API key for provider '{}', set {}",
                        provider.name,
                        provider.provider_type.api_key_env()
                    ),
                }
            }
        }
        Ok(())
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}
