//! Provider configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upstream vendor behind a provider entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(alias = "claude")]
    Anthropic,
    #[serde(alias = "gpt")]
    OpenAI,
}

impl ProviderType {
    /// Environment variable holding the vendor API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Anthropic => f.write_str("anthropic"),
            ProviderType::OpenAI => f.write_str("openai"),
        }
    }
}

/// Limits and pricing of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Upper bound for `max_tokens`
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Prompt plus output token budget
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    /// USD per 1K input tokens
    #[serde(default)]
    pub input_cost_per_1k: f64,
    /// USD per 1K output tokens
    #[serde(default)]
    pub output_cost_per_1k: f64,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_output_tokens: default_max_output_tokens(),
            context_window: default_context_window(),
            input_cost_per_1k: 0.0,
            output_cost_per_1k: 0.0,
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, the key callers use in `provider`
    pub name: String,
    /// Vendor API spoken by this provider
    pub provider_type: ProviderType,
    /// API key; read from the vendor environment variable when absent
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL override
    pub base_url: Option<String>,
    /// API version header value
    pub api_version: Option<String>,
    /// Whether provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection priority, lower is preferred
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Model used when the request names none
    pub default_model: String,
    /// Supported models
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Breaker settings replacing the gateway defaults for this provider
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerSettings>,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        provider_type: ProviderType,
        default_model: impl Into<String>,
    ) -> Self {
        let default_model = default_model.into();
        Self {
            name: name.into(),
            provider_type,
            api_key: None,
            base_url: None,
            api_version: None,
            enabled: true,
            priority: default_priority(),
            timeout: default_timeout(),
            models: vec![ModelConfig::new(default_model.clone())],
            default_model,
            circuit_breaker: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.name == name)
    }

    /// API key, non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
