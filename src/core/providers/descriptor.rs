//! Provider descriptors
//!
//! What the registry knows about a provider besides its adapter: model
//! limits, selection priority and the last health check result.

use crate::config::{ModelConfig, ProviderConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of the most recent health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
    /// No check has run yet
    Unknown,
}

/// Limits of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub max_output_tokens: u32,
    pub context_window: u32,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, max_output_tokens: u32, context_window: u32) -> Self {
        Self {
            name: name.into(),
            max_output_tokens,
            context_window,
        }
    }
}

impl From<&ModelConfig> for ModelSpec {
    fn from(config: &ModelConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.max_output_tokens,
            config.context_window,
        )
    }
}

/// Registry entry of a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub enabled: bool,
    pub models: Vec<ModelSpec>,
    pub default_model: String,
    /// Lower is preferred
    pub priority: u32,
    #[serde(skip)]
    pub timeout: Duration,
    pub health: HealthStatus,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, default_model: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            models: Vec::new(),
            default_model: default_model.into(),
            priority,
            timeout: Duration::from_secs(60),
            health: HealthStatus::Unknown,
            last_checked: None,
        }
    }

    pub fn with_model(mut self, model: ModelSpec) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            enabled: config.enabled,
            models: config.models.iter().map(ModelSpec::from).collect(),
            default_model: config.default_model.clone(),
            priority: config.priority,
            timeout: config.timeout(),
            health: HealthStatus::Unknown,
            last_checked: None,
        }
    }

    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn supports_model(&self, name: &str) -> bool {
        self.model(name).is_some()
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}
