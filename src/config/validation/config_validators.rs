//! Configuration validators
//!
//! Validation implementations for the gateway configuration and each of its
//! sections.

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::circuit_breaker::CircuitBreakerConfig;
use std::collections::HashSet;
use tracing::debug;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.server.validate()?;

        if self.providers.is_empty() {
            return Err("At least one provider must be configured".to_string());
        }

        let mut provider_names = HashSet::new();
        for provider in &self.providers {
            if !provider_names.insert(&provider.name) {
                return Err(format!("Duplicate provider name: {}", provider.name));
            }
            provider.validate()?;
        }

        self.cache.validate()?;
        self.circuit_breaker.validate()?;
        self.streaming.validate()?;
        self.health_check.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be greater than 0".to_string());
            }
            if workers > 1000 {
                return Err("Worker count seems too high (>1000)".to_string());
            }
        }

        if self.max_body_size == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating provider configuration: {}", self.name);

        if self.name.trim().is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }

        if self.timeout == 0 {
            return Err(format!("Provider {} timeout must be greater than 0", self.name));
        }

        if self.models.is_empty() {
            return Err(format!("Provider {} must list at least one model", self.name));
        }

        let mut model_names = HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(format!("Provider {} has a model without a name", self.name));
            }
            if !model_names.insert(&model.name) {
                return Err(format!(
                    "Provider {} lists model {} twice",
                    self.name, model.name
                ));
            }
            if model.max_output_tokens == 0 {
                return Err(format!(
                    "Model {} max_output_tokens must be greater than 0",
                    model.name
                ));
            }
            if model.context_window < model.max_output_tokens {
                return Err(format!(
                    "Model {} context_window must be at least max_output_tokens",
                    model.name
                ));
            }
            if model.input_cost_per_1k < 0.0 || model.output_cost_per_1k < 0.0 {
                return Err(format!("Model {} pricing cannot be negative", model.name));
            }
        }

        if self.model(&self.default_model).is_none() {
            return Err(format!(
                "Provider {} default model {} is not in its model list",
                self.name, self.default_model
            ));
        }

        if let Some(base_url) = &self.base_url {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(format!(
                    "Provider {} base_url must use http:// or https://",
                    self.name
                ));
            }
        }

        if let Some(breaker) = &self.circuit_breaker {
            breaker
                .validate()
                .map_err(|e| format!("Provider {} circuit_breaker: {}", self.name, e))?;
        }

        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.ttl == 0 {
            return Err("Cache TTL must be greater than 0".to_string());
        }
        if self.max_entries == 0 {
            return Err("Cache max_entries must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for CircuitBreakerSettings {
    fn validate(&self) -> Result<(), String> {
        CircuitBreakerConfig::from(self).validate()
    }
}

impl Validate for StreamingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("Streaming channel_capacity must be greater than 0".to_string());
        }
        if self.idle_timeout == 0 || self.overall_timeout == 0 {
            return Err("Streaming timeouts must be greater than 0".to_string());
        }
        if self.idle_timeout > self.overall_timeout {
            return Err("Streaming idle_timeout cannot exceed overall_timeout".to_string());
        }
        Ok(())
    }
}

impl Validate for HealthCheckConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && (self.interval == 0 || self.timeout == 0) {
            return Err("Health check interval and timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}
