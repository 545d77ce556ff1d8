//! Per-provider breaker registry and fallback handlers

use super::breaker::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};
use super::config::CircuitBreakerConfig;
use crate::core::types::{CompletionRequest, CompletionResponse, RequestContext};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Produces a response when a provider's breaker short-circuits a call
#[async_trait]
pub trait FallbackHandler: Send + Sync {
    async fn on_circuit_open(
        &self,
        ctx: &RequestContext,
        request: &CompletionRequest,
        error: &GatewayError,
    ) -> Result<CompletionResponse>;
}

/// Owns one breaker per registered provider
pub struct CircuitBreakerRegistry {
    default_config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    fallbacks: DashMap<String, Arc<dyn FallbackHandler>>,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            default_config,
            breakers: DashMap::new(),
            fallbacks: DashMap::new(),
        }
    }

    pub fn default_config(&self) -> &CircuitBreakerConfig {
        &self.default_config
    }

    /// Create the breaker for `provider` unless it already exists
    pub fn register(
        &self,
        provider: &str,
        config: Option<CircuitBreakerConfig>,
    ) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(provider.to_string())
            .or_insert_with(|| {
                info!("Registering circuit breaker for provider: {}", provider);
                let config = config.unwrap_or_else(|| self.default_config.clone());
                Arc::new(CircuitBreaker::new(provider, config))
            })
            .clone()
    }

    pub fn get(&self, provider: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(provider).map(|b| Arc::clone(b.value()))
    }

    /// Breaker for `provider`, created with the default config if missing
    pub fn get_or_create(&self, provider: &str) -> Arc<CircuitBreaker> {
        match self.get(provider) {
            Some(breaker) => breaker,
            None => self.register(provider, None),
        }
    }

    /// Whether the breaker currently rejects calls to `provider`
    pub fn is_open(&self, provider: &str) -> bool {
        self.get(provider)
            .map(|breaker| !breaker.is_call_permitted())
            .unwrap_or(false)
    }

    pub fn state(&self, provider: &str) -> Option<CircuitState> {
        self.get(provider).map(|breaker| breaker.state())
    }

    /// Metrics of every breaker, keyed by provider
    pub fn metrics(&self) -> BTreeMap<String, CircuitBreakerMetrics> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().metrics()))
            .collect()
    }

    pub fn register_fallback(&self, provider: &str, handler: Arc<dyn FallbackHandler>) {
        info!("Registering circuit-open fallback for provider: {}", provider);
        self.fallbacks.insert(provider.to_string(), handler);
    }

    pub fn fallback(&self, provider: &str) -> Option<Arc<dyn FallbackHandler>> {
        self.fallbacks.get(provider).map(|f| Arc::clone(f.value()))
    }
}

impl std::fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("breakers", &self.breakers.len())
            .field("fallbacks", &self.fallbacks.len())
            .finish()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
