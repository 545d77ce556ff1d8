//! Application state shared across HTTP handlers
//!
//! Wires the registry, breakers, cache, estimator and metrics together from
//! the configuration.

use crate::config::Config;
use crate::core::cache_manager::ResponseCache;
use crate::core::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use crate::core::completion::CompletionService;
use crate::core::cost::CostEstimator;
use crate::core::health::HealthMonitor;
use crate::core::metrics::GatewayMetrics;
use crate::core::providers::{ProviderDescriptor, ProviderRegistry, create_provider};
use crate::core::streaming::StreamingRelay;
use crate::core::traits::LLMProvider;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tracing::info;

/// HTTP server state shared across handlers
///
/// Cheap to clone; every component is reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    pub completions: CompletionService,
    pub relay: StreamingRelay,
    pub health_monitor: HealthMonitor,
}

impl AppState {
    /// Build the state with one HTTP adapter per configured provider
    pub fn from_config(config: Config) -> Result<Self> {
        let adapters = config
            .providers()
            .iter()
            .map(create_provider)
            .collect::<Result<Vec<_>>>()?;
        Self::with_adapters(config, adapters)
    }

    /// Build the state around the given adapters.
    ///
    /// Every adapter must have a provider entry of the same name in `config`,
    /// which supplies its model limits, priority, timeout and breaker settings.
    pub fn with_adapters(config: Config, adapters: Vec<Arc<dyn LLMProvider>>) -> Result<Self> {
        let gateway = &config.gateway;
        let default_breaker = CircuitBreakerConfig::from(&gateway.circuit_breaker);
        let registry = Arc::new(ProviderRegistry::new());
        let breakers = Arc::new(CircuitBreakerRegistry::new(default_breaker));

        for adapter in adapters {
            let provider_config = gateway.get_provider(adapter.name()).ok_or_else(|| {
                GatewayError::Config(format!(
                    "no provider configuration named '{}'",
                    adapter.name()
                ))
            })?;
            let descriptor = ProviderDescriptor::from_config(provider_config);
            breakers.register(
                &provider_config.name,
                provider_config
                    .circuit_breaker
                    .as_ref()
                    .map(CircuitBreakerConfig::from),
            );
            registry.register(descriptor, adapter)?;
        }

        let cache = ResponseCache::new(&gateway.cache);
        let estimator = Arc::new(CostEstimator::from_providers(&gateway.providers));
        let metrics = Arc::new(GatewayMetrics::new());

        let completions = CompletionService::new(
            Arc::clone(&registry),
            breakers,
            cache,
            estimator,
            metrics,
        )
        .with_cache_enabled(gateway.cache.enabled);
        let relay = StreamingRelay::new(completions.clone(), &gateway.streaming);
        let health_monitor = HealthMonitor::new(registry, &gateway.health_check);

        info!(
            "Gateway state ready with {} provider(s), {} enabled",
            completions.registry().len(),
            completions.registry().list_enabled().len()
        );

        Ok(Self {
            config: Arc::new(config),
            completions,
            relay,
            health_monitor,
        })
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
