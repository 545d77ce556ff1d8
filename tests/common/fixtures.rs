//! Test fixtures and data factories
//!
//! Provides factory methods for creating test data with sensible defaults.

use super::providers::ScriptedProvider;
use llm_gateway::config::{
    CircuitBreakerSettings, Config, GatewayConfig, ModelConfig, ProviderConfig, ProviderType,
};
use llm_gateway::core::streaming::StreamingRelay;
use llm_gateway::server::AppState;
use llm_gateway::{
    CircuitBreaker, CircuitState, CompletionRequest, CompletionService, LLMProvider,
    RequestContext, user_message,
};
use std::sync::Arc;

/// Breaker settings used across the suite: 50% over 10 calls, 30s open, 3 trials
pub fn breaker_settings() -> CircuitBreakerSettings {
    CircuitBreakerSettings {
        failure_rate_threshold: 50.0,
        sliding_window_size: 10,
        minimum_number_of_calls: 10,
        wait_duration_in_open_state: 30,
        permitted_number_of_calls_in_half_open_state: 3,
        ..CircuitBreakerSettings::default()
    }
}

/// Provider entry for a scripted provider; earlier entries get a better priority
pub fn provider_config(provider: &ScriptedProvider, priority: u32) -> ProviderConfig {
    let mut config =
        ProviderConfig::new(provider.name(), ProviderType::Anthropic, provider.model());
    config.priority = priority;
    config.api_key = Some("test-key".to_string());
    config.timeout = 5;
    config.models = vec![ModelConfig {
        max_output_tokens: 4096,
        context_window: 200_000,
        input_cost_per_1k: 0.003,
        output_cost_per_1k: 0.015,
        ..ModelConfig::new(provider.model())
    }];
    config
}

/// Gateway configuration covering `providers` in priority order
pub fn config_for(providers: &[ScriptedProvider]) -> Config {
    let mut gateway = GatewayConfig {
        circuit_breaker: breaker_settings(),
        ..GatewayConfig::default()
    };
    gateway.health_check.enabled = false;
    gateway.streaming.idle_timeout = 2;
    gateway.streaming.overall_timeout = 60;
    gateway.providers = providers
        .iter()
        .enumerate()
        .map(|(index, p)| provider_config(p, index as u32 + 1))
        .collect();
    Config { gateway }
}

/// Fully wired gateway state around scripted providers
pub struct Harness {
    pub state: AppState,
}

impl Harness {
    pub fn new(providers: Vec<ScriptedProvider>) -> Self {
        let config = config_for(&providers);
        Self::with_config(config, providers)
    }

    pub fn with_config(config: Config, providers: Vec<ScriptedProvider>) -> Self {
        let adapters = providers.into_iter().map(ScriptedProvider::into_adapter).collect();
        let state = AppState::with_adapters(config, adapters).expect("valid harness state");
        Self { state }
    }

    pub fn service(&self) -> &CompletionService {
        &self.state.completions
    }

    pub fn relay(&self) -> &StreamingRelay {
        &self.state.relay
    }

    pub fn breaker(&self, provider: &str) -> Arc<CircuitBreaker> {
        self.service()
            .breakers()
            .get(provider)
            .expect("breaker registered for provider")
    }

    /// Open the breaker of `provider` by recording a full window of failures
    pub fn trip_breaker(&self, provider: &str) {
        let breaker = self.breaker(provider);
        let ctx = RequestContext::new();
        for _ in 0..10 {
            breaker
                .try_acquire(&ctx)
                .expect("breaker still closed")
                .record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}

/// Factory for completion requests
pub struct RequestFactory;

impl RequestFactory {
    /// Single user message, no provider or model preference
    pub fn ping() -> CompletionRequest {
        Self::prompt("ping")
    }

    pub fn prompt(text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![user_message(text)]).with_max_tokens(64)
    }

    /// Request pinned to `provider` and its default model
    pub fn for_provider(provider: &str, text: &str) -> CompletionRequest {
        Self::prompt(text).with_provider(provider)
    }

    /// Streaming request for `provider`
    pub fn streaming(provider: &str, text: &str) -> CompletionRequest {
        Self::for_provider(provider, text).with_stream(true)
    }
}

/// YAML configuration with two providers, for loader tests
pub const TWO_PROVIDER_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090

providers:
  - name: claude
    provider_type: anthropic
    api_key: "sk-ant-test"
    priority: 1
    default_model: claude-3-haiku
    models:
      - name: claude-3-haiku
        max_output_tokens: 4096
        context_window: 200000
        input_cost_per_1k: 0.00025
        output_cost_per_1k: 0.00125
  - name: openai
    provider_type: openai
    api_key: "sk-test"
    priority: 2
    default_model: gpt-4o-mini
    models:
      - name: gpt-4o-mini
        max_output_tokens: 16384
        context_window: 128000

cache:
  ttl: 300

streaming:
  idle_timeout: 10

health_check:
  enabled: false
"#;
