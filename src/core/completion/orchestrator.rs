//! Completion orchestrator

use super::validation::{validate_for_model, validate_request};
use crate::core::cache_manager::ResponseCache;
use crate::core::circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry};
use crate::core::cost::CostEstimator;
use crate::core::fingerprint::Fingerprint;
use crate::core::metrics::GatewayMetrics;
use crate::core::providers::{ProviderError, ProviderRegistry, ProviderSelection};
use crate::core::types::{
    CompletionRequest, CompletionResponse, RequestContext, TokenUsage, Usage,
};
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A request after validation and provider selection
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub selection: ProviderSelection,
    /// Copy of the request with provider, model and max tokens filled in
    pub request: CompletionRequest,
    pub fingerprint: Fingerprint,
}

impl ResolvedRequest {
    pub fn provider_name(&self) -> &str {
        self.selection.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.selection.model_name()
    }

    /// Usage and cost of a finished call.
    ///
    /// Provider-reported token counts win; otherwise both sides are estimated
    /// from the prompt and the generated `content`.
    pub fn usage(
        &self,
        estimator: &CostEstimator,
        reported: Option<TokenUsage>,
        content: &str,
    ) -> Usage {
        let provider = self.provider_name();
        let model = self.model_name();
        let (input_tokens, output_tokens) = match reported {
            Some(reported) => (reported.input_tokens, reported.output_tokens),
            None => (
                estimator.estimate_tokens(provider, model, &self.request.prompt_text()),
                estimator.estimate_tokens(provider, model, content),
            ),
        };
        let cost = estimator.estimate_cost(provider, model, input_tokens, output_tokens);
        Usage::new(input_tokens, output_tokens, cost)
    }
}

/// Routes completion requests through selection, caching and circuit breaking
#[derive(Debug, Clone)]
pub struct CompletionService {
    registry: Arc<ProviderRegistry>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: ResponseCache,
    estimator: Arc<CostEstimator>,
    metrics: Arc<GatewayMetrics>,
    cache_enabled: bool,
}

impl CompletionService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        breakers: Arc<CircuitBreakerRegistry>,
        cache: ResponseCache,
        estimator: Arc<CostEstimator>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            breakers,
            cache,
            estimator,
            metrics,
            cache_enabled: true,
        }
    }

    /// Globally enable or disable response caching
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn estimator(&self) -> &Arc<CostEstimator> {
        &self.estimator
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// Validate `request`, pick its provider and model, and fingerprint it.
    ///
    /// Fails without contacting any provider.
    pub fn resolve(
        &self,
        ctx: &RequestContext,
        request: &CompletionRequest,
    ) -> Result<ResolvedRequest> {
        validate_request(request)?;
        let selection = self.registry.select(ctx, request, &self.breakers)?;
        let max_tokens = validate_for_model(
            request,
            selection.provider_name(),
            &selection.model,
            &self.estimator,
        )?;

        let mut resolved = request.clone();
        resolved.provider = Some(selection.provider_name().to_string());
        resolved.model = Some(selection.model_name().to_string());
        resolved.max_tokens = Some(max_tokens);

        let fingerprint =
            Fingerprint::of(selection.provider_name(), selection.model_name(), &resolved);

        Ok(ResolvedRequest {
            selection,
            request: resolved,
            fingerprint,
        })
    }

    /// Produce a completion for `request`
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        let resolved = self.resolve(ctx, request)?;
        let provider = resolved.provider_name().to_string();
        self.metrics.record_request(&provider);

        let use_cache = self.cache_enabled && request.cache_enabled && !request.stream;
        debug!(
            request_id = %ctx.request_id,
            provider = %provider,
            model = %resolved.model_name(),
            fingerprint = %resolved.fingerprint,
            use_cache,
            "Dispatching completion"
        );

        let fingerprint = resolved.fingerprint.clone();
        let call = UpstreamCall {
            ctx: ctx.clone(),
            breaker: self.breakers.get_or_create(&provider),
            estimator: Arc::clone(&self.estimator),
            metrics: Arc::clone(&self.metrics),
            resolved,
        };

        let result = if use_cache {
            self.cache
                .get_or_compute(ctx, &fingerprint, move || call.run())
                .await
        } else {
            call.run().await
        };

        match result {
            Ok(response) => {
                if use_cache {
                    if response.from_cache {
                        self.metrics.record_cache_hit(&provider);
                    } else {
                        self.metrics.record_cache_miss(&provider);
                    }
                }
                info!(
                    request_id = %ctx.request_id,
                    provider = %response.provider,
                    model = %response.model,
                    duration_ms = response.duration_ms,
                    total_tokens = response.usage.total_tokens,
                    from_cache = response.from_cache,
                    "Completion finished"
                );
                Ok(response)
            }
            Err(err @ GatewayError::CircuitOpen { .. }) => {
                self.metrics.record_short_circuit(&provider);
                match self.breakers.fallback(&provider) {
                    Some(fallback) => {
                        info!(
                            request_id = %ctx.request_id,
                            provider = %provider,
                            "Circuit open, using fallback handler"
                        );
                        fallback.on_circuit_open(ctx, request, &err).await
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Everything one upstream call needs, owned so it can outlive the caller
struct UpstreamCall {
    ctx: RequestContext,
    breaker: Arc<CircuitBreaker>,
    estimator: Arc<CostEstimator>,
    metrics: Arc<GatewayMetrics>,
    resolved: ResolvedRequest,
}

impl UpstreamCall {
    async fn run(self) -> Result<CompletionResponse> {
        let permit = self.breaker.try_acquire(&self.ctx)?;
        let selection = &self.resolved.selection;
        let provider = selection.provider_name();
        let model = selection.model_name();
        let timeout = selection.descriptor.timeout;

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            timeout,
            selection
                .provider
                .complete(&self.ctx, model, &self.resolved.request),
        )
        .await;
        let elapsed = started.elapsed();

        let completion = match outcome {
            Ok(Ok(completion)) => {
                permit.record_success();
                completion
            }
            Ok(Err(error)) => {
                permit.record_failure();
                self.metrics.record_failure(provider);
                warn!(request_id = %self.ctx.request_id, provider, error = %error, "Provider call failed");
                return Err(error.into());
            }
            Err(_) => {
                permit.record_failure();
                self.metrics.record_failure(provider);
                warn!(request_id = %self.ctx.request_id, provider, ?timeout, "Provider call timed out");
                return Err(ProviderError::timeout(
                    provider,
                    format!("no response within {}s", timeout.as_secs_f64()),
                )
                .into());
            }
        };

        let usage = self
            .resolved
            .usage(&self.estimator, completion.usage, &completion.content);
        self.metrics.record_success(provider, elapsed, &usage);

        Ok(CompletionResponse {
            content: completion.content,
            usage,
            provider: provider.to_string(),
            model: model.to_string(),
            finish_reason: completion.finish_reason,
            timestamp: Utc::now(),
            duration_ms: elapsed.as_millis() as u64,
            from_cache: false,
        })
    }
}
