//! Core LLM Provider trait definitions
//!
//! Defines the unified interface for all upstream vendors

use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use crate::core::cost::estimate_tokens;
use crate::core::providers::{HealthStatus, ProviderError};
use crate::core::types::{
    CompletionRequest, FinishReason, ProviderCompletion, RequestContext, TokenUsage,
};

/// One item of an upstream completion stream
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChunk {
    /// Next piece of generated text
    Delta(String),
    /// Terminal marker; nothing follows it
    Finish {
        finish_reason: FinishReason,
        usage: Option<TokenUsage>,
    },
}

/// Upstream stream of completion fragments in provider order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ProviderChunk, ProviderError>> + Send>>;

/// Unified LLM Provider interface
///
/// One implementation per vendor. Adapters are stateless apart from their
/// HTTP client; breaker accounting, caching and timeouts are applied by the
/// caller. The `model` argument is always already resolved, so adapters never
/// look at `request.model`.
#[async_trait]
pub trait LLMProvider: Send + Sync + Debug + 'static {
    /// Registry key, unique across the gateway
    fn name(&self) -> &str;

    /// Whether the adapter can serve calls at all (configured and keyed)
    fn is_enabled(&self) -> bool;

    fn supported_models(&self) -> &[String];

    fn default_model(&self) -> &str;

    fn supports_model(&self, model: &str) -> bool {
        self.supported_models().iter().any(|m| m == model)
    }

    /// Non-streaming completion
    async fn complete(
        &self,
        ctx: &RequestContext,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, ProviderError>;

    /// Streaming completion.
    ///
    /// Resolves once the upstream accepted the request; the returned stream
    /// ends with [`ProviderChunk::Finish`] on success.
    async fn stream_complete(
        &self,
        ctx: &RequestContext,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, ProviderError>;

    /// Approximate token count of `text` for `model`
    fn count_tokens(&self, model: &str, text: &str) -> u32 {
        estimate_tokens(self.name(), model, text)
    }

    /// Probe the upstream API
    async fn check_health(&self) -> HealthStatus;
}
