//! Request validation
//!
//! Shape checks run before provider selection; model bound checks need the
//! selected model and run right after it. Neither contacts a provider.

use crate::core::cost::CostEstimator;
use crate::core::providers::ModelSpec;
use crate::core::types::CompletionRequest;
use crate::utils::error::{GatewayError, Result};

/// Output token budget used when the request does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Check everything that does not depend on the target model
pub fn validate_request(request: &CompletionRequest) -> Result<()> {
    if request.messages.is_empty() {
        return Err(GatewayError::validation("messages must not be empty"));
    }
    if let Some(index) = request
        .messages
        .iter()
        .position(|m| m.content.trim().is_empty())
    {
        return Err(GatewayError::validation(format!(
            "message {} has empty content",
            index
        )));
    }

    if let Some(temperature) = request.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(GatewayError::validation(format!(
                "temperature must be between 0 and 2, got {}",
                temperature
            )));
        }
    }
    if let Some(top_p) = request.top_p {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(GatewayError::validation(format!(
                "topP must be between 0 and 1, got {}",
                top_p
            )));
        }
    }
    if request.top_k == Some(0) {
        return Err(GatewayError::validation("topK must be at least 1"));
    }
    if request.max_tokens == Some(0) {
        return Err(GatewayError::validation("maxTokens must be at least 1"));
    }

    Ok(())
}

/// Check the request against the selected model and return the effective
/// output token budget
pub fn validate_for_model(
    request: &CompletionRequest,
    provider: &str,
    model: &ModelSpec,
    estimator: &CostEstimator,
) -> Result<u32> {
    let max_tokens = match request.max_tokens {
        Some(max_tokens) if max_tokens > model.max_output_tokens => {
            return Err(GatewayError::validation(format!(
                "maxTokens {} exceeds the limit of {} for model '{}'",
                max_tokens, model.max_output_tokens, model.name
            )));
        }
        Some(max_tokens) => max_tokens,
        None => DEFAULT_MAX_TOKENS.min(model.max_output_tokens),
    };

    let prompt_tokens = estimator.estimate_tokens(provider, &model.name, &request.prompt_text());
    let required = u64::from(prompt_tokens) + u64::from(max_tokens);
    if required > u64::from(model.context_window) {
        return Err(GatewayError::validation(format!(
            "estimated prompt of {} tokens plus maxTokens {} exceeds the context window of {} for model '{}'",
            prompt_tokens, max_tokens, model.context_window, model.name
        )));
    }

    Ok(max_tokens)
}
