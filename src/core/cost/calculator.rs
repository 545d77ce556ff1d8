//! Token and cost estimator

use super::types::{ModelFamily, ModelPricing};
use crate::config::ProviderConfig;
use dashmap::DashMap;
use tracing::debug;

/// Approximate token count of `text`.
///
/// Deterministic and monotonic in the text length; empty text is zero tokens.
pub fn estimate_tokens(provider: &str, model: &str, text: &str) -> u32 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0;
    }
    let ratio = ModelFamily::detect(provider, model).chars_per_token();
    (chars as f64 / ratio).ceil() as u32
}

/// Per-model pricing table keyed by provider and model
#[derive(Debug, Default)]
pub struct CostEstimator {
    pricing: DashMap<(String, String), ModelPricing>,
}

impl CostEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator seeded with the pricing of every configured model
    pub fn from_providers(providers: &[ProviderConfig]) -> Self {
        let estimator = Self::new();
        for provider in providers {
            for model in &provider.models {
                estimator.set_pricing(
                    &provider.name,
                    ModelPricing::new(
                        model.name.clone(),
                        model.input_cost_per_1k,
                        model.output_cost_per_1k,
                    ),
                );
            }
        }
        estimator
    }

    pub fn set_pricing(&self, provider: &str, pricing: ModelPricing) {
        self.pricing
            .insert((provider.to_string(), pricing.model.clone()), pricing);
    }

    pub fn pricing(&self, provider: &str, model: &str) -> Option<ModelPricing> {
        self.pricing
            .get(&(provider.to_string(), model.to_string()))
            .map(|p| p.value().clone())
    }

    pub fn estimate_tokens(&self, provider: &str, model: &str, text: &str) -> u32 {
        estimate_tokens(provider, model, text)
    }

    /// Cost in USD; zero for models without configured pricing
    pub fn estimate_cost(
        &self,
        provider: &str,
        model: &str,
        input_tokens: u32,
        output_tokens: u32,
    ) -> f64 {
        match self.pricing(provider, model) {
            Some(pricing) => pricing.cost(input_tokens, output_tokens),
            None => {
                debug!(provider, model, "No pricing configured, reporting zero cost");
                0.0
            }
        }
    }
}
