//! Cost estimation types

use serde::{Deserialize, Serialize};

/// Tokenizer family used for character-based token estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Claude,
    Gpt,
    Other,
}

impl ModelFamily {
    /// Family of `model`, falling back to the provider name when the model is not telling
    pub fn detect(provider: &str, model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        if model.contains("claude") {
            return ModelFamily::Claude;
        }
        let reasoning_series = model
            .strip_prefix('o')
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
        if model.starts_with("gpt") || model.contains("-gpt") || reasoning_series {
            return ModelFamily::Gpt;
        }
        let provider = provider.to_ascii_lowercase();
        if provider.contains("claude") || provider.contains("anthropic") {
            ModelFamily::Claude
        } else if provider.contains("openai") || provider.contains("gpt") {
            ModelFamily::Gpt
        } else {
            ModelFamily::Other
        }
    }

    /// Average characters per token
    pub fn chars_per_token(&self) -> f64 {
        match self {
            ModelFamily::Claude => 3.5,
            ModelFamily::Gpt => 4.0,
            ModelFamily::Other => 4.0,
        }
    }
}

/// Model pricing information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model name
    pub model: String,
    /// Input cost per 1K tokens (USD)
    pub input_cost_per_1k_tokens: f64,
    /// Output cost per 1K tokens (USD)
    pub output_cost_per_1k_tokens: f64,
}

impl ModelPricing {
    pub fn new(model: impl Into<String>, input_cost_per_1k: f64, output_cost_per_1k: f64) -> Self {
        Self {
            model: model.into(),
            input_cost_per_1k_tokens: input_cost_per_1k,
            output_cost_per_1k_tokens: output_cost_per_1k,
        }
    }

    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_cost_per_1k_tokens
            + (output_tokens as f64 / 1000.0) * self.output_cost_per_1k_tokens
    }
}
