//! Completion response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the provider stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    StopSequence,
    ContentFilter,
    Unknown,
}

impl FinishReason {
    /// Normalize the vendor-specific stop reason strings
    pub fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | Some("end_turn") => FinishReason::Stop,
            Some("length") | Some("max_tokens") => FinishReason::Length,
            Some("stop_sequence") => FinishReason::StopSequence,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        }
    }
}

/// Token counts as reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Usage and cost of a completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    /// Cost in USD
    pub cost: f64,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32, cost: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            cost,
        }
    }
}

/// Raw result of a non-streaming provider call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCompletion {
    pub content: String,
    pub model: String,
    pub finish_reason: FinishReason,
    /// Provider-reported usage; estimated by the gateway when absent
    pub usage: Option<TokenUsage>,
}

/// Completion response returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
    pub provider: String,
    pub model: String,
    pub finish_reason: FinishReason,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub from_cache: bool,
}

impl CompletionResponse {
    /// Copy of this response marked as served from the cache
    pub fn cached_copy(&self) -> Self {
        Self {
            from_cache: true,
            ..self.clone()
        }
    }
}
