//! Upstream provider adapters and the registry that selects between them
//!
//! Each vendor gets one adapter type implementing
//! [`LLMProvider`](crate::core::traits::LLMProvider). The registry keeps a
//! [`ProviderDescriptor`] next to every adapter and performs priority-based
//! selection.

pub mod anthropic;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod openai;
pub mod registry;
pub mod sse;


pub use anthropic::AnthropicProvider;
pub use descriptor::{HealthStatus, ModelSpec, ProviderDescriptor};
pub use error::ProviderError;
pub use openai::OpenAIProvider;
pub use registry::{ProviderRegistry, ProviderSelection};

use crate::config::{ProviderConfig, ProviderType};
use crate::core::traits::LLMProvider;
use crate::utils::error::Result;
use std::sync::Arc;

/// Build the adapter for a configured provider
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider_type {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}
