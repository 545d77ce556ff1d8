//! Anthropic Messages API adapter

mod provider;
mod streaming;

pub use provider::AnthropicProvider;

/// Default base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default `anthropic-version` header value
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
