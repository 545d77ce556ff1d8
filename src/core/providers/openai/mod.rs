//! OpenAI chat completions adapter

mod provider;
mod streaming;

pub use provider::OpenAIProvider;

/// Default base URL, including the API version segment
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
