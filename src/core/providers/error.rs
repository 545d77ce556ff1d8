//! Provider error type
//!
//! Every vendor adapter reports failures through [`ProviderError`]. The
//! orchestrator records any of them as a breaker failure before converting it
//! into a [`GatewayError`](crate::utils::error::GatewayError).
//!
//! | Variant | Upstream signal | Gateway mapping |
//! |------|------|------|
//! | Authentication | 401 / 403 | ProviderError (502) |
//! | RateLimit | 429 | RateLimitError (429) |
//! | Timeout | 408 / 504 / local timeout | TimeoutError (504) |
//! | Network | connect / transport failure | ProviderError (502) |
//! | Api | any other non-2xx | ProviderError (502) |
//! | ResponseParsing | malformed body | ProviderError (502) |
//! | Streaming | broken event stream | ProviderError (502) |

/// Unified provider error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed for {provider}: {message}")]
    Authentication { provider: String, message: String },

    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimit {
        provider: String,
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Request to {provider} timed out: {message}")]
    Timeout { provider: String, message: String },

    #[error("Network error for {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    ResponseParsing { provider: String, message: String },

    #[error("Stream from {provider} failed: {message}")]
    Streaming { provider: String, message: String },
}

impl ProviderError {
    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limit(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        let message = match retry_after {
            Some(secs) => format!("retry after {} seconds", secs),
            None => "upstream throttled the request".to_string(),
        };
        Self::RateLimit {
            provider: provider.into(),
            message,
            retry_after,
        }
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn api(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn parsing(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn streaming(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Streaming {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status from an upstream API
    pub fn from_http_status(
        provider: impl Into<String>,
        status: u16,
        body: &str,
        retry_after: Option<u64>,
    ) -> Self {
        let provider = provider.into();
        match status {
            401 | 403 => Self::authentication(provider, body),
            429 => Self::RateLimit {
                provider,
                message: body.to_string(),
                retry_after,
            },
            408 | 504 => Self::timeout(provider, body),
            _ => Self::api(provider, status, body),
        }
    }

    /// Name of the provider that produced the error
    pub fn provider(&self) -> &str {
        match self {
            Self::Authentication { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Network { provider, .. }
            | Self::Api { provider, .. }
            | Self::ResponseParsing { provider, .. }
            | Self::Streaming { provider, .. } => provider,
        }
    }

    /// Seconds the upstream asked us to wait, if it said so
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
