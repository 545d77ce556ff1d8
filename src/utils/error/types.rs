//! Error types for the Gateway

use crate::core::providers::ProviderError;
use thiserror::Error;

/// Result type alias for the Gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the Gateway
///
/// Cloneable so that a single failed upstream computation can be handed to
/// every caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-bound request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream call failed
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Breaker short-circuited the call, the provider was not contacted
    #[error("Circuit breaker is open for provider '{provider}'")]
    CircuitOpen { provider: String },

    /// Upstream signaled throttling
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Call exceeded its configured timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Selection found no eligible provider
    #[error("No providers available: {0}")]
    NoProvidersAvailable(String),

    /// Explicitly requested provider cannot serve the request
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider not found
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn circuit_open(provider: impl Into<String>) -> Self {
        Self::CircuitOpen {
            provider: provider.into(),
        }
    }

    /// Whether a caller may reasonably retry the request later.
    ///
    /// The gateway itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Provider(_)
                | GatewayError::CircuitOpen { .. }
                | GatewayError::RateLimit(_)
                | GatewayError::Timeout(_)
                | GatewayError::NoProvidersAvailable(_)
        )
    }

    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "CONFIG_ERROR",
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::Provider(_) => "PROVIDER_ERROR",
            GatewayError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            GatewayError::RateLimit(_) => "RATE_LIMIT_EXCEEDED",
            GatewayError::Timeout(_) => "TIMEOUT",
            GatewayError::NoProvidersAvailable(_) => "NO_PROVIDERS_AVAILABLE",
            GatewayError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            GatewayError::ProviderNotFound(_) => "PROVIDER_NOT_FOUND",
            GatewayError::Serialization(_) => "SERIALIZATION_ERROR",
            GatewayError::Server(_) | GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
