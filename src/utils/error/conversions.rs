//! Conversions into [`GatewayError`]

use super::types::GatewayError;
use crate::core::providers::ProviderError;

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimit { .. } => GatewayError::RateLimit(err.to_string()),
            ProviderError::Timeout { .. } => GatewayError::Timeout(err.to_string()),
            other => GatewayError::Provider(other),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        GatewayError::Config(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Internal(format!("IO error: {}", err))
    }
}
