//! HTTP response handling for errors

use super::types::GatewayError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

impl GatewayError {
    /// Error body as sent to callers, tagged with the request id when known
    pub fn to_error_response(&self, request_id: Option<&str>) -> ErrorResponse {
        if matches!(
            self,
            GatewayError::Internal(_) | GatewayError::Server(_) | GatewayError::Config(_)
        ) {
            error!(request_id = request_id.unwrap_or("-"), "Internal gateway error: {}", self);
        }

        let message = match self {
            GatewayError::Internal(_) | GatewayError::Server(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                retryable: self.is_retryable(),
                timestamp: chrono::Utc::now().timestamp(),
                request_id: request_id.map(str::to_string),
            },
        }
    }

    /// Build the HTTP error response
    pub fn to_http_response(&self, request_id: Option<&str>) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_error_response(request_id))
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Provider(_) => StatusCode::BAD_GATEWAY,
            GatewayError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::NoProvidersAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Serialization(_) => StatusCode::BAD_REQUEST,
            GatewayError::Config(_) | GatewayError::Server(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response(None)
    }
}

/// Standard error response format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    pub timestamp: i64,
    pub request_id: Option<String>,
}
