//! HTTP plumbing shared by the vendor adapters

use super::error::ProviderError;
use reqwest::{Client, Response, header::RETRY_AFTER};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client used by every adapter.
///
/// No overall request timeout is set here: streams may legitimately run for
/// minutes, and callers bound each call themselves.
pub fn build_client(provider: &str) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("llm-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::network(provider, format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport-level failure
pub fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(provider, error.to_string())
    } else {
        ProviderError::network(provider, format!("Network error: {}", error))
    }
}

/// Pass a 2xx response through, turn anything else into a [`ProviderError`]
pub async fn ensure_success(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    Err(ProviderError::from_http_status(
        provider,
        status.as_u16(),
        &body,
        retry_after,
    ))
}

/// Join a base URL and a path without doubling slashes
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
