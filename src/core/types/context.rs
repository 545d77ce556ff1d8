//! Per-request context passed explicitly through every call boundary

use std::time::{Duration, Instant};
use uuid::Uuid;

/// Caller identity and tracing information for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request id, taken from `X-Request-Id` or generated
    pub request_id: String,
    /// Already-authorized user, if the caller forwarded one
    pub user_id: Option<String>,
    /// Organization the user acts for
    pub organization_id: Option<String>,
    /// When the gateway accepted the request
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            user_id: None,
            organization_id: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Time since the request was accepted
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
