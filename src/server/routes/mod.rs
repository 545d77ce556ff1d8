//! HTTP route modules
//!
//! This module contains all HTTP route handlers organized by functionality.

pub mod completions;
pub mod health;
pub mod providers;

use crate::core::types::RequestContext;
use crate::server::middleware::REQUEST_ID_HEADER;
use actix_web::{HttpRequest, web};

const USER_ID_HEADER: &str = "x-user-id";
const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

/// Configure every gateway route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(completions::configure_routes)
        .configure(providers::configure_routes)
        .configure(health::configure_routes);
}

/// Build the request context from the caller identity headers
pub fn request_context(req: &HttpRequest) -> RequestContext {
    let mut ctx = RequestContext::new();
    if let Some(request_id) = header(req, REQUEST_ID_HEADER) {
        ctx = ctx.with_request_id(request_id);
    }
    if let Some(user_id) = header(req, USER_ID_HEADER) {
        ctx = ctx.with_user(user_id);
    }
    if let Some(organization_id) = header(req, ORGANIZATION_ID_HEADER) {
        ctx = ctx.with_organization(organization_id);
    }
    ctx
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
