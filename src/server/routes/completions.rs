//! Completion endpoints

use super::request_context;
use crate::core::streaming::{create_sse_response, sse_frames};
use crate::core::types::CompletionRequest;
use crate::server::state::AppState;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::{debug, warn};

/// Configure completion routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/completions", web::post().to(create_completion))
        .route("/completions/stream", web::post().to(stream_completion));
}

/// Non-streaming completion
pub async fn create_completion(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<CompletionRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = request_context(&req);
    debug!(request_id = %ctx.request_id, "Completion request");

    match state.completions.complete(&ctx, &request).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            warn!(request_id = %ctx.request_id, error = %e, "Completion failed");
            Ok(e.to_http_response(Some(&ctx.request_id)))
        }
    }
}

/// Streaming completion as Server-Sent Events.
///
/// The client disconnecting drops the response body, which cancels the
/// upstream call.
pub async fn stream_completion(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<CompletionRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = request_context(&req);
    let mut request = request.into_inner();
    request.stream = true;
    debug!(request_id = %ctx.request_id, "Streaming completion request");

    match state.relay.stream(&ctx, &request).await {
        Ok(stream) => Ok(create_sse_response(sse_frames(
            stream,
            Some(ctx.request_id.clone()),
        ))),
        Err(e) => {
            warn!(request_id = %ctx.request_id, error = %e, "Stream could not be opened");
            Ok(e.to_http_response(Some(&ctx.request_id)))
        }
    }
}
