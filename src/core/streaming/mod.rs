//! Streaming relay with cancellation
//!
//! This module relays provider output fragment by fragment and renders it as
//! Server-Sent Events for Actix-web.

use actix_web::HttpResponse;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web;
use crate::utils::error::Result;
use futures::stream::{Stream, StreamExt};

mod relay;
mod types;


pub use relay::StreamingRelay;
pub use types::{CancelHandle, CompletionStream, Event, StreamEvent};

/// Render a completion stream as SSE frames.
///
/// A frame that fails to serialize is replaced by an error event and ends
/// the stream.
pub fn sse_frames(
    stream: CompletionStream,
    request_id: Option<String>,
) -> impl Stream<Item = Result<web::Bytes>> {
    stream.map(move |event| {
        let frame = match event.to_sse(request_id.as_deref()) {
            Ok(frame) => frame,
            Err(error) => StreamEvent::Error(error)
                .to_sse(request_id.as_deref())
                .unwrap_or_else(|_| Event::new().event("error").data("{}")),
        };
        Ok(frame.to_bytes())
    })
}

/// Create a Server-Sent Events response for Actix-web
pub fn create_sse_response<S>(stream: S) -> HttpResponse
where
    S: Stream<Item = Result<web::Bytes>> + 'static,
{
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(stream)
}
