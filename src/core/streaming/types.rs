//! Type definitions for streaming responses

use crate::core::types::{FinishReason, Usage};
use crate::utils::error::{GatewayError, Result};
use actix_web::web;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

/// One item delivered to a streaming caller
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Next piece of generated text, in provider order
    Fragment(String),
    /// Upstream finished normally; always the last event
    Done {
        finish_reason: FinishReason,
        usage: Usage,
    },
    /// Stream failed; always the last event
    Error(GatewayError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Fragment(_))
    }

    /// Render as a server-sent event frame
    pub fn to_sse(&self, request_id: Option<&str>) -> Result<Event> {
        let event = match self {
            StreamEvent::Fragment(content) => {
                Event::new().data(&serde_json::to_string(&FragmentBody { content })?)
            }
            StreamEvent::Done {
                finish_reason,
                usage,
            } => Event::new().event("done").data(&serde_json::to_string(&DoneBody {
                finish_reason: *finish_reason,
                usage,
            })?),
            StreamEvent::Error(error) => Event::new()
                .event("error")
                .data(&serde_json::to_string(&error.to_error_response(request_id))?),
        };
        Ok(event)
    }
}

#[derive(Serialize)]
struct FragmentBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DoneBody<'a> {
    finish_reason: FinishReason,
    usage: &'a Usage,
}

/// Simple Event structure for SSE transmission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Event type
    pub event: Option<String>,
    /// Event data
    pub data: String,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event type
    pub fn event(mut self, event: &str) -> Self {
        self.event = Some(event.to_string());
        self
    }

    /// Set the event data
    pub fn data(mut self, data: &str) -> Self {
        self.data = data.to_string();
        self
    }

    /// Convert event to bytes for SSE transmission
    pub fn to_bytes(&self) -> web::Bytes {
        let mut result = String::new();
        if let Some(event) = &self.event {
            result.push_str(&format!("event: {}\n", event));
        }
        for line in self.data.lines() {
            result.push_str(&format!("data: {}\n", line));
        }
        result.push('\n');
        web::Bytes::from(result)
    }
}

/// Cancels a running stream from anywhere
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the stream; no fragment is delivered afterwards
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pin_project! {
    /// Finite, non-restartable sequence of [`StreamEvent`]s.
    ///
    /// Fragments come through a bounded channel. The terminal event may
    /// instead come through a separate slot, read once the channel closes,
    /// so that it is never lost behind a full channel.
    ///
    /// Dropping the stream cancels the upstream call.
    pub struct CompletionStream {
        #[pin]
        events: ReceiverStream<StreamEvent>,
        terminal: Option<oneshot::Receiver<StreamEvent>>,
        handle: CancelHandle,
        _guard: DropGuard,
        provider: String,
        model: String,
        finished: bool,
    }
}

impl CompletionStream {
    pub(crate) fn new(
        receiver: mpsc::Receiver<StreamEvent>,
        token: CancellationToken,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            events: ReceiverStream::new(receiver),
            terminal: None,
            handle: CancelHandle::new(token.clone()),
            _guard: token.drop_guard(),
            provider: provider.into(),
            model: model.into(),
            finished: false,
        }
    }

    /// Deliver the terminal event through `terminal` after the channel closes
    pub(crate) fn with_terminal(mut self, terminal: oneshot::Receiver<StreamEvent>) -> Self {
        self.terminal = Some(terminal);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStream")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("cancelled", &self.handle.is_cancelled())
            .finish()
    }
}

impl Stream for CompletionStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        // Buffered fragments are discarded once cancelled
        if *this.finished || this.handle.is_cancelled() {
            return Poll::Ready(None);
        }
        match this.events.poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    *this.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => match this.terminal.as_mut() {
                Some(terminal) => match Pin::new(terminal).poll(cx) {
                    Poll::Ready(event) => {
                        *this.finished = true;
                        *this.terminal = None;
                        // A closed slot means the relay ended without a verdict
                        Poll::Ready(event.ok())
                    }
                    Poll::Pending => Poll::Pending,
                },
                None => {
                    *this.finished = true;
                    Poll::Ready(None)
                }
            },
            Poll::Pending => Poll::Pending,
        }
    }
}
