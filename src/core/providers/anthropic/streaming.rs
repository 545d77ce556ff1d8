//! Anthropic stream decoding
//!
//! The Messages API streams typed events; text arrives in
//! `content_block_delta`, the stop reason and output usage in
//! `message_delta`, and `message_stop` terminates the stream.

use futures::StreamExt;
use serde_json::Value;

use crate::core::providers::ProviderError;
use crate::core::providers::sse::data_payloads;
use crate::core::traits::{FragmentStream, ProviderChunk};
use crate::core::types::{FinishReason, TokenUsage};

/// Accumulates stream state across events
#[derive(Debug, Default)]
pub(crate) struct EventDecoder {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    stop_reason: Option<String>,
}

impl EventDecoder {
    /// Decode one event; `Ok(None)` for events that carry nothing for the caller
    pub(crate) fn decode(
        &mut self,
        provider: &str,
        event: &Value,
    ) -> Result<Option<ProviderChunk>, ProviderError> {
        match event.get("type").and_then(Value::as_str) {
            Some("message_start") => {
                self.input_tokens = event
                    .pointer("/message/usage/input_tokens")
                    .and_then(Value::as_u64)
                    .map(|v| v as u32);
                Ok(None)
            }
            Some("content_block_delta") => Ok(event
                .pointer("/delta/text")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(|text| ProviderChunk::Delta(text.to_string()))),
            Some("message_delta") => {
                if let Some(reason) = event.pointer("/delta/stop_reason").and_then(Value::as_str) {
                    self.stop_reason = Some(reason.to_string());
                }
                if let Some(tokens) = event.pointer("/usage/output_tokens").and_then(Value::as_u64) {
                    self.output_tokens = Some(tokens as u32);
                }
                Ok(None)
            }
            Some("message_stop") => Ok(Some(ProviderChunk::Finish {
                finish_reason: FinishReason::from_provider(self.stop_reason.as_deref()),
                usage: match (self.input_tokens, self.output_tokens) {
                    (Some(input_tokens), Some(output_tokens)) => Some(TokenUsage {
                        input_tokens,
                        output_tokens,
                    }),
                    _ => None,
                },
            })),
            Some("error") => {
                let message = event
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("upstream reported an error");
                Err(ProviderError::streaming(provider, message))
            }
            _ => Ok(None),
        }
    }
}

/// Fragment stream over an Anthropic SSE response
pub(crate) fn fragment_stream(provider: String, response: reqwest::Response) -> FragmentStream {
    let stream = async_stream::stream! {
        let mut payloads = Box::pin(data_payloads(provider.clone(), response));
        let mut decoder = EventDecoder::default();

        while let Some(payload) = payloads.next().await {
            let payload = match payload {
                Ok(payload) => payload,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let event: Value = match serde_json::from_str(&payload) {
                Ok(event) => event,
                Err(e) => {
                    yield Err(ProviderError::parsing(&provider, format!("Invalid stream event: {}", e)));
                    return;
                }
            };
            match decoder.decode(&provider, &event) {
                Ok(Some(chunk)) => {
                    let finished = matches!(chunk, ProviderChunk::Finish { .. });
                    yield Ok(chunk);
                    if finished {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        yield Err(ProviderError::streaming(&provider, "stream ended before message_stop"));
    };
    Box::pin(stream)
}
