//! OpenAI stream decoding
//!
//! Each chunk carries a `choices[0].delta`; the finish reason arrives on the
//! last content chunk and usage on a trailing choice-less chunk, after which
//! the stream ends with `[DONE]`.

use futures::StreamExt;
use serde_json::Value;

use crate::core::providers::ProviderError;
use crate::core::providers::sse::data_payloads;
use crate::core::traits::{FragmentStream, ProviderChunk};
use crate::core::types::{FinishReason, TokenUsage};

#[derive(Debug, Default)]
pub(crate) struct ChunkDecoder {
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
}

impl ChunkDecoder {
    /// Text delta carried by `chunk`, if any
    pub(crate) fn decode(
        &mut self,
        provider: &str,
        chunk: &Value,
    ) -> Result<Option<String>, ProviderError> {
        if let Some(error) = chunk.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("upstream reported an error");
            return Err(ProviderError::streaming(provider, message));
        }

        if let Some(usage) = chunk.get("usage").filter(|u| !u.is_null()) {
            let input = usage.get("prompt_tokens").and_then(Value::as_u64);
            let output = usage.get("completion_tokens").and_then(Value::as_u64);
            if let (Some(input), Some(output)) = (input, output) {
                self.usage = Some(TokenUsage {
                    input_tokens: input as u32,
                    output_tokens: output as u32,
                });
            }
        }

        let choice = chunk.pointer("/choices/0");
        if let Some(reason) = choice
            .and_then(|c| c.get("finish_reason"))
            .and_then(Value::as_str)
        {
            self.finish_reason = Some(reason.to_string());
        }

        Ok(choice
            .and_then(|c| c.pointer("/delta/content"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string))
    }

    /// Terminal chunk, once the upstream signaled completion
    pub(crate) fn finish(&self) -> Option<ProviderChunk> {
        self.finish_reason.as_deref().map(|reason| ProviderChunk::Finish {
            finish_reason: FinishReason::from_provider(Some(reason)),
            usage: self.usage,
        })
    }
}

/// Fragment stream over an OpenAI SSE response
pub(crate) fn fragment_stream(provider: String, response: reqwest::Response) -> FragmentStream {
    let stream = async_stream::stream! {
        let mut payloads = Box::pin(data_payloads(provider.clone(), response));
        let mut decoder = ChunkDecoder::default();

        while let Some(payload) = payloads.next().await {
            let payload = match payload {
                Ok(payload) => payload,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let chunk: Value = match serde_json::from_str(&payload) {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ProviderError::parsing(&provider, format!("Invalid stream chunk: {}", e)));
                    return;
                }
            };
            match decoder.decode(&provider, &chunk) {
                Ok(Some(text)) => yield Ok(ProviderChunk::Delta(text)),
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        match decoder.finish() {
            Some(finish) => yield Ok(finish),
            None => yield Err(ProviderError::streaming(&provider, "stream ended without a finish reason")),
        }
    };
    Box::pin(stream)
}
