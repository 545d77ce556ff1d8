//! Server-sent event decoding for upstream streams

use super::error::ProviderError;
use futures::{Stream, StreamExt};

/// Marker some vendors send as the last data payload
const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder turning raw bytes into `data:` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every complete data payload it finished
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = parse_data_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        parse_data_line(&line)
    }
}

fn parse_data_line(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

/// Data payloads of an SSE response body, ending at `[DONE]` or end of body
pub fn data_payloads(
    provider: String,
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, ProviderError>> + Send + 'static {
    async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut decoder = SseLineDecoder::new();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for payload in decoder.push(&bytes) {
                        if payload == DONE_MARKER {
                            return;
                        }
                        yield Ok(payload);
                    }
                }
                Err(e) => {
                    yield Err(ProviderError::streaming(&provider, format!("Stream error: {}", e)));
                    return;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            if payload != DONE_MARKER {
                yield Ok(payload);
            }
        }
    }
}
