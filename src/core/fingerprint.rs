//! Request fingerprinting
//!
//! A fingerprint identifies a logical request for caching and deduplication.
//! It covers provider, model, ordered messages, temperature, max tokens,
//! top-p, top-k, system prompt and stop sequences, and deliberately ignores the
//! stream and cache flags. Fields are hashed in a fixed order, each one
//! length-prefixed, with floats rendered at fixed precision.

use crate::core::types::CompletionRequest;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Decimal places kept when hashing floating-point parameters
const FLOAT_PRECISION: usize = 4;

/// Deterministic hash of the cache-relevant request fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a request resolved to `provider` / `model`
    pub fn of(provider: &str, model: &str, request: &CompletionRequest) -> Self {
        let mut hasher = FieldHasher::new();

        hasher.field("provider", provider.as_bytes());
        hasher.field("model", model.as_bytes());

        hasher.field("messages", &(request.messages.len() as u64).to_le_bytes());
        for message in &request.messages {
            hasher.field("role", message.role.as_str().as_bytes());
            hasher.field("content", message.content.as_bytes());
        }

        hasher.optional("temperature", request.temperature.map(normalize_float));
        hasher.optional("max_tokens", request.max_tokens.map(|v| v.to_string()));
        hasher.optional("top_p", request.top_p.map(normalize_float));
        hasher.optional("top_k", request.top_k.map(|v| v.to_string()));
        hasher.optional("system_prompt", request.system_prompt.clone());

        hasher.field("stop", &(request.stop.len() as u64).to_le_bytes());
        for stop in &request.stop {
            hasher.field("stop_sequence", stop.as_bytes());
        }

        Self(hasher.finish())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a float at fixed precision; `-0.0` and `0.0` hash identically
fn normalize_float(value: f32) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*}", FLOAT_PRECISION, value)
}

struct FieldHasher {
    inner: Sha256,
}

impl FieldHasher {
    fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    fn field(&mut self, name: &str, value: &[u8]) {
        self.inner.update(name.as_bytes());
        self.inner.update((value.len() as u64).to_le_bytes());
        self.inner.update(value);
    }

    fn optional(&mut self, name: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.inner.update([1u8]);
                self.field(name, value.as_bytes());
            }
            None => {
                self.inner.update([0u8]);
                self.inner.update(name.as_bytes());
            }
        }
    }

    fn finish(self) -> String {
        hex::encode(self.inner.finalize())
    }
}
