//! Completion orchestration
//!
//! Validates a request, resolves its provider, then either serves it from the
//! fingerprint cache or calls the provider under its circuit breaker and
//! timeout.

mod orchestrator;
mod validation;

pub use orchestrator::{CompletionService, ResolvedRequest};
pub use validation::{DEFAULT_MAX_TOKENS, validate_for_model, validate_request};
