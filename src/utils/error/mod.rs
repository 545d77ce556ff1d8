//! Error handling for the Gateway
//!
//! This module defines the error taxonomy surfaced to callers and how each
//! error is rendered over HTTP.

mod conversions;
mod response;
mod types;


pub use response::{ErrorDetail, ErrorResponse};
pub use types::{GatewayError, Result};
