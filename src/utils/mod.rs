//! Utility modules for the Gateway
//!
//! - **error**: Error taxonomy and HTTP rendering
//! - **logging**: Tracing subscriber setup

pub mod error;
pub mod logging;
