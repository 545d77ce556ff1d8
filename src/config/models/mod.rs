//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod gateway;
pub mod monitoring;
pub mod provider;
pub mod server;
pub mod streaming;

// Re-export all configuration types
pub use cache::*;
pub use circuit_breaker::*;
pub use gateway::*;
pub use monitoring::*;
pub use provider::*;
pub use server::*;
pub use streaming::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default provider timeout in seconds
pub fn default_timeout() -> u64 {
    60
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

pub fn default_priority() -> u32 {
    100
}

pub fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

pub fn default_cache_max_entries() -> u64 {
    10_000
}

pub fn default_max_output_tokens() -> u32 {
    4096
}

pub fn default_context_window() -> u32 {
    128_000
}

pub fn default_true() -> bool {
    true
}
