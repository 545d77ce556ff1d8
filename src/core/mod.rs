//! Core functionality for the Gateway
//!
//! This module contains provider routing, circuit breaking, response caching,
//! completion orchestration and streaming relay.

pub mod cache_manager;
pub mod circuit_breaker;
pub mod completion;
pub mod cost;
pub mod fingerprint;
pub mod health;
pub mod metrics;
pub mod providers;
pub mod streaming;
pub mod traits;
pub mod types;
