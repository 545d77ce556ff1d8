//! Integration tests for llm-gateway
//!
//! These tests verify the interaction between multiple components: the
//! completion service, breakers, cache, streaming relay and HTTP routes.

pub mod config_tests;
pub mod server_tests;
pub mod streaming_tests;
