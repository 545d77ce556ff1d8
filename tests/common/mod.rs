//! Common test utilities for llm-gateway
//!
//! - Scripted provider that never leaves the process
//! - Config and request factories
//! - Custom assertions
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{fixtures, providers::ScriptedProvider};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let provider = ScriptedProvider::new("claude").reply("pong");
//!     let harness = fixtures::Harness::new(vec![provider]);
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod providers;

pub use fixtures::{Harness, RequestFactory};
pub use providers::ScriptedProvider;
