//! Token and cost estimation
//!
//! Token counts are approximated from character counts per model family.
//! Costs come from per-model rates configured per 1K tokens.

pub mod calculator;
pub mod types;

pub use calculator::{CostEstimator, estimate_tokens};
pub use types::{ModelFamily, ModelPricing};
