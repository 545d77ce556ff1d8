//! Circuit breaker settings

use crate::core::circuit_breaker::{CircuitBreakerConfig, SlidingWindowType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_failure_rate_threshold() -> f32 {
    50.0
}

fn default_slow_call_rate_threshold() -> f32 {
    100.0
}

fn default_slow_call_duration_threshold() -> u64 {
    60
}

fn default_sliding_window_type() -> SlidingWindowType {
    SlidingWindowType::CountBased
}

fn default_sliding_window_size() -> u32 {
    10
}

fn default_minimum_number_of_calls() -> u32 {
    10
}

fn default_wait_duration_in_open_state() -> u64 {
    30
}

fn default_permitted_calls_in_half_open_state() -> u32 {
    3
}

fn default_automatic_transition() -> bool {
    true
}

/// Breaker settings as written in the config file, durations in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f32,
    #[serde(default = "default_slow_call_rate_threshold")]
    pub slow_call_rate_threshold: f32,
    #[serde(default = "default_slow_call_duration_threshold")]
    pub slow_call_duration_threshold: u64,
    #[serde(default = "default_sliding_window_type")]
    pub sliding_window_type: SlidingWindowType,
    #[serde(default = "default_sliding_window_size")]
    pub sliding_window_size: u32,
    #[serde(default = "default_minimum_number_of_calls")]
    pub minimum_number_of_calls: u32,
    #[serde(default = "default_wait_duration_in_open_state")]
    pub wait_duration_in_open_state: u64,
    #[serde(default = "default_permitted_calls_in_half_open_state")]
    pub permitted_number_of_calls_in_half_open_state: u32,
    #[serde(default = "default_automatic_transition")]
    pub automatic_transition_from_open_to_half_open_enabled: bool,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_rate_threshold: default_failure_rate_threshold(),
            slow_call_rate_threshold: default_slow_call_rate_threshold(),
            slow_call_duration_threshold: default_slow_call_duration_threshold(),
            sliding_window_type: default_sliding_window_type(),
            sliding_window_size: default_sliding_window_size(),
            minimum_number_of_calls: default_minimum_number_of_calls(),
            wait_duration_in_open_state: default_wait_duration_in_open_state(),
            permitted_number_of_calls_in_half_open_state:
                default_permitted_calls_in_half_open_state(),
            automatic_transition_from_open_to_half_open_enabled: default_automatic_transition(),
        }
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            failure_rate_threshold: settings.failure_rate_threshold,
            slow_call_rate_threshold: settings.slow_call_rate_threshold,
            slow_call_duration_threshold: Duration::from_secs(
                settings.slow_call_duration_threshold,
            ),
            sliding_window_type: settings.sliding_window_type,
            sliding_window_size: settings.sliding_window_size,
            minimum_number_of_calls: settings.minimum_number_of_calls,
            wait_duration_in_open_state: Duration::from_secs(settings.wait_duration_in_open_state),
            permitted_number_of_calls_in_half_open_state: settings
                .permitted_number_of_calls_in_half_open_state,
            automatic_transition_from_open_to_half_open_enabled: settings
                .automatic_transition_from_open_to_half_open_enabled,
        }
    }
}
