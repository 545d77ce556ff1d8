//! Circuit breaker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the sliding window bounds the recorded outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlidingWindowType {
    /// Keep the last `sliding_window_size` calls
    CountBased,
    /// Keep calls from the last `sliding_window_size` seconds
    TimeBased,
}

/// Per-provider breaker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Failure rate (percent) at or above which the breaker opens
    pub failure_rate_threshold: f32,
    /// Slow-call rate (percent) at or above which the breaker opens
    pub slow_call_rate_threshold: f32,
    /// Calls slower than this count as slow
    pub slow_call_duration_threshold: Duration,
    pub sliding_window_type: SlidingWindowType,
    /// Calls (count-based) or seconds (time-based)
    pub sliding_window_size: u32,
    /// Rates are evaluated only once the window holds this many calls
    pub minimum_number_of_calls: u32,
    pub wait_duration_in_open_state: Duration,
    pub permitted_number_of_calls_in_half_open_state: u32,
    pub automatic_transition_from_open_to_half_open_enabled: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            slow_call_rate_threshold: 100.0,
            slow_call_duration_threshold: Duration::from_secs(60),
            sliding_window_type: SlidingWindowType::CountBased,
            sliding_window_size: 10,
            minimum_number_of_calls: 10,
            wait_duration_in_open_state: Duration::from_secs(30),
            permitted_number_of_calls_in_half_open_state: 3,
            automatic_transition_from_open_to_half_open_enabled: true,
        }
    }
}

impl CircuitBreakerConfig {
    /// Minimum calls actually required before evaluating rates.
    ///
    /// A count-based window can never hold more than its size.
    pub fn effective_minimum_calls(&self) -> u32 {
        match self.sliding_window_type {
            SlidingWindowType::CountBased => self
                .minimum_number_of_calls
                .min(self.sliding_window_size)
                .max(1),
            SlidingWindowType::TimeBased => self.minimum_number_of_calls.max(1),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err("failure_rate_threshold must be in (0, 100]".to_string());
        }
        if !(self.slow_call_rate_threshold > 0.0 && self.slow_call_rate_threshold <= 100.0) {
            return Err("slow_call_rate_threshold must be in (0, 100]".to_string());
        }
        if self.sliding_window_size == 0 {
            return Err("sliding_window_size must be greater than 0".to_string());
        }
        if self.minimum_number_of_calls == 0 {
            return Err("minimum_number_of_calls must be greater than 0".to_string());
        }
        if self.permitted_number_of_calls_in_half_open_state == 0 {
            return Err(
                "permitted_number_of_calls_in_half_open_state must be greater than 0".to_string(),
            );
        }
        if self.slow_call_duration_threshold.is_zero() {
            return Err("slow_call_duration_threshold must be greater than 0".to_string());
        }
        Ok(())
    }
}
