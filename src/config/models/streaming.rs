//! Streaming relay configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_channel_capacity() -> usize {
    64
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_overall_timeout() -> u64 {
    300
}

/// Streaming relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Fragments buffered between the relay task and the caller
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Maximum silence between two upstream fragments, in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
    /// Maximum lifetime of one stream, in seconds
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            idle_timeout: default_idle_timeout(),
            overall_timeout: default_overall_timeout(),
        }
    }
}

impl StreamingConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout)
    }
}
