//! Health monitoring for providers
//!
//! A background task probes every registered provider on a fixed interval and
//! writes the result into the provider registry. Health is informational: it
//! is reported by `GET /providers` but does not influence selection.

pub mod monitor;

pub use monitor::HealthMonitor;
