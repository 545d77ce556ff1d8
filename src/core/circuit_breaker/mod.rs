//! Per-provider circuit breaking
//!
//! Each provider gets a breaker that tracks failure and slow-call rates over a
//! sliding window and moves between CLOSED, OPEN and HALF_OPEN. State lives
//! behind one mutex per provider; unrelated providers never contend.

mod breaker;
mod config;
mod registry;
mod window;


pub use breaker::{CallPermit, CircuitBreaker, CircuitBreakerMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, SlidingWindowType};
pub use registry::{CircuitBreakerRegistry, FallbackHandler};
pub use window::{CallOutcome, WindowSnapshot};
