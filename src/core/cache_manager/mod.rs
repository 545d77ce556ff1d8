//! Response cache with request deduplication
//!
//! Responses are stored by request fingerprint with a TTL. Concurrent callers
//! asking for the same missing fingerprint share a single upstream
//! computation and all receive its result, success or error.

pub mod manager;
pub mod types;


pub use manager::ResponseCache;
pub use types::{CacheEntry, CacheStats};
