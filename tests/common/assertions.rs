//! Custom test assertions

use llm_gateway::{CompletionResponse, GatewayError};

/// Assertions for CompletionResponse
pub trait CompletionResponseAssertions {
    /// Assert the response came from `provider` and was not served from the cache
    fn assert_fresh_from(&self, provider: &str);

    /// Assert the usage totals are consistent
    fn assert_usage_consistent(&self);
}

impl CompletionResponseAssertions for CompletionResponse {
    fn assert_fresh_from(&self, provider: &str) {
        assert_eq!(self.provider, provider, "unexpected provider");
        assert!(!self.from_cache, "expected a fresh response, got a cached one");
    }

    fn assert_usage_consistent(&self) {
        assert_eq!(
            self.usage.total_tokens,
            self.usage.input_tokens + self.usage.output_tokens,
            "total tokens must be input plus output"
        );
        assert!(self.usage.cost >= 0.0, "cost must not be negative");
    }
}

/// Assert a result failed because the breaker short-circuited it
pub fn assert_circuit_open<T: std::fmt::Debug>(result: &Result<T, GatewayError>, provider: &str) {
    match result {
        Err(GatewayError::CircuitOpen { provider: p }) => assert_eq!(p, provider),
        other => panic!("expected CircuitOpen for {}, got {:?}", provider, other),
    }
}

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-9_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` (epsilon: `{:?}`)",
            left_val,
            right_val,
            diff,
            $epsilon
        );
    };
}
