//! Rate-based circuit breaker for one provider

use super::config::CircuitBreakerConfig;
use super::window::{CallOutcome, SlidingWindow, WindowSnapshot};
use crate::core::providers::ProviderError;
use crate::core::types::RequestContext;
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Breaker mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of a breaker
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub total_calls: u32,
    pub failed_calls: u32,
    pub slow_calls: u32,
    pub failure_rate: f32,
    pub slow_call_rate: f32,
    /// Calls rejected without contacting the provider
    pub not_permitted_calls: u64,
    /// Trial calls still available while half-open
    pub half_open_permits_remaining: u32,
    pub last_transition_at: DateTime<Utc>,
}

struct BreakerInner {
    state: CircuitState,
    window: SlidingWindow,
    opened_at: Option<Instant>,
    half_open_issued: u32,
    half_open_completed: u32,
    /// Bumped on every transition so late outcomes can be told apart
    generation: u64,
    not_permitted_calls: u64,
    last_transition_at: DateTime<Utc>,
}

/// Circuit breaker guarding calls to a single provider
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let window = SlidingWindow::new(config.sliding_window_type, config.sliding_window_size);
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                half_open_issued: 0,
                half_open_completed: 0,
                generation: 0,
                not_permitted_calls: 0,
                last_transition_at: Utc::now(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, applying a due OPEN → HALF_OPEN transition first
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, Instant::now());
        inner.state
    }

    /// Whether a call would be let through right now, without consuming a permit
    pub fn is_call_permitted(&self) -> bool {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, Instant::now());
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                inner.half_open_issued < self.config.permitted_number_of_calls_in_half_open_state
            }
        }
    }

    /// Acquire permission for one call.
    ///
    /// Fails with [`GatewayError::CircuitOpen`] while open or once every
    /// half-open trial permit is taken.
    pub fn try_acquire(self: &Arc<Self>, ctx: &RequestContext) -> Result<CallPermit> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);

        let state = inner.state;
        let permitted = match state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.half_open_issued < self.config.permitted_number_of_calls_in_half_open_state
                {
                    inner.half_open_issued += 1;
                    true
                } else {
                    false
                }
            }
        };

        if !permitted {
            inner.not_permitted_calls += 1;
            debug!(
                request_id = %ctx.request_id,
                provider = %self.name,
                state = ?inner.state,
                "Circuit breaker rejected call"
            );
            return Err(GatewayError::circuit_open(&self.name));
        }

        Ok(CallPermit {
            breaker: Arc::clone(self),
            generation: inner.generation,
            started_at: now,
            finished: false,
        })
    }

    /// Run `call` under breaker protection, recording its outcome
    pub async fn call<F, T>(self: &Arc<Self>, ctx: &RequestContext, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ProviderError>>,
    {
        let permit = self.try_acquire(ctx)?;
        match call.await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(error) => {
                permit.record_failure();
                Err(error.into())
            }
        }
    }

    /// Explicit OPEN → HALF_OPEN trigger; returns whether a transition happened
    pub fn transition_to_half_open(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return false;
        }
        self.to_half_open(&mut inner);
        true
    }

    /// Force the breaker back to CLOSED with empty counters
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.to_closed(&mut inner);
        inner.not_permitted_calls = 0;
        debug!(provider = %self.name, "Circuit breaker reset");
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);
        let snapshot = inner.window.snapshot(now);
        let remaining = match inner.state {
            CircuitState::HalfOpen => self
                .config
                .permitted_number_of_calls_in_half_open_state
                .saturating_sub(inner.half_open_issued),
            _ => 0,
        };
        CircuitBreakerMetrics {
            state: inner.state,
            total_calls: snapshot.total_calls,
            failed_calls: snapshot.failed_calls,
            slow_calls: snapshot.slow_calls,
            failure_rate: snapshot.failure_rate(),
            slow_call_rate: snapshot.slow_call_rate(),
            not_permitted_calls: inner.not_permitted_calls,
            half_open_permits_remaining: remaining,
            last_transition_at: inner.last_transition_at,
        }
    }

    fn on_outcome(&self, generation: u64, outcome: CallOutcome) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let state = inner.state;

        match state {
            CircuitState::Closed => {
                let snapshot = inner.window.record(outcome, now);
                if self.exceeds_thresholds(&snapshot) {
                    warn!(
                        provider = %self.name,
                        failure_rate = snapshot.failure_rate(),
                        slow_call_rate = snapshot.slow_call_rate(),
                        calls = snapshot.total_calls,
                        "Circuit breaker opening"
                    );
                    self.to_open(&mut inner, now);
                }
            }
            CircuitState::HalfOpen => {
                if generation != inner.generation {
                    debug!(provider = %self.name, "Ignoring outcome of a call started before half-open");
                    return;
                }
                if outcome.is_failure() {
                    warn!(provider = %self.name, "Trial call failed, circuit breaker reopening");
                    self.to_open(&mut inner, now);
                    return;
                }

                inner.half_open_completed += 1;
                let snapshot = inner.window.record(outcome, now);
                if inner.half_open_completed >= self.config.permitted_number_of_calls_in_half_open_state {
                    if snapshot.slow_call_rate() >= self.config.slow_call_rate_threshold {
                        warn!(
                            provider = %self.name,
                            slow_call_rate = snapshot.slow_call_rate(),
                            "Trial calls too slow, circuit breaker reopening"
                        );
                        self.to_open(&mut inner, now);
                    } else {
                        info!(provider = %self.name, "Circuit breaker closed after successful trial calls");
                        self.to_closed(&mut inner);
                    }
                }
            }
            CircuitState::Open => {
                debug!(provider = %self.name, ?outcome, "Outcome arrived while open, ignored");
            }
        }
    }

    fn release(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen && inner.generation == generation {
            inner.half_open_issued = inner.half_open_issued.saturating_sub(1);
            debug!(provider = %self.name, "Released unrecorded trial permit");
        }
    }

    fn exceeds_thresholds(&self, snapshot: &WindowSnapshot) -> bool {
        snapshot.total_calls >= self.config.effective_minimum_calls()
            && (snapshot.failure_rate() >= self.config.failure_rate_threshold
                || snapshot.slow_call_rate() >= self.config.slow_call_rate_threshold)
    }

    fn maybe_half_open(&self, inner: &mut BreakerInner, now: Instant) {
        if inner.state != CircuitState::Open
            || !self
                .config
                .automatic_transition_from_open_to_half_open_enabled
        {
            return;
        }
        let waited = inner
            .opened_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::ZERO);
        if waited >= self.config.wait_duration_in_open_state {
            self.to_half_open(inner);
        }
    }

    fn to_open(&self, inner: &mut BreakerInner, now: Instant) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.half_open_issued = 0;
        inner.half_open_completed = 0;
        inner.generation += 1;
        inner.last_transition_at = Utc::now();
    }

    fn to_half_open(&self, inner: &mut BreakerInner) {
        info!(provider = %self.name, "Circuit breaker transitioning from Open to HalfOpen");
        inner.state = CircuitState::HalfOpen;
        inner.window.clear();
        inner.half_open_issued = 0;
        inner.half_open_completed = 0;
        inner.generation += 1;
        inner.last_transition_at = Utc::now();
    }

    fn to_closed(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.window.clear();
        inner.opened_at = None;
        inner.half_open_issued = 0;
        inner.half_open_completed = 0;
        inner.generation += 1;
        inner.last_transition_at = Utc::now();
    }
}

/// Permission for one call through the breaker.
///
/// Recording consumes the permit. A permit dropped without recording (the
/// caller went away) counts as neither success nor failure and hands its
/// half-open trial slot back.
#[must_use = "record the call outcome or drop the permit to release it"]
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    started_at: Instant,
    finished: bool,
}

impl CallPermit {
    /// Time since the permit was granted
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn record_success(self) -> CallOutcome {
        self.record(true)
    }

    pub fn record_failure(self) -> CallOutcome {
        self.record(false)
    }

    /// Record the outcome, classifying it as slow from the elapsed time
    pub fn record(mut self, success: bool) -> CallOutcome {
        self.finished = true;
        let outcome = CallOutcome::classify(
            success,
            self.elapsed(),
            self.breaker.config.slow_call_duration_threshold,
        );
        self.breaker.on_outcome(self.generation, outcome);
        outcome
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.finished {
            self.breaker.release(self.generation);
        }
    }
}
