//! Sliding window of recent call outcomes

use super::config::SlidingWindowType;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Classified result of one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    SlowSuccess,
    Failure,
    SlowFailure,
}

impl CallOutcome {
    pub fn classify(success: bool, duration: Duration, slow_threshold: Duration) -> Self {
        let slow = duration > slow_threshold;
        match (success, slow) {
            (true, false) => CallOutcome::Success,
            (true, true) => CallOutcome::SlowSuccess,
            (false, false) => CallOutcome::Failure,
            (false, true) => CallOutcome::SlowFailure,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure | CallOutcome::SlowFailure)
    }

    pub fn is_slow(&self) -> bool {
        matches!(self, CallOutcome::SlowSuccess | CallOutcome::SlowFailure)
    }
}

/// Counters derived from the window contents
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSnapshot {
    pub total_calls: u32,
    pub failed_calls: u32,
    pub slow_calls: u32,
}

impl WindowSnapshot {
    /// Failure rate in percent
    pub fn failure_rate(&self) -> f32 {
        percentage(self.failed_calls, self.total_calls)
    }

    /// Slow-call rate in percent
    pub fn slow_call_rate(&self) -> f32 {
        percentage(self.slow_calls, self.total_calls)
    }
}

fn percentage(part: u32, total: u32) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 * 100.0 / total as f32
    }
}

/// Bounded record of recent outcomes, count- or time-based
#[derive(Debug)]
pub struct SlidingWindow {
    kind: SlidingWindowType,
    size: u32,
    entries: VecDeque<(Instant, CallOutcome)>,
    failed: u32,
    slow: u32,
}

impl SlidingWindow {
    pub fn new(kind: SlidingWindowType, size: u32) -> Self {
        let capacity = match kind {
            SlidingWindowType::CountBased => size as usize,
            SlidingWindowType::TimeBased => 16,
        };
        Self {
            kind,
            size,
            entries: VecDeque::with_capacity(capacity),
            failed: 0,
            slow: 0,
        }
    }

    /// Record an outcome and return the updated counters
    pub fn record(&mut self, outcome: CallOutcome, now: Instant) -> WindowSnapshot {
        self.entries.push_back((now, outcome));
        if outcome.is_failure() {
            self.failed += 1;
        }
        if outcome.is_slow() {
            self.slow += 1;
        }
        self.evict(now);
        self.snapshot_unchecked()
    }

    /// Counters after dropping entries that fell out of the window
    pub fn snapshot(&mut self, now: Instant) -> WindowSnapshot {
        self.evict(now);
        self.snapshot_unchecked()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.failed = 0;
        self.slow = 0;
    }

    fn snapshot_unchecked(&self) -> WindowSnapshot {
        WindowSnapshot {
            total_calls: self.entries.len() as u32,
            failed_calls: self.failed,
            slow_calls: self.slow,
        }
    }

    fn evict(&mut self, now: Instant) {
        match self.kind {
            SlidingWindowType::CountBased => {
                while self.entries.len() > self.size as usize {
                    self.pop_front();
                }
            }
            SlidingWindowType::TimeBased => {
                let span = Duration::from_secs(u64::from(self.size));
                while let Some((at, _)) = self.entries.front() {
                    if now.saturating_duration_since(*at) > span {
                        self.pop_front();
                    } else {
                        break;
                    }
                }
            }
        }
    }

    fn pop_front(&mut self) {
        if let Some((_, outcome)) = self.entries.pop_front() {
            if outcome.is_failure() {
                self.failed -= 1;
            }
            if outcome.is_slow() {
                self.slow -= 1;
            }
        }
    }
}
