// src/watch/throttle.rs

use std::time::Duration;

use tokio::time::Instant;

/// Decide whether an execution at `now` respects `min_interval`.
///
/// A zero interval never throttles, and nothing is throttled before the
/// first execution. Otherwise `now` has to be strictly later than
/// `last + min_interval`.
pub fn allow(last: Option<Instant>, min_interval: Duration, now: Instant) -> bool {
    if min_interval.is_zero() {
        return true;
    }
    match last {
        None => true,
        Some(last) => now > last + min_interval,
    }
}

/// Single global execution clock.
///
/// Shared by every path and event type: a burst in one directory can hold
/// back commands for another.
#[derive(Debug, Clone)]
pub struct ThrottleGate {
    min_interval: Duration,
    last_execution: Option<Instant>,
}

impl ThrottleGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_execution: None,
        }
    }

    pub fn last_execution(&self) -> Option<Instant> {
        self.last_execution
    }

    /// Check the gate and, if it is open, record `now` as the latest
    /// execution.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        if !allow(self.last_execution, self.min_interval, now) {
            return false;
        }
        self.last_execution = Some(now);
        true
    }
}
