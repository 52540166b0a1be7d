//! Breaker state record and the gate decision derived from it
//!
//! Everything here is pure: the gate depends only on the snapshot, the
//! current instant, the threshold and the backoff. [`CircuitState`] is never
//! stored; it is recomputed from a snapshot whenever it is asked for.

use std::fmt;
use std::time::{Duration, Instant};

use crate::backoff::Backoff;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Counter at or below the threshold, calls pass through
    Closed,
    /// Tripped and inside the backoff window, calls fail fast
    Open,
    /// Tripped and past the backoff window, calls are let through as trials
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the gate decided for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Closed,
    HalfOpen,
    Open { retry_after: Duration },
}

impl Gate {
    pub fn state(&self) -> CircuitState {
        match self {
            Gate::Closed => CircuitState::Closed,
            Gate::HalfOpen => CircuitState::HalfOpen,
            Gate::Open { .. } => CircuitState::Open,
        }
    }
}

/// The only mutable data of a breaker, always read and written as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakerSnapshot {
    /// Failures since the last allowed-through success
    pub consecutive_failures: u32,
    /// When the most recent allowed-through failure was recorded
    pub last_failure_at: Option<Instant>,
}

impl BreakerSnapshot {
    /// Decide whether a call issued at `now` may reach the operation
    pub fn gate(&self, now: Instant, failure_threshold: u32, backoff: &Backoff) -> Gate {
        if self.consecutive_failures <= failure_threshold {
            return Gate::Closed;
        }

        let window = backoff.delay(self.consecutive_failures - failure_threshold);
        let Some(last_failure_at) = self.last_failure_at else {
            return Gate::HalfOpen;
        };

        let elapsed = now.saturating_duration_since(last_failure_at);
        if elapsed < window {
            Gate::Open {
                retry_after: window - elapsed,
            }
        } else {
            Gate::HalfOpen
        }
    }

    pub(crate) fn record_success(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive_failures)
    }

    pub(crate) fn record_failure(&mut self, now: Instant) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(match self.last_failure_at {
            Some(previous) => previous.max(now),
            None => now,
        });
        self.consecutive_failures
    }
}
