//! Exponential backoff window for a tripped circuit
//!
//! The window doubles with every consecutive failure past the threshold and
//! saturates at a ceiling. Windows are evaluated once with `chrono-machines`
//! (no jitter, microsecond resolution) when the backoff is built, so gating a
//! call is a table lookup.

use crate::errors::ConfigError;
use std::fmt;
use std::time::Duration;

/// Base unit of the window; one failure past the threshold waits `2 * base`
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Ceiling for any backoff window
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Overshoots beyond this are treated as equal to it.
///
/// `2^32` times any millisecond base is far past every sensible ceiling.
pub const MAX_EXPONENT: u32 = 32;

const WINDOW_COUNT: usize = MAX_EXPONENT as usize + 1;

/// Capped exponential backoff: `base * 2^overshoot`, at most `max`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    windows: [Duration; WINDOW_COUNT],
}

impl Backoff {
    /// Create a backoff, rejecting a sub-millisecond base or a ceiling below it
    pub fn new(base: Duration, max: Duration) -> Result<Self, ConfigError> {
        if base.as_millis() == 0 {
            return Err(ConfigError::ZeroBaseBackoff);
        }
        if max < base {
            return Err(ConfigError::BackoffCapBelowBase { base, max });
        }
        Ok(Self::with_bounds(base, max))
    }

    fn with_bounds(base: Duration, max: Duration) -> Self {
        // the policy is unit-agnostic; feed it microseconds
        let policy = chrono_machines::Policy {
            max_attempts: WINDOW_COUNT as _,
            base_delay_ms: as_micros(base),
            multiplier: 2.0,
            max_delay_ms: as_micros(max),
        };

        let mut windows = [max; WINDOW_COUNT];
        for (exponent, window) in windows.iter_mut().enumerate() {
            // attempt 1 is the undoubled base
            let delay_us = policy.calculate_delay((exponent + 1) as _, 0.0) as u64;
            *window = Duration::from_micros(delay_us).min(max);
        }

        Self { base, max, windows }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Window for a circuit `overshoot` failures past its threshold
    pub fn delay(&self, overshoot: u32) -> Duration {
        self.windows[overshoot.min(MAX_EXPONENT) as usize]
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::with_bounds(DEFAULT_BASE_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("base", &self.base)
            .field("max", &self.max)
            .finish()
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
