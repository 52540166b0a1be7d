//! Error types for circuit breaker operations

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Stable prefix of every fast-fail message.
pub const OPEN_ERROR_PREFIX: &str = "service unreachable";

/// Errors returned by [`CircuitBreaker::invoke`](crate::CircuitBreaker)
///
/// `Open` is synthesized by the breaker when it fails fast. `Operation` carries
/// the wrapped operation's own error, untouched.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Circuit is open, the call was rejected without invoking the operation
    #[error("service unreachable: circuit '{circuit}' is open, retry in {retry_after:?}")]
    Open {
        circuit: String,
        retry_after: Duration,
    },
    /// The wrapped operation failed
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// True when the breaker rejected the call itself
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// Remaining backoff window for an `Open` rejection
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BreakerError::Open { retry_after, .. } => Some(*retry_after),
            BreakerError::Operation(_) => None,
        }
    }

    pub fn operation_error(&self) -> Option<&E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            BreakerError::Open { .. } => None,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            BreakerError::Open { .. } => None,
        }
    }
}

/// Invalid construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base backoff must be at least one millisecond")]
    ZeroBaseBackoff,
    #[error("max backoff ({max:?}) must not be shorter than base backoff ({base:?})")]
    BackoffCapBelowBase { base: Duration, max: Duration },
    #[error("sharded map needs at least one shard")]
    NoShards,
}

/// Why a [`Context`](crate::Context) stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Returned when work is abandoned because its context finished first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("context {reason}")]
pub struct Cancelled {
    pub reason: CancelReason,
}
