//! Circuit breaker around a single [`Operation`]
//!
//! The breaker counts consecutive failures. While the count is at or below the
//! threshold every call goes through. Past the threshold, calls fail fast until
//! an exponential backoff window (measured from the last failure) elapses;
//! after that every caller is admitted as a trial until one outcome is
//! recorded. A success anywhere resets the count to zero.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{Instrument, debug, debug_span, info, warn};

use crate::backoff::{Backoff, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_BACKOFF};
use crate::callbacks::{Callbacks, Transition};
use crate::clock::{Clock, SystemClock};
use crate::context::Context;
use crate::errors::{BreakerError, ConfigError};
use crate::operation::Operation;
use crate::state::{BreakerSnapshot, CircuitState, Gate};

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Consecutive failures tolerated before calls start failing fast
    pub failure_threshold: u32,

    /// Base unit of the backoff window (`base * 2^(failures - threshold)`)
    pub base_backoff: Duration,

    /// Ceiling for the backoff window
    pub max_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl Config {
    pub fn with_threshold(failure_threshold: u32) -> Self {
        Self {
            failure_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backoff().map(|_| ())
    }

    pub fn backoff(&self) -> Result<Backoff, ConfigError> {
        Backoff::new(self.base_backoff, self.max_backoff)
    }
}

/// Wrap `operation` in a breaker with the default backoff
pub fn breaker<O: Operation>(operation: O, failure_threshold: u32) -> CircuitBreaker<O> {
    CircuitBreaker::new(operation, failure_threshold)
}

/// Circuit breaker public API
///
/// Share it between tasks with an `Arc`; all methods take `&self`.
pub struct CircuitBreaker<O, C: Clock = SystemClock> {
    name: String,
    operation: O,
    config: Config,
    backoff: Backoff,
    clock: C,
    state: Mutex<BreakerSnapshot>,
    callbacks: Callbacks,
}

impl CircuitBreaker<(), SystemClock> {
    /// Create a new circuit breaker builder
    pub fn builder(name: impl Into<String>) -> crate::builder::CircuitBuilder {
        crate::builder::CircuitBuilder::new(name)
    }
}

impl<O: Operation> CircuitBreaker<O, SystemClock> {
    /// Create a breaker with the default backoff (use builder() for more options)
    pub fn new(operation: O, failure_threshold: u32) -> Self {
        Self::from_parts(
            "circuit".to_string(),
            operation,
            Config::with_threshold(failure_threshold),
            Backoff::default(),
            SystemClock,
            Callbacks::new(),
        )
    }
}

impl<O: Operation, C: Clock> CircuitBreaker<O, C> {
    pub(crate) fn from_parts(
        name: String,
        operation: O,
        config: Config,
        backoff: Backoff,
        clock: C,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            name,
            operation,
            config,
            backoff,
            clock,
            state: Mutex::new(BreakerSnapshot::default()),
            callbacks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// The wrapped operation
    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// Consistent copy of the failure counter and last failure time
    pub fn snapshot(&self) -> BreakerSnapshot {
        *self.lock_state()
    }

    /// State a call issued now would observe
    pub fn state(&self) -> CircuitState {
        self.gate().state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// Time left before the next trial is admitted, if the circuit is open
    pub fn retry_after(&self) -> Option<Duration> {
        match self.gate() {
            Gate::Open { retry_after } => Some(retry_after),
            Gate::Closed | Gate::HalfOpen => None,
        }
    }

    /// Forget all failures and close the circuit
    pub fn reset(&self) {
        *self.lock_state() = BreakerSnapshot::default();
        info!(circuit = %self.name, "circuit reset");
    }

    fn gate(&self) -> Gate {
        let snapshot = self.snapshot();
        snapshot.gate(self.clock.now(), self.config.failure_threshold, &self.backoff)
    }

    fn lock_state(&self) -> MutexGuard<'_, BreakerSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!(circuit = %self.name, "circuit breaker state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn on_success(&self) {
        let previous = self.lock_state().record_success();

        if previous > self.config.failure_threshold {
            info!(previous_failures = previous, "circuit closed");
            self.callbacks.fire(Transition::Closed, &self.name);
        }
    }

    fn on_failure(&self) {
        let failures = {
            let mut state = self.lock_state();
            let now = self.clock.now();
            state.record_failure(now)
        };

        if failures > self.config.failure_threshold {
            warn!(
                consecutive_failures = failures,
                retry_after = ?self.backoff.delay(failures - self.config.failure_threshold),
                "circuit open"
            );
            self.callbacks.fire(Transition::Opened, &self.name);
        } else {
            debug!(consecutive_failures = failures, "call failed");
        }
    }
}

impl<O: Operation, C: Clock> Operation for CircuitBreaker<O, C> {
    type Output = O::Output;
    type Error = BreakerError<O::Error>;

    /// Execute the wrapped operation with circuit breaker protection
    ///
    /// An open circuit returns [`BreakerError::Open`] immediately, whatever
    /// the state of `ctx`. Otherwise the operation runs once and its error, if
    /// any, comes back unchanged inside [`BreakerError::Operation`].
    fn invoke(
        &self,
        ctx: &Context,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        let span = debug_span!("circuit_breaker", circuit = %self.name);

        async move {
            match self.gate() {
                Gate::Open { retry_after } => {
                    debug!(?retry_after, "rejecting call, circuit open");
                    return Err(BreakerError::Open {
                        circuit: self.name.clone(),
                        retry_after,
                    });
                }
                Gate::HalfOpen => {
                    debug!("backoff elapsed, admitting trial call");
                    self.callbacks.fire(Transition::HalfOpened, &self.name);
                }
                Gate::Closed => {}
            }

            match self.operation.invoke(ctx).await {
                Ok(value) => {
                    self.on_success();
                    Ok(value)
                }
                Err(error) => {
                    self.on_failure();
                    Err(BreakerError::Operation(error))
                }
            }
        }
        .instrument(span)
    }
}

impl<O: fmt::Debug, C: Clock> fmt::Debug for CircuitBreaker<O, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.state.lock().map(|s| *s).unwrap_or_else(|p| *p.into_inner());
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("config", &self.config)
            .field("state", &snapshot)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
