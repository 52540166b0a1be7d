//! Builder API for ergonomic circuit breaker configuration

use crate::{
    callbacks::Callbacks,
    circuit::{CircuitBreaker, Config},
    clock::{Clock, SystemClock},
    errors::ConfigError,
    operation::Operation,
};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating circuit breakers with fluent API
pub struct CircuitBuilder<C: Clock = SystemClock> {
    name: String,
    config: Config,
    clock: C,
    callbacks: Callbacks,
}

impl CircuitBuilder<SystemClock> {
    /// Create a new builder for a circuit with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Config::default(),
            clock: SystemClock,
            callbacks: Callbacks::new(),
        }
    }
}

impl<C: Clock> CircuitBuilder<C> {
    /// Set the number of consecutive failures tolerated before failing fast
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Set the base unit of the backoff window
    pub fn base_backoff(mut self, base: Duration) -> Self {
        self.config.base_backoff = base;
        self
    }

    /// Set the ceiling of the backoff window
    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.config.max_backoff = max;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a custom time source (typically a [`MockClock`](crate::MockClock) in tests)
    pub fn clock<C2: Clock>(self, clock: C2) -> CircuitBuilder<C2> {
        CircuitBuilder {
            name: self.name,
            config: self.config,
            clock,
            callbacks: self.callbacks,
        }
    }

    /// Set callback for when circuit opens
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_open = Some(Arc::new(f));
        self
    }

    /// Set callback for when a trial call is admitted
    pub fn on_half_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_half_open = Some(Arc::new(f));
        self
    }

    /// Set callback for when circuit closes
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    /// Build the circuit breaker around `operation`
    pub fn build<O: Operation>(self, operation: O) -> Result<CircuitBreaker<O, C>, ConfigError> {
        let backoff = self.config.backoff()?;

        Ok(CircuitBreaker::from_parts(
            self.name,
            operation,
            self.config,
            backoff,
            self.clock,
            self.callbacks,
        ))
    }
}
