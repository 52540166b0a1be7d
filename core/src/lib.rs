//! backoff-breaker - consecutive-failure circuit breaker with exponential backoff
//!
//! This crate provides:
//! - A circuit breaker decorator around any async [`Operation`]
//!   (Closed → Open → HalfOpen → Closed)
//! - Backoff windows that double with every failure past the threshold, capped
//! - A single lock around the failure counter and timestamp, safe to share
//!   between tasks
//! - An injectable [`Clock`] so backoff timing can be tested without sleeping
//! - Small coordination helpers: [`funnel`] (fan-in) and [`ShardedMap`]
//!
//! # Example
//!
//! ```rust
//! use backoff_breaker::{BreakerError, CircuitBreaker, Context, Operation, operation_fn};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lookup = operation_fn(|ctx: Context| async move {
//!     ctx.run(async { Err::<u32, _>("upstream down") })
//!         .await
//!         .unwrap_or(Err("cancelled"))
//! });
//!
//! let circuit = CircuitBreaker::builder("lookup")
//!     .failure_threshold(1)
//!     .base_backoff(Duration::from_millis(500))
//!     .on_open(|name| println!("Circuit {} opened!", name))
//!     .build(lookup)
//!     .expect("valid configuration");
//!
//! let ctx = Context::background();
//! for _ in 0..2 {
//!     // failures reach the operation and come back unchanged
//!     assert!(matches!(
//!         circuit.invoke(&ctx).await,
//!         Err(BreakerError::Operation("upstream down"))
//!     ));
//! }
//!
//! // past the threshold, calls fail fast
//! let err = circuit.invoke(&ctx).await.unwrap_err();
//! assert!(err.is_open());
//! assert!(err.to_string().starts_with("service unreachable"));
//! # }
//! ```

pub mod backoff;
pub mod builder;
pub mod callbacks;
pub mod circuit;
pub mod clock;
pub mod context;
pub mod errors;
pub mod funnel;
pub mod operation;
pub mod sharded;
pub mod state;

pub use backoff::{Backoff, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_BACKOFF, MAX_EXPONENT};
pub use builder::CircuitBuilder;
pub use callbacks::{Callbacks, Transition, TransitionHook};
pub use circuit::{CircuitBreaker, Config, breaker};
pub use clock::{Clock, MockClock, SystemClock};
pub use context::Context;
pub use errors::{BreakerError, CancelReason, Cancelled, ConfigError, OPEN_ERROR_PREFIX};
pub use funnel::funnel;
pub use operation::{Operation, OperationFn, operation_fn};
pub use sharded::ShardedMap;
pub use state::{BreakerSnapshot, CircuitState, Gate};
