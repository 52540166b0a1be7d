//! The unit of work a circuit breaker guards

use std::fmt;
use std::future::Future;

use crate::context::Context;

/// A fallible, possibly slow call
///
/// The breaker only looks at the outcome. Implementations should watch the
/// [`Context`] and fail promptly once it is cancelled or past its deadline.
///
/// [`CircuitBreaker`](crate::CircuitBreaker) implements this trait too, so a
/// breaker can stand in for the operation it wraps, or wrap another breaker.
pub trait Operation: Send + Sync {
    type Output: Send;
    type Error: Send;

    fn invoke(
        &self,
        ctx: &Context,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Build an [`Operation`] from an async closure
///
/// # Example
///
/// ```rust
/// use backoff_breaker::{Context, Operation, operation_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ping = operation_fn(|ctx: Context| async move {
///     ctx.run(async { "pong" }).await
/// });
///
/// assert_eq!(ping.invoke(&Context::background()).await.unwrap(), "pong");
/// # }
/// ```
pub fn operation_fn<F>(f: F) -> OperationFn<F> {
    OperationFn { f }
}

/// Operation backed by a closure, see [`operation_fn`]
#[derive(Clone)]
pub struct OperationFn<F> {
    f: F,
}

impl<F, Fut, T, E> Operation for OperationFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, ctx: &Context) -> impl Future<Output = Result<T, E>> + Send {
        (self.f)(ctx.clone())
    }
}

impl<F> fmt::Debug for OperationFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationFn")
            .field("f", &"<closure>")
            .finish()
    }
}
