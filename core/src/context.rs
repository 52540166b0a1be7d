//! Cancellable execution context handed to every operation
//!
//! A [`Context`] combines a cancellation token with an optional deadline.
//! Derived contexts inherit both from their parent: cancelling a parent
//! cancels every child, and a child's deadline is never later than its
//! parent's.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{CancelReason, Cancelled};

/// Cancellation scope for one logical call
///
/// Clones share the same token; use [`Context::child`] for an independently
/// cancellable scope.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A root context that is never cancelled by anything but [`Context::cancel`]
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context cancelled together with `self`, but cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Child context that expires at `deadline` (or at the parent's, if earlier)
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Child context that expires `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and everything derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done, or `None` while it is still live
    pub fn err(&self) -> Option<Cancelled> {
        if self.token.is_cancelled() {
            return Some(Cancelled {
                reason: CancelReason::Cancelled,
            });
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancelled {
                reason: CancelReason::DeadlineExceeded,
            }),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) -> Cancelled {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => Cancelled {
                    reason: CancelReason::Cancelled,
                },
                _ = tokio::time::sleep_until(deadline) => Cancelled {
                    reason: CancelReason::DeadlineExceeded,
                },
            },
            None => {
                self.token.cancelled().await;
                Cancelled {
                    reason: CancelReason::Cancelled,
                }
            }
        }
    }

    /// Drive `future` unless the context finishes first
    ///
    /// An already-finished context returns its error without polling `future`.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if let Some(cancelled) = self.err() {
            return Err(cancelled);
        }

        tokio::select! {
            biased;
            cancelled = self.done() => Err(cancelled),
            output = future => Ok(output),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
