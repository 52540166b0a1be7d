//! Fan-in: merge several channels into one
//!
//! Each source gets its own forwarding task. The merged receiver closes once
//! every source has closed and been drained. Values from one source keep their
//! relative order; there is no ordering across sources.

use tokio::sync::mpsc;
use tracing::trace;

/// Merge `sources` into a single receiver with room for `capacity` buffered values
///
/// Must be called from within a Tokio runtime. A `capacity` of zero is treated
/// as one. Dropping the returned receiver stops each forwarder at its next
/// value.
pub fn funnel<T, I>(sources: I, capacity: usize) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = mpsc::Receiver<T>>,
{
    let (dest, merged) = mpsc::channel(capacity.max(1));

    for (index, mut source) in sources.into_iter().enumerate() {
        let dest = dest.clone();
        tokio::spawn(async move {
            while let Some(value) = source.recv().await {
                if dest.send(value).await.is_err() {
                    trace!(source = index, "funnel output dropped, stopping forwarder");
                    return;
                }
            }
            trace!(source = index, "funnel source drained");
        });
    }

    merged
}
