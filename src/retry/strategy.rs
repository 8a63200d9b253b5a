//! The strategy seam for retry execution.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::error::{ClassifyError, ErrorKind};

/// A strategy for retrying failed operations with backoff.
///
/// Implementations decide which error kinds are worth retrying, how long to
/// wait between attempts, and when to give up. The crate ships one
/// implementation, [`RetryPolicy`](crate::retry::RetryPolicy); the trait is
/// the seam for alternatives (fixed delay, deadline-bounded, and so on).
///
/// # Examples
///
/// ```rust
/// use retrykit::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), std::io::Error> {
/// let policy = RetryPolicy::builder()
///     .max_attempts(3)
///     .initial_delay(Duration::from_millis(100))
///     .build();
///
/// let value = policy
///     .execute(|| async { Ok::<_, std::io::Error>(42) })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RetryStrategy: Send + Sync {
    /// Execute an operation under this strategy.
    ///
    /// The operation is re-invoked until it succeeds, fails with a
    /// non-retryable kind, or the attempt budget is exhausted. The closure is
    /// called once per attempt with whatever state it captured; arguments
    /// are forwarded unchanged on every attempt.
    ///
    /// On failure the caller receives the operation's own error value,
    /// whether the strategy gave up or never retried at all: no error is
    /// wrapped, converted, or swallowed.
    async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: ClassifyError + Send + Sync + 'static;

    /// The delay to wait before retry number `retry` (0-indexed), or `None`
    /// when the attempt budget allows no further retry.
    fn delay_for(&self, retry: u32) -> Option<Duration>;

    /// Total number of executions allowed, including the first.
    fn max_attempts(&self) -> u32;

    /// Whether a failure of `kind` is eligible for retry.
    ///
    /// Defaults to retrying everything.
    fn is_retryable(&self, kind: ErrorKind) -> bool {
        let _ = kind;
        true
    }
}
