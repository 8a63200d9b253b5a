#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry policies with exponential backoff, error classification, and retry
//! telemetry.
//!
//! This crate wraps an arbitrary fallible operation in a [`retry::RetryPolicy`]
//! that:
//!
//! - classifies every failure into a closed set of [`error::ErrorKind`] tags,
//! - retries only the kinds the caller designated as retryable,
//! - sleeps with exponentially growing delay between attempts,
//! - gives up after a configured attempt budget, surfacing the original error
//!   unchanged,
//! - records outcome counters into a [`metrics::RetryMetrics`] sink (a shared
//!   process-wide instance by default, or one injected per policy).
//!
//! The error taxonomy separates transient infrastructure failures (connection
//! resets, timeouts) from real bugs (logic errors): only the former should
//! ever be retried, and a failure outside the retryable set always propagates
//! on first occurrence.
//!
//! # Examples
//!
//! ```rust
//! use retrykit::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), TaggedError> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .multiplier(2.0)
//!     .retry_on(ErrorKind::TRANSIENT)
//!     .build();
//!
//! let value = policy
//!     .execute(|| async { Ok::<_, TaggedError>("payload") })
//!     .await?;
//! assert_eq!(value, "payload");
//! # Ok(())
//! # }
//! ```
//!
//! Aggregate counters are available at any time:
//!
//! ```rust
//! let stats = retrykit::metrics::snapshot();
//! assert!(stats.retries_performed >= stats.successes_after_retry);
//! ```

pub mod error;
pub mod metrics;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import everything needed to wrap an operation with:
///
/// ```rust
/// use retrykit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ClassifyError, ErrorKind, TaggedError};
    pub use crate::metrics::{MetricsSnapshot, RetryMetrics};
    pub use crate::retry::{RetryPolicy, RetryPolicyBuilder, RetryStrategy};
}
