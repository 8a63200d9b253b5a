//! Retry execution with exponential backoff.
//!
//! # Key Types
//!
//! - [`RetryStrategy`] - Core trait for retrying strategies
//! - [`RetryPolicy`] - Exponential backoff driven by error classification
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
//!     .retry_transient()
//!     .build();
//!
//! let value = policy
//!     .execute(|| async {
//!         // Your operation here
//!         Ok::<_, TaggedError>(42)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod policy;
mod strategy;

pub use policy::{RetryPolicy, RetryPolicyBuilder};
pub use strategy::RetryStrategy;
