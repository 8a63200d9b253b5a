//! Exponential backoff driven by error classification.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::strategy::RetryStrategy;
use crate::error::{ClassifyError, ErrorKind};
use crate::metrics::RetryMetrics;

/// Retry policy with exponential backoff and a caller-chosen retryable set.
///
/// Delays between retries grow multiplicatively: the wait before retry `k`
/// (0-indexed) is `initial_delay * multiplier^k`, capped at `max_delay`, with
/// optional jitter. A failure is retried only when its [`ErrorKind`] is in
/// the policy's retryable set; anything else propagates immediately with no
/// sleep and no attempt consumed.
///
/// Every execution records into the policy's [`RetryMetrics`] sink, which is
/// the shared process-wide instance unless one was injected at build time.
///
/// # Examples
///
/// ```rust
/// use retrykit::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), TaggedError> {
/// let policy = RetryPolicy::builder()
///     .max_attempts(4)
///     .initial_delay(Duration::from_millis(100))
///     .multiplier(2.0)
///     .retry_on([ErrorKind::Connection, ErrorKind::Timeout])
///     .build();
///
/// let value = policy
///     .execute(|| async { Ok::<_, TaggedError>("ok") })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    jitter: f64,
    retry_on: Vec<ErrorKind>,
    logging: bool,
    metrics: Arc<RetryMetrics>,
}

impl RetryPolicy {
    /// Create a builder for configuring a policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Execute a blocking operation under this policy.
    ///
    /// Identical state machine to [`execute`](RetryStrategy::execute), but
    /// the backoff blocks the calling thread with [`std::thread::sleep`]
    /// instead of suspending. For synchronous callers outside an async
    /// runtime; never call this from inside one.
    pub fn execute_blocking<F, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: ClassifyError,
    {
        self.metrics.record_call();
        let mut attempt = 1u32;
        let mut retried = false;
        loop {
            match operation() {
                Ok(value) => {
                    self.observe_success(attempt);
                    return Ok(value);
                }
                Err(err) => match self.observe_failure(&err, attempt, &mut retried) {
                    Some(delay) => {
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    fn observe_success(&self, attempt: u32) {
        if attempt > 1 {
            self.metrics.record_success_after_retry();
            if self.logging {
                info!(
                    attempt,
                    max_attempts = self.max_attempts,
                    "Operation succeeded after retry"
                );
            }
        }
    }

    /// Account for a failed attempt. Returns the backoff to sleep before the
    /// next attempt, or `None` when the error must surface to the caller now.
    fn observe_failure<E>(&self, err: &E, attempt: u32, retried: &mut bool) -> Option<Duration>
    where
        E: ClassifyError,
    {
        let kind = err.classify();
        if !self.is_retryable(kind) {
            // Kinds outside the retryable set surface untouched: nothing is
            // counted or logged for them.
            return None;
        }
        if attempt >= self.max_attempts {
            if self.logging {
                error!(
                    attempts = self.max_attempts,
                    kind = %kind,
                    error = %err,
                    "All retry attempts exhausted, giving up"
                );
            }
            return None;
        }

        let delay = self.delay_for(attempt - 1).unwrap_or(Duration::ZERO);
        self.metrics.record_retry(!*retried);
        *retried = true;
        if self.logging {
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                kind = %kind,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Attempt failed, backing off before retry"
            );
        }
        Some(delay)
    }
}

impl Default for RetryPolicy {
    /// A policy with the builder's defaults: 3 attempts, 100ms initial delay
    /// doubling up to 60s, no jitter, every kind retryable, logging on, and
    /// the shared metrics sink.
    fn default() -> Self {
        Self::builder().build()
    }
}

#[async_trait]
impl RetryStrategy for RetryPolicy {
    async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: ClassifyError + Send + Sync + 'static,
    {
        self.metrics.record_call();
        let mut attempt = 1u32;
        let mut retried = false;
        loop {
            match operation().await {
                Ok(value) => {
                    self.observe_success(attempt);
                    return Ok(value);
                }
                Err(err) => match self.observe_failure(&err, attempt, &mut retried) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_attempts.saturating_sub(1) {
            return None;
        }

        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(retry as i32);

        let jittered = if self.jitter > 0.0 {
            // Jitter spans [base * (1 - jitter), base * (1 + jitter)].
            let jitter_amount = base * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
            base + jitter_amount
        } else {
            base
        };

        Some(Duration::from_secs_f64(
            jittered.min(self.max_delay.as_secs_f64()),
        ))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retry_on.contains(&kind)
    }
}

/// Builder for configuring [`RetryPolicy`].
///
/// Unset parameters fall back to defaults; out-of-range parameters are
/// clamped into their valid range rather than rejected.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    initial_delay: Option<Duration>,
    multiplier: Option<f64>,
    max_delay: Option<Duration>,
    jitter: Option<f64>,
    retry_on: Option<Vec<ErrorKind>>,
    logging: Option<bool>,
    metrics: Option<Arc<RetryMetrics>>,
}

impl RetryPolicyBuilder {
    /// Total number of executions allowed, including the first.
    ///
    /// Clamped to at least 1. With `max_attempts(1)` the policy is a pure
    /// passthrough: no retry, no sleep.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before the second attempt.
    ///
    /// Default: 100ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Factor applied to the delay after each failed attempt.
    ///
    /// Clamped to at least 1.0, so delays never shrink within a call.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Cap on any single computed delay.
    ///
    /// Default: 60s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Jitter factor (0.0 to 1.0): each delay is randomized by ±this
    /// fraction.
    ///
    /// Default: 0.0 (delays follow the geometric schedule exactly)
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// The error kinds eligible for retry. Failures of any other kind
    /// propagate immediately on first occurrence.
    ///
    /// An empty set makes every failure immediately fatal.
    ///
    /// Default: all kinds
    pub fn retry_on<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        self.retry_on = Some(kinds.into_iter().collect());
        self
    }

    /// Retry only [`ErrorKind::TRANSIENT`] kinds: connection failures,
    /// timeouts, and rate limiting.
    pub fn retry_transient(self) -> Self {
        self.retry_on(ErrorKind::TRANSIENT)
    }

    /// Whether attempt/outcome events are emitted to `tracing`.
    ///
    /// Default: true
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = Some(enabled);
        self
    }

    /// Record into `metrics` instead of the shared process-wide instance.
    ///
    /// Injecting a sink gives a policy (or a test) its own isolated counters
    /// without relying on a reset convention.
    pub fn metrics(mut self, metrics: Arc<RetryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the policy, using defaults for any unset parameter.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(3).max(1),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(100)),
            multiplier: self.multiplier.unwrap_or(2.0).max(1.0),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(60)),
            jitter: self.jitter.unwrap_or(0.0),
            retry_on: self.retry_on.unwrap_or_else(|| ErrorKind::ALL.to_vec()),
            logging: self.logging.unwrap_or(true),
            metrics: self.metrics.unwrap_or_else(RetryMetrics::global),
        }
    }
}
