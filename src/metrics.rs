//! Aggregate retry telemetry.
//!
//! Every [`RetryPolicy`](crate::retry::RetryPolicy) records call outcomes
//! into a [`RetryMetrics`] sink. By default all policies share one
//! process-wide instance ([`RetryMetrics::global`]); tests and callers that
//! need isolation can inject their own via
//! [`RetryPolicyBuilder::metrics`](crate::retry::RetryPolicyBuilder::metrics).
//!
//! Counters are atomic, so the sink is safe to share across threads. State is
//! in-process only and [`reset`] is the sole teardown: call it between
//! independent test cases that assert on the global instance.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use serde::Serialize;

static GLOBAL: LazyLock<Arc<RetryMetrics>> = LazyLock::new(|| Arc::new(RetryMetrics::new()));

/// Counters tracking retry behavior across calls.
///
/// One increment per *call* for [`total_calls`](MetricsSnapshot::total_calls)
/// and [`calls_retried`](MetricsSnapshot::calls_retried); one increment per
/// *retry* for [`retries_performed`](MetricsSnapshot::retries_performed).
#[derive(Debug, Default)]
pub struct RetryMetrics {
    total_calls: AtomicU64,
    calls_retried: AtomicU64,
    retries_performed: AtomicU64,
    successes_after_retry: AtomicU64,
}

impl RetryMetrics {
    /// Create a zeroed, standalone metrics sink.
    pub const fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            calls_retried: AtomicU64::new(0),
            retries_performed: AtomicU64::new(0),
            successes_after_retry: AtomicU64::new(0),
        }
    }

    /// The shared process-wide instance that policies record into unless the
    /// caller injects another sink.
    pub fn global() -> Arc<RetryMetrics> {
        Arc::clone(&GLOBAL)
    }

    pub(crate) fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_retry(&self, first_for_call: bool) {
        self.retries_performed.fetch_add(1, Ordering::SeqCst);
        if first_for_call {
            self.calls_retried.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_success_after_retry(&self) {
        self.successes_after_retry.fetch_add(1, Ordering::SeqCst);
    }

    /// A point-in-time copy of the counters with derived rates.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_calls = self.total_calls.load(Ordering::SeqCst);
        let calls_retried = self.calls_retried.load(Ordering::SeqCst);
        let retries_performed = self.retries_performed.load(Ordering::SeqCst);
        let successes_after_retry = self.successes_after_retry.load(Ordering::SeqCst);

        MetricsSnapshot {
            total_calls,
            calls_retried,
            retries_performed,
            successes_after_retry,
            retry_rate: ratio(retries_performed, total_calls),
            success_after_retry_rate: ratio(successes_after_retry, retries_performed),
            avg_retries: ratio(retries_performed, total_calls),
        }
    }

    /// Zero all counters.
    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::SeqCst);
        self.calls_retried.store(0, Ordering::SeqCst);
        self.retries_performed.store(0, Ordering::SeqCst);
        self.successes_after_retry.store(0, Ordering::SeqCst);
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Read-only view of the counters plus derived rates.
///
/// Rates are guarded against division by zero: with no calls recorded every
/// rate is `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Wrapped-call invocations started, one per call (not per attempt).
    pub total_calls: u64,
    /// Calls that needed at least one retry.
    pub calls_retried: u64,
    /// Individual retries taken across all calls.
    pub retries_performed: u64,
    /// Calls that ultimately succeeded but required at least one retry.
    pub successes_after_retry: u64,
    /// `retries_performed / total_calls`.
    pub retry_rate: f64,
    /// `successes_after_retry / retries_performed`.
    pub success_after_retry_rate: f64,
    /// `retries_performed / total_calls`.
    pub avg_retries: f64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calls: {}, retried: {}, retries: {}, recovered: {}, retry rate: {:.2}, recovery rate: {:.2}, avg retries/call: {:.2}",
            self.total_calls,
            self.calls_retried,
            self.retries_performed,
            self.successes_after_retry,
            self.retry_rate,
            self.success_after_retry_rate,
            self.avg_retries,
        )
    }
}

/// Snapshot of the shared process-wide metrics instance.
pub fn snapshot() -> MetricsSnapshot {
    GLOBAL.snapshot()
}

/// Reset the shared process-wide metrics instance to all zeros.
///
/// Safe to call at any time, including before any call has been made.
pub fn reset() {
    GLOBAL.reset()
}
