//! End-to-end retry behavior: attempt budgets, classification, backoff
//! timing, and metrics accounting.
//!
//! Every test here injects its own metrics sink so tests stay isolated from
//! each other and from the process-wide instance.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use retrykit::prelude::*;

fn policy_with(metrics: &Arc<RetryMetrics>) -> RetryPolicyBuilder {
    RetryPolicy::builder()
        .initial_delay(Duration::from_millis(5))
        .metrics(Arc::clone(metrics))
}

#[tokio::test]
async fn first_attempt_success_is_passthrough() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics).max_attempts(3).build();

    let calls = Arc::new(AtomicU32::new(0));
    let result = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaggedError>("success")
            }
        })
        .await
        .unwrap();

    assert_eq!(result, "success");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let snap = metrics.snapshot();
    assert_eq!(snap.total_calls, 1);
    assert_eq!(snap.retries_performed, 0);
    assert_eq!(snap.successes_after_retry, 0);
}

#[tokio::test]
async fn recovers_after_transient_failures() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics)
        .max_attempts(3)
        .retry_on([ErrorKind::Connection])
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let result = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TaggedError::connection("socket reset"))
                } else {
                    Ok("ok")
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let snap = metrics.snapshot();
    assert_eq!(snap.total_calls, 1);
    assert_eq!(snap.calls_retried, 1);
    assert_eq!(snap.retries_performed, 2);
    assert_eq!(snap.successes_after_retry, 1);
}

#[tokio::test]
async fn exhaustion_surfaces_the_original_error() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics).max_attempts(3).build();

    let calls = Arc::new(AtomicU32::new(0));
    let err = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TaggedError::new(ErrorKind::Other, "persistent failure"))
            }
        })
        .await
        .unwrap_err();

    // Tried exactly max_attempts times, then gave up with the error as-is.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(err.to_string(), "other error: persistent failure");

    let snap = metrics.snapshot();
    assert_eq!(snap.retries_performed, 2);
    assert_eq!(snap.successes_after_retry, 0);
}

#[tokio::test]
async fn non_retryable_error_fails_fast() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = RetryPolicy::builder()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(300))
        .retry_on([ErrorKind::Connection])
        .metrics(Arc::clone(&metrics))
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();
    let err = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TaggedError::logic("value should be 20"))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Logic);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(
        start.elapsed() < Duration::from_millis(150),
        "fatal errors must not back off, took {:?}",
        start.elapsed()
    );
    assert_eq!(metrics.snapshot().retries_performed, 0);
}

#[tokio::test]
async fn backoff_delays_grow_exponentially() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = RetryPolicy::builder()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(100))
        .multiplier(2.0)
        .retry_on([ErrorKind::Validation])
        .metrics(Arc::clone(&metrics))
        .build();

    let attempt_times = Arc::new(Mutex::new(Vec::new()));
    let result = policy
        .execute(|| {
            let attempt_times = Arc::clone(&attempt_times);
            async move {
                let mut times = attempt_times.lock().unwrap();
                times.push(Instant::now());
                if times.len() < 3 {
                    Err(TaggedError::validation("not yet"))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();
    assert_eq!(result, "done");

    let times = attempt_times.lock().unwrap();
    assert_eq!(times.len(), 3);

    // ~100ms then ~200ms, with slack for scheduler jitter.
    let gap_1 = times[1] - times[0];
    let gap_2 = times[2] - times[1];
    assert!(
        gap_1 >= Duration::from_millis(80) && gap_1 <= Duration::from_millis(250),
        "first backoff out of band: {gap_1:?}"
    );
    assert!(
        gap_2 >= Duration::from_millis(160) && gap_2 <= Duration::from_millis(400),
        "second backoff out of band: {gap_2:?}"
    );
}

#[tokio::test]
async fn arguments_are_forwarded_unchanged_on_every_attempt() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics)
        .max_attempts(3)
        .retry_on([ErrorKind::Timeout])
        .build();

    let user_id = 42u32;
    let format = "xml";

    let seen = Arc::new(Mutex::new(Vec::new()));
    let result = policy
        .execute(|| {
            let seen = Arc::clone(&seen);
            async move {
                let mut seen = seen.lock().unwrap();
                seen.push((user_id, format.to_string()));
                if seen.len() < 3 {
                    Err(TaggedError::timeout("no response"))
                } else {
                    Ok(format!("user_{user_id}.{format}"))
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, "user_42.xml");
    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![
        (42, "xml".to_string()),
        (42, "xml".to_string()),
        (42, "xml".to_string()),
    ]);
}

#[tokio::test]
async fn each_retryable_kind_in_the_set_retries() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics)
        .max_attempts(4)
        .retry_on([ErrorKind::Connection, ErrorKind::Timeout, ErrorKind::Validation])
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let result = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(TaggedError::connection("network error")),
                    1 => Err(TaggedError::timeout("timeout")),
                    2 => Err(TaggedError::validation("validation error")),
                    _ => Ok("finally succeeded"),
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, "finally succeeded");
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let snap = metrics.snapshot();
    assert_eq!(snap.retries_performed, 3);
    assert_eq!(snap.calls_retried, 1);
    assert_eq!(snap.successes_after_retry, 1);
}

#[tokio::test]
async fn single_attempt_budget_never_sleeps() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = RetryPolicy::builder()
        .max_attempts(1)
        .initial_delay(Duration::from_millis(300))
        .metrics(Arc::clone(&metrics))
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();
    let err = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TaggedError::connection("refused"))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(metrics.snapshot().retries_performed, 0);
}

#[tokio::test]
async fn io_errors_retry_by_their_classification() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics)
        .max_attempts(5)
        .retry_transient()
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let err = policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    // Transient: retried.
                    Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
                } else {
                    // Io is outside the transient set: fatal.
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
            }
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(metrics.snapshot().retries_performed, 1);
}

#[test]
fn blocking_execution_shares_the_state_machine() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = RetryPolicy::builder()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(5))
        .retry_on([ErrorKind::Timeout])
        .metrics(Arc::clone(&metrics))
        .build();

    let mut calls = 0u32;
    let result = policy
        .execute_blocking(|| {
            calls += 1;
            if calls < 3 {
                Err(TaggedError::timeout("still waiting"))
            } else {
                Ok(7)
            }
        })
        .unwrap();

    assert_eq!(result, 7);
    assert_eq!(calls, 3);

    let snap = metrics.snapshot();
    assert_eq!(snap.total_calls, 1);
    assert_eq!(snap.retries_performed, 2);
    assert_eq!(snap.successes_after_retry, 1);
}

#[tokio::test]
async fn derived_rates_reflect_the_counters() {
    let metrics = Arc::new(RetryMetrics::new());
    let policy = policy_with(&metrics).max_attempts(3).build();

    // One call that needs a single retry.
    let calls = Arc::new(AtomicU32::new(0));
    policy
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TaggedError::timeout("blip"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

    // One clean call.
    policy
        .execute(|| async { Ok::<_, TaggedError>(()) })
        .await
        .unwrap();

    let snap = metrics.snapshot();
    assert_eq!(snap.total_calls, 2);
    assert_eq!(snap.retries_performed, 1);
    assert_eq!(snap.retry_rate, 0.5);
    assert_eq!(snap.success_after_retry_rate, 1.0);
    assert_eq!(snap.avg_retries, 0.5);
}
