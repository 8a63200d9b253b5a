//! Example: driving a flaky operation through a retry policy.
//!
//! Simulates an endpoint that fails with connection errors before recovering,
//! shows a logic error surfacing immediately, and prints the aggregate
//! metrics as JSON at the end.
//!
//! Run with:
//! ```bash
//! cargo run --example retry_demo
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use retrykit::prelude::*;

/// A simulated endpoint that fails its first few calls.
struct FlakyEndpoint {
    calls: AtomicU32,
    fail_first: u32,
}

impl FlakyEndpoint {
    fn new(fail_first: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first,
        }
    }

    async fn fetch(&self) -> Result<String, TaggedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            Err(TaggedError::connection(format!(
                "socket reset on call {}",
                call + 1
            )))
        } else {
            Ok("payload".to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let policy = RetryPolicy::builder()
        .max_attempts(4)
        .initial_delay(Duration::from_millis(100))
        .multiplier(2.0)
        .retry_transient()
        .build();

    println!("--- transient failures recover ---");
    let endpoint = FlakyEndpoint::new(2);
    let value = policy.execute(|| endpoint.fetch()).await?;
    println!(
        "recovered {:?} after {} calls",
        value,
        endpoint.calls.load(Ordering::SeqCst)
    );

    println!("--- logic errors surface immediately ---");
    let fatal = policy
        .execute(|| async { Err::<(), _>(TaggedError::logic("checksum mismatch")) })
        .await;
    println!("got: {}", fatal.unwrap_err());

    println!("--- aggregate metrics ---");
    println!(
        "{}",
        serde_json::to_string_pretty(&retrykit::metrics::snapshot())?
    );
    Ok(())
}
