//! Example: retrying a flaky operation with jittered exponential backoff
//!
//! This example demonstrates:
//! 1. Retrying transient faults until success
//! 2. Passing non-retryable faults straight through
//! 3. Exhausting the attempt budget
//! 4. The async driver on a tokio runtime
//!
//! Run with:
//! ```bash
//! RUST_LOG=rebound=debug cargo run -p rebound --example retry_example
//! ```

use rebound::prelude::*;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

/// A simulated service that fails the first few calls
struct FlakyService {
    fail_count: u32,
}

impl FlakyService {
    fn call(&self, attempt: u32) -> Result<String, io::Error> {
        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED (simulating transient error)");
            Err(io::Error::new(io::ErrorKind::TimedOut, "upstream timed out"))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("payload".to_string())
        }
    }
}

fn driver(max_attempts: u32) -> Result<RetryDriver<io::Error>, rebound::Error> {
    let backoff = BackoffSequence::builder()
        .min_delay(Duration::from_millis(50))
        .max_delay(Duration::from_millis(400))
        .jitter(0.2)
        .build()?;

    RetryDriver::builder()
        .max_attempts(max_attempts)
        .backoff(backoff)
        .matcher(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
        .on_fault(|fault: &io::Error, attempt| println!("    observed fault #{attempt}: {fault}"))
        .build()
}

/// Example 1: transient faults followed by success
fn example_recovery() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Recovery after transient faults ===\n");

    let service = FlakyService { fail_count: 2 };
    let start = Instant::now();
    let result = driver(5)?.run(|attempt| service.call(attempt))?;

    println!("\nResult: {result}");
    println!("Total time: {:?} (expected ~150ms of backoff)", start.elapsed());
    Ok(())
}

/// Example 2: a fault the matchers reject is returned untouched
fn example_non_retryable() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Non-retryable fault ===\n");

    let result = driver(5)?.run(|_| -> Result<(), io::Error> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "bad credentials"))
    });

    match result {
        Err(RetryError::NonRetryable(fault)) => println!("Passed through: {fault} ({:?})", fault.kind()),
        other => println!("Unexpected: {other:?}"),
    }
    Ok(())
}

/// Example 3: every attempt fails
fn example_exhaustion() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Exhaustion ===\n");

    let service = FlakyService { fail_count: u32::MAX };
    match driver(3)?.run(|attempt| service.call(attempt)) {
        Err(err @ RetryError::Exhausted { .. }) => {
            println!("{err}");
            if let Some(cause) = err.cause() {
                println!("  caused by: {cause}");
            }
        }
        other => println!("Unexpected: {other:?}"),
    }
    Ok(())
}

/// Example 4: the same driver on an async runtime
async fn example_async() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Async driver ===\n");

    let service = FlakyService { fail_count: 1 };
    let result = driver(3)?
        .run_async(|attempt| {
            let outcome = service.call(attempt);
            async move { outcome }
        })
        .await?;

    println!("\nResult: {result}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tokio::task::block_in_place(|| -> Result<(), Box<dyn Error>> {
        example_recovery()?;
        example_non_retryable()?;
        example_exhaustion()
    })?;
    example_async().await?;

    println!("\n=== All examples completed ===");
    Ok(())
}
