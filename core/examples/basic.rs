//! Basic circuit breaker usage example
//!
//! Run with `RUST_LOG=backoff_breaker=debug` to see the breaker's own logs.

use backoff_breaker::{BreakerError, CircuitBreaker, Context, Operation, operation_fn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Circuit Breaker Basic Example ===\n");

    let healthy = Arc::new(AtomicBool::new(true));
    let upstream = healthy.clone();

    let payment_api = operation_fn(move |ctx: Context| {
        let healthy = upstream.load(Ordering::SeqCst);
        async move {
            ctx.run(tokio::time::sleep(Duration::from_millis(20)))
                .await
                .map_err(|e| e.to_string())?;
            if healthy {
                Ok("payment accepted")
            } else {
                Err("payment gateway timeout".to_string())
            }
        }
    });

    let circuit = CircuitBreaker::builder("payment_api")
        .failure_threshold(2)
        .base_backoff(Duration::from_millis(250))
        .max_backoff(Duration::from_secs(2))
        .on_open(|name| println!("🔴 Circuit '{}' opened!", name))
        .on_half_open(|name| println!("🟡 Circuit '{}' half-open, testing...", name))
        .on_close(|name| println!("🟢 Circuit '{}' closed!", name))
        .build(payment_api)
        .expect("valid configuration");

    let ctx = Context::background();
    println!("Initial state: {}\n", circuit.state());

    println!("--- Successful calls ---");
    for _ in 0..2 {
        report(circuit.invoke(&ctx).await);
    }

    println!("\n--- Upstream goes down ---");
    healthy.store(false, Ordering::SeqCst);
    for _ in 0..5 {
        report(circuit.invoke(&ctx).await);
    }
    println!("State: {}\n", circuit.state());

    println!("--- Upstream recovers, waiting for the backoff window ---");
    healthy.store(true, Ordering::SeqCst);
    if let Some(wait) = circuit.retry_after() {
        tokio::time::sleep(wait).await;
    }
    report(circuit.invoke(&ctx).await);
    println!("State: {}", circuit.state());
}

fn report(result: Result<&str, BreakerError<String>>) {
    match result {
        Ok(value) => println!("✓ {}", value),
        Err(BreakerError::Open { retry_after, .. }) => {
            println!("✗ rejected, retry in {:?}", retry_after)
        }
        Err(BreakerError::Operation(e)) => println!("✗ {}", e),
    }
}
