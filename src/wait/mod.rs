//! Bounded, cancellable waiting primitives
//!
//! Every DOM wait in the crate goes through [`wait_for`]: it resolves to
//! `None` on timeout or cancellation instead of blocking the pipeline.

use anyhow::Result;
use std::future::Future;
use std::time::{Duration, Instant};

/// Poll `probe` until it yields `Some`, `timeout` elapses, or `cancelled` fires
///
/// The probe always runs at least once, even with a zero timeout.
pub async fn wait_for<T, P, Fut, C>(
    timeout: Duration,
    poll_interval: Duration,
    cancelled: C,
    mut probe: P,
) -> Option<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
    C: Fn() -> bool,
{
    let start = Instant::now();
    loop {
        if cancelled() {
            return None;
        }
        if let Some(value) = probe().await {
            return Some(value);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return None;
        }
        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// `wait_for` without a cancellation source
pub async fn wait_until<T, P, Fut>(timeout: Duration, poll_interval: Duration, probe: P) -> Option<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    wait_for(timeout, poll_interval, || false, probe).await
}

/// Wrap an async browser operation with an explicit timeout
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the timeout was reached
pub async fn with_op_timeout<F, T>(operation: F, timeout_secs: u64, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}
