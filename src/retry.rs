//! Timeout and bounded retry for calls to external providers.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

use crate::config::CallLimits;

/// Upper bound on the delay between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2).min(MAX_BACKOFF)
}

/// Run `call` under the per-call timeout, retrying failures up to
/// `limits.max_retries` times with doubling backoff capped at `MAX_BACKOFF`.
/// A timeout counts as a failure of that attempt.
pub async fn call_with_retry<T, F, Fut>(limits: &CallLimits, label: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let timeout = Duration::from_secs(limits.call_timeout_secs);
    let first_backoff = Duration::from_millis(limits.retry_backoff_ms);
    let mut backoff = first_backoff.min(MAX_BACKOFF);
    let mut attempt = 0u32;

    loop {
        let outcome = match tokio::time::timeout(timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "{label} timed out after {}s",
                limits.call_timeout_secs
            )),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if attempt < limits.max_retries => {
                attempt += 1;
                tracing::debug!(
                    "{label} failed (attempt {attempt}): {e:#}; retrying in {backoff:?}"
                );
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}
