//! Bounded-retry execution for single remote calls.
//!
//! Retryable failures are retried on the plan's exponential backoff schedule
//! and logged as warnings; terminal failures surface after exactly one
//! attempt. Exhausting the plan surfaces the last error.

use std::future::Future;
use std::time::Duration;

use janitor_core::retry::{RemoteError, RetryPlan};
use serde_json::json;

use crate::logging::log_warn;

/// Seam for the backoff wait so tests can record delays instead of sleeping.
#[allow(async_fn_in_trait)]
pub trait Sleep {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleep;

impl Sleep for TokioSleep {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

pub async fn execute_with_retry<T, F, Fut>(
    plan: &RetryPlan,
    label: &str,
    operation: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    execute_with_retry_using(plan, label, &TokioSleep, operation).await
}

pub async fn execute_with_retry_using<T, F, Fut, S>(
    plan: &RetryPlan,
    label: &str,
    sleeper: &S,
    mut operation: F,
) -> Result<T, RemoteError>
where
    S: Sleep,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_terminal() => return Err(error),
            Err(error) if attempt >= plan.max_attempts => return Err(error),
            Err(error) => {
                let delay = plan.delay_before(attempt);
                log_warn(
                    "retry",
                    "attempt_failed",
                    json!({
                        "operation": label,
                        "attempt": attempt,
                        "max_attempts": plan.max_attempts,
                        "next_delay_ms": delay.as_millis() as u64,
                        "error": error.message(),
                    }),
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
