use std::time::Duration;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_MIN_BACKOFF_MS: u64 = 5_000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

const BACKOFF_MULTIPLIER: u64 = 2;

/// Whether a remote failure is worth another attempt.
///
/// Throttling and transient network errors are `Retryable`; not-found,
/// access-denied, and malformed-request failures are `Terminal` and must
/// surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    message: String,
    class: ErrorClass,
}

impl RemoteError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: ErrorClass::Retryable,
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: ErrorClass::Terminal,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn class(&self) -> ErrorClass {
        self.class
    }

    pub fn is_terminal(&self) -> bool {
        self.class == ErrorClass::Terminal
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

/// Bounded-retry schedule for one remote operation: exponential backoff with
/// a fixed multiplier of 2, capped at `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPlan {
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            min_backoff: Duration::from_millis(DEFAULT_MIN_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPlan {
    /// Delay to wait after the given failed attempt (1-based) before the next
    /// one: `min_backoff * 2^(attempt - 1)`, capped at `max_backoff`.
    pub fn delay_before(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1);
        let min_ms = self.min_backoff.as_millis() as u64;
        let max_ms = self.max_backoff.as_millis() as u64;
        let delay_ms = BACKOFF_MULTIPLIER
            .checked_pow(exponent)
            .and_then(|factor| min_ms.checked_mul(factor))
            .unwrap_or(max_ms);
        Duration::from_millis(delay_ms.min(max_ms))
    }
}
