//! Bounded retry with exponential backoff
//!
//! Wraps a single fallible async operation. The delay before retry `k`
//! (1-based) is `base_delay * 2^(k-1)`, capped at `max_delay`. The last error
//! is returned unchanged once the attempt budget is spent.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry budget and backoff shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// Single attempt, no retries
    #[inline]
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// With delay cap
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay_ms = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

/// Passed to the retry hook before each backoff sleep
#[derive(Debug)]
pub struct RetryNotice<'a, E> {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Attempt budget
    pub max_attempts: u32,
    /// Sleep before the next attempt
    pub delay: Duration,
    /// Error from the failed attempt
    pub error: &'a E,
}

/// Result of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final value or the last error
    pub result: Result<T, E>,
    /// Attempts made (at least 1)
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails permanently, or the budget is spent
///
/// - `operation` receives the 1-based attempt number
/// - `is_retryable` decides whether an error earns another attempt
/// - `on_retry` fires before every backoff sleep, never after the last attempt
pub async fn retry_with_backoff<T, E, F, Fut, P, H>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
    mut on_retry: H,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    H: FnMut(&RetryNotice<'_, E>),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(error) => {
                if attempt >= max_attempts || !is_retryable(&error) {
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                    };
                }

                let delay = policy.delay_for(attempt);
                on_retry(&RetryNotice {
                    attempt,
                    max_attempts,
                    delay,
                    error: &error,
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let policy =
            RetryPolicy::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(3));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(200), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let mut delays = Vec::new();

        let outcome = retry_with_backoff(
            &RetryPolicy::new(3, Duration::from_millis(50)),
            move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("flaky")
                } else {
                    Ok("done")
                }
            },
            |_| true,
            |notice| delays.push(notice.delay),
        )
        .await;

        assert_eq!(outcome.result, Ok("done"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(
            delays,
            vec![Duration::from_millis(50), Duration::from_millis(100)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let mut hooks = 0;

        let outcome: RetryOutcome<(), String> = retry_with_backoff(
            &RetryPolicy::new(3, Duration::from_millis(10)),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {attempt}")) }
            },
            |_| true,
            |_| hooks += 1,
        )
        .await;

        assert_eq!(outcome.result, Err("failure 3".to_string()));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(hooks, 2);
    }

    #[tokio::test]
    async fn permanent_errors_stop_immediately() {
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), &str> = retry_with_backoff(
            &RetryPolicy::new(5, Duration::from_millis(10)),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad input") }
            },
            |_| false,
            |_| panic!("no retry expected"),
        )
        .await;

        assert_eq!(outcome.result, Err("bad input"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let outcome: RetryOutcome<u8, ()> =
            retry_with_backoff(&policy, |_| async { Ok(7) }, |_| true, |_| {}).await;
        assert_eq!(outcome.result, Ok(7));
        assert_eq!(outcome.attempts, 1);
    }
}
