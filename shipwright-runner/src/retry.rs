//! Retry policy
//!
//! One policy type shared by every stage. A policy is a maximum number of
//! attempts plus a delay schedule; the retryable-error predicate is supplied
//! per call, because what counts as transient differs between a completion
//! API, a source-control API and a callback endpoint.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `step`, `2 * step`, `3 * step`, ...
    Linear(Duration),
    /// `base`, `2 * base`, `4 * base`, ...
    Exponential(Duration),
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Exponential(base) => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        }
    }
}

/// Bounded retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// The last error of an operation that never succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub error: E,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Completion calls: 3 attempts, 2s then 4s
    pub const fn generation() -> Self {
        Self::new(3, Backoff::Linear(Duration::from_secs(2)))
    }

    /// Source-control calls: 5 attempts, 1s, 2s, 4s, 8s
    pub const fn source_control() -> Self {
        Self::new(5, Backoff::Exponential(Duration::from_secs(1)))
    }

    /// Callback delivery: 5 attempts, 1s, 2s, 4s, 8s
    pub const fn notification() -> Self {
        Self::new(5, Backoff::Exponential(Duration::from_secs(1)))
    }

    /// Retries without waiting
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::Fixed(Duration::ZERO))
    }

    /// Every delay this policy can wait, in order
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.backoff.delay_after(attempt))
            .collect()
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out
    ///
    /// `op` receives the 1-based attempt number. On success the value is
    /// returned together with the number of attempts used.
    pub async fn run<T, E, Op, Fut, P>(
        &self,
        label: &str,
        mut op: Op,
        is_retryable: P,
    ) -> Result<(T, u32), RetryFailure<E>>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(error) => {
                    if attempt >= max_attempts || !is_retryable(&error) {
                        return Err(RetryFailure {
                            attempts: attempt,
                            error,
                        });
                    }

                    let delay = self.backoff.delay_after(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        "{} failed: {}; retrying in {:?}",
                        label,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_schedules() {
        assert_eq!(
            RetryPolicy::notification().delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
        assert_eq!(
            RetryPolicy::generation().delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(
            Backoff::Fixed(Duration::from_millis(300)).delay_after(7),
            Duration::from_millis(300)
        );
        assert!(RetryPolicy::immediate(1).delays().is_empty());
    }

    #[test]
    fn test_exponential_saturates() {
        let backoff = Backoff::Exponential(Duration::from_secs(1));
        assert_eq!(backoff.delay_after(64), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let started = Instant::now();
        let seen = Mutex::new(Vec::new());

        let result = RetryPolicy::notification()
            .run(
                "flaky",
                |attempt| {
                    seen.lock().unwrap().push(attempt);
                    async move {
                        if attempt < 3 {
                            Err(format!("failure {}", attempt))
                        } else {
                            Ok("done")
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(("done", 3)));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_non_retryable_error() {
        let result: Result<((), u32), _> = RetryPolicy::source_control()
            .run("fatal", |_| async { Err("401 unauthorized") }, |e| !e.starts_with("401"))
            .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.error, "401 unauthorized");
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let result: Result<((), u32), _> = RetryPolicy::immediate(4)
            .run("always", |attempt| async move { Err(attempt) }, |_| true)
            .await;

        assert_eq!(
            result.unwrap_err(),
            RetryFailure {
                attempts: 4,
                error: 4
            }
        );
    }
}
