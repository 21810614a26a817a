//! Fixed-budget retry.

use crate::error::Classify;
use crate::pipeline::ExecutionStrategy;
use crate::policy::RetryPolicy;
use std::future::Future;
use tracing::debug;

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
///
/// `operation` receives the 1-based attempt number. `on_failed_attempt` runs
/// after every failed attempt, whether or not another one follows. Without a
/// policy the operation runs exactly once and the callback never fires. The
/// last error is returned unchanged.
pub async fn execute_with_retry<T, E, F, Fut, R>(
    policy: Option<&RetryPolicy>,
    strategy: ExecutionStrategy,
    mut on_failed_attempt: R,
    mut operation: F,
) -> Result<T, E>
where
    E: Classify,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E),
{
    let Some(policy) = policy else {
        return operation(1).await;
    };

    let budget = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                on_failed_attempt(attempt, &error);
                if attempt >= budget || !policy.is_retryable(error.kind()) {
                    return Err(error);
                }
                strategy.pause(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    enum FlakyError {
        #[error("timed out on attempt {0}")]
        Timeout(u32),
        #[error("not found")]
        NotFound,
    }

    impl Classify for FlakyError {
        fn kind(&self) -> &str {
            match self {
                FlakyError::Timeout(_) => "timeout",
                FlakyError::NotFound => "not_found",
            }
        }
    }

    #[tokio::test]
    async fn test_exhausts_budget_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let mut retried = Vec::new();

        let result: Result<(), _> = execute_with_retry(
            Some(&RetryPolicy::new(3)),
            ExecutionStrategy::Suspending,
            |attempt, error: &FlakyError| retried.push((attempt, error.to_string())),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(FlakyError::Timeout(attempt)) }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(FlakyError::Timeout(3))));
        assert_eq!(retried.len(), 3);
        assert_eq!(retried[0], (1, "timed out on attempt 1".to_string()));
        assert_eq!(retried[2].0, 3);
    }

    #[tokio::test]
    async fn test_stops_on_first_success() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(
            Some(&RetryPolicy::new(5)),
            ExecutionStrategy::Suspending,
            |_, _: &FlakyError| {},
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(FlakyError::Timeout(attempt))
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_matching_kind_is_not_retried() {
        let calls = AtomicU32::new(0);
        let mut failures = 0;
        let result: Result<(), _> = execute_with_retry(
            Some(&RetryPolicy::new(3).retry_on("timeout")),
            ExecutionStrategy::Suspending,
            |_, _: &FlakyError| failures += 1,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FlakyError::NotFound) }
            },
        )
        .await;

        assert!(matches!(result, Err(FlakyError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_blocking_strategy_sleeps_between_attempts() {
        let started = std::time::Instant::now();
        let result: Result<(), _> = futures::executor::block_on(execute_with_retry(
            Some(&RetryPolicy::new(3).with_delay(Duration::from_millis(10))),
            ExecutionStrategy::Blocking,
            |_, _: &FlakyError| {},
            |attempt| async move { Err(FlakyError::Timeout(attempt)) },
        ));

        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_without_policy_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = execute_with_retry(
            None,
            ExecutionStrategy::Suspending,
            |_, _: &FlakyError| {},
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FlakyError::Timeout(1)) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
