//! Retry policy for dispatched calls

use crate::config::RetryConfig;
use crate::error::SchedulerError;
use crate::metrics::SchedulerMetrics;
use std::future::Future;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use verity_domain::traits::ProviderError;

/// Run `call` until it succeeds or the policy gives up
///
/// Each attempt is bounded by `call_timeout`. Rate-limited failures wait for
/// the provider's hint when it gives one; everything else (other errors,
/// timeouts) follows the exponential schedule.
pub(crate) async fn run_with_retry<F, Fut, T, E>(
    policy: &RetryConfig,
    metrics: &SchedulerMetrics,
    mut call: F,
) -> Result<T, SchedulerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ProviderError,
{
    let mut attempt: u32 = 0;

    loop {
        let (message, hint) = match timeout(policy.call_timeout(), call()).await {
            Ok(Ok(value)) => {
                metrics.record_completed();
                if attempt > 0 {
                    debug!("Call succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Ok(Err(e)) if e.is_rate_limited() => (format!("rate limited: {}", e), e.retry_after()),
            Ok(Err(e)) => (e.to_string(), None),
            Err(_) => (format!("timed out after {:?}", policy.call_timeout()), None),
        };

        if attempt >= policy.max_retries {
            metrics.record_failed();
            warn!("Call failed after {} attempts: {}", attempt + 1, message);
            return Err(SchedulerError::RetriesExhausted {
                attempts: attempt + 1,
                last_error: message,
            });
        }

        let delay = policy.delay_for(attempt, hint);
        metrics.record_retry();
        warn!(
            "Attempt {}/{} failed ({}), retrying in {:?}",
            attempt + 1,
            policy.max_retries + 1,
            message,
            delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use verity_llm::LlmError;

    fn policy() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
            call_timeout_ms: 1_000,
        }
    }

    type BoxedCall = Pin<Box<dyn Future<Output = Result<&'static str, LlmError>> + Send>>;

    /// A call failing with `error` for the first `failures` attempts
    fn flaky(failures: u32, error: LlmError) -> (Arc<AtomicU32>, impl FnMut() -> BoxedCall) {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let call = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let error = error.clone();
            Box::pin(async move {
                if n < failures {
                    Err(error)
                } else {
                    Ok("done")
                }
            }) as BoxedCall
        };
        (attempts, call)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limit_with_hint() {
        let metrics = SchedulerMetrics::new();
        let (attempts, call) = flaky(
            2,
            LlmError::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            },
        );

        let start = Instant::now();
        let result = run_with_retry(&policy(), &metrics, call).await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two hinted waits of 2s each
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert_eq!(metrics.snapshot().retries, 2);
        assert_eq!(metrics.snapshot().completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_without_hint() {
        let metrics = SchedulerMetrics::new();
        let (_, call) = flaky(3, LlmError::Communication("reset".to_string()));

        let start = Instant::now();
        run_with_retry(&policy(), &metrics, call).await.unwrap();

        // 100 + 200 + 400 ms
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(700));
        assert!(elapsed < Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let metrics = SchedulerMetrics::new();
        let (attempts, call) = flaky(u32::MAX, LlmError::RateLimited { retry_after: None });

        let err = run_with_retry(&policy(), &metrics, call).await.unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        match err {
            SchedulerError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("rate limited"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(metrics.snapshot().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_retried() {
        let metrics = SchedulerMetrics::new();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let call = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    sleep(Duration::from_secs(30)).await;
                }
                Ok::<_, LlmError>(n)
            }
        };

        let result = run_with_retry(&policy(), &metrics, call).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(metrics.snapshot().retries, 1);
    }
}
