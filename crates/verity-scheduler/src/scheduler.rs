//! The scheduling loop and its handle

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::metrics::{MetricsSnapshot, SchedulerMetrics};
use crate::retry::run_with_retry;
use crate::window::RollingWindow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use verity_domain::traits::ProviderError;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A submitted call waiting for budget
///
/// `run` performs the call with retries and reports to the caller when done.
struct ScheduledTask {
    estimated_cost: u64,
    run: Job,
}

/// Handle to a rate-limited scheduling loop
///
/// Calls are released only while the rolling request and token budgets allow
/// it. Cloned handles share one loop; when every handle is dropped the loop
/// finishes the work already queued and exits.
///
/// # Examples
///
/// ```
/// use verity_scheduler::{estimate_tokens, Scheduler, SchedulerConfig};
/// use verity_llm::MockProvider;
/// use verity_domain::traits::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
/// let llm = MockProvider::new("{\"verdict\": \"Support\"}");
///
/// let prompt = "verify: water is wet";
/// let reply = scheduler
///     .submit(estimate_tokens(prompt), move || {
///         let llm = llm.clone();
///         async move { llm.generate(prompt).await }
///     })
///     .await
///     .unwrap();
/// assert!(reply.contains("Support"));
/// # }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    sender: mpsc::UnboundedSender<ScheduledTask>,
    config: Arc<SchedulerConfig>,
    metrics: Arc<SchedulerMetrics>,
}

impl Scheduler {
    /// Start a scheduling loop
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Config` if the configuration is invalid.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::Config)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let config = Arc::new(config);
        let metrics = Arc::new(SchedulerMetrics::new());

        tokio::spawn(run_loop(receiver, Arc::clone(&config), Arc::clone(&metrics)));

        Ok(Self {
            sender,
            config,
            metrics,
        })
    }

    /// Queue a call and wait for its result
    ///
    /// `call` is invoked once per attempt. The estimate is charged against
    /// the token budget when the call is dispatched.
    ///
    /// # Errors
    ///
    /// - `CostExceedsBudget` if the estimate is larger than the whole token budget
    /// - `RetriesExhausted` if every attempt failed or timed out
    /// - `Shutdown` if the loop is gone
    pub async fn submit<F, Fut, T, E>(&self, estimated_cost: u64, call: F) -> Result<T, SchedulerError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: ProviderError,
    {
        if estimated_cost > self.config.tokens_per_minute {
            self.metrics.record_rejected();
            warn!(
                "Rejecting call with estimated cost {} (budget {} per window)",
                estimated_cost, self.config.tokens_per_minute
            );
            return Err(SchedulerError::CostExceedsBudget {
                cost: estimated_cost,
                budget: self.config.tokens_per_minute,
            });
        }

        let (done_tx, done_rx) = oneshot::channel();
        let retry = self.config.retry.clone();
        let metrics = Arc::clone(&self.metrics);

        let run: Job = Box::pin(async move {
            let outcome = run_with_retry(&retry, &metrics, call).await;
            // The caller may have stopped waiting
            let _ = done_tx.send(outcome);
        });

        self.sender
            .send(ScheduledTask { estimated_cost, run })
            .map_err(|_| SchedulerError::Shutdown)?;
        self.metrics.record_submitted();

        done_rx.await.map_err(|_| SchedulerError::Shutdown)?
    }

    /// Get a snapshot of the scheduler's metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Get the scheduler configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

async fn run_loop(
    mut receiver: mpsc::UnboundedReceiver<ScheduledTask>,
    config: Arc<SchedulerConfig>,
    metrics: Arc<SchedulerMetrics>,
) {
    let mut window = RollingWindow::new(config.window());
    let mut pending: Vec<ScheduledTask> = Vec::new();
    let mut open = true;

    info!(
        "Scheduler started ({} requests, {} tokens per {:?})",
        config.requests_per_minute,
        config.tokens_per_minute,
        config.window()
    );

    loop {
        if pending.is_empty() {
            if !open {
                break;
            }
            match receiver.recv().await {
                Some(task) => pending.push(task),
                None => break,
            }
        }

        loop {
            match receiver.try_recv() {
                Ok(task) => pending.push(task),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    open = false;
                    break;
                }
            }
        }

        let now = Instant::now();
        window.prune(now);
        let remaining_requests = u64::from(config.requests_per_minute).saturating_sub(window.requests());
        let remaining_tokens = config.tokens_per_minute.saturating_sub(window.tokens());

        if remaining_requests == 0 || remaining_tokens == 0 {
            metrics.record_cooldown();
            debug!(
                "Budget exhausted ({} requests, {} tokens in window), {} pending",
                window.requests(),
                window.tokens(),
                pending.len()
            );
            sleep(config.cooldown()).await;
            continue;
        }

        let dispatched = dispatch_fitting(
            &mut pending,
            &mut window,
            now,
            remaining_requests,
            remaining_tokens,
            &metrics,
        );

        if dispatched == 0 {
            sleep(config.idle_poll()).await;
        } else {
            debug!("Dispatched {} calls, {} still pending", dispatched, pending.len());
        }
    }

    info!("Scheduler stopped. Final metrics:\n{}", metrics.snapshot().summary());
}

/// Release the cheapest pending tasks that fit both budgets
fn dispatch_fitting(
    pending: &mut Vec<ScheduledTask>,
    window: &mut RollingWindow,
    now: Instant,
    mut requests: u64,
    mut tokens: u64,
    metrics: &SchedulerMetrics,
) -> usize {
    // Stable sort: equal costs keep submission order
    pending.sort_by_key(|task| task.estimated_cost);

    let mut dispatched = 0;
    let mut kept = Vec::with_capacity(pending.len());

    for task in pending.drain(..) {
        if requests > 0 && task.estimated_cost <= tokens {
            requests -= 1;
            tokens -= task.estimated_cost;
            window.record(now, task.estimated_cost);
            metrics.record_dispatched();
            tokio::spawn(task.run);
            dispatched += 1;
        } else {
            kept.push(task);
        }
    }

    *pending = kept;
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use std::sync::Mutex;
    use std::time::Duration;
    use verity_domain::traits::LlmProvider;
    use verity_llm::{LlmError, MockProvider};

    fn config(requests: u32, tokens: u64) -> SchedulerConfig {
        SchedulerConfig {
            requests_per_minute: requests,
            tokens_per_minute: tokens,
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 100,
                max_backoff_ms: 5_000,
                call_timeout_ms: 10_000,
            },
            ..SchedulerConfig::default()
        }
    }

    /// Submit `costs` concurrently, recording (start time, cost) of each call
    async fn run_all(scheduler: &Scheduler, costs: &[u64]) -> Vec<(Instant, u64)> {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();

        for &cost in costs {
            let scheduler = scheduler.clone();
            let starts = Arc::clone(&starts);
            handles.push(tokio::spawn(async move {
                scheduler
                    .submit(cost, move || {
                        let starts = Arc::clone(&starts);
                        async move {
                            starts.lock().unwrap().push((Instant::now(), cost));
                            Ok::<_, LlmError>(())
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let mut starts = starts.lock().unwrap().clone();
        starts.sort_by_key(|(at, _)| *at);
        starts
    }

    /// Largest (requests, tokens) seen in any window-long interval
    fn peak_usage(starts: &[(Instant, u64)], window: Duration) -> (usize, u64) {
        let mut peak = (0, 0);
        for (i, (from, _)) in starts.iter().enumerate() {
            let inside: Vec<u64> = starts[i..]
                .iter()
                .take_while(|(at, _)| *at < *from + window)
                .map(|(_, cost)| *cost)
                .collect();
            peak.0 = peak.0.max(inside.len());
            peak.1 = peak.1.max(inside.iter().sum());
        }
        peak
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_budget_never_exceeded_in_any_window() {
        let scheduler = Scheduler::new(config(5, 100_000)).unwrap();

        let starts = run_all(&scheduler, &[100; 12]).await;

        assert_eq!(starts.len(), 12);
        let (requests, _) = peak_usage(&starts, Duration::from_secs(60));
        assert!(requests <= 5, "{} requests in one window", requests);
        // 12 calls at 5 per window need three windows
        assert!(starts[11].0 - starts[0].0 >= Duration::from_secs(120));
        assert!(scheduler.metrics().cooldowns > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_budget_never_exceeded_in_any_window() {
        let scheduler = Scheduler::new(config(100, 1_000)).unwrap();

        let starts = run_all(&scheduler, &[400, 400, 400, 400, 400]).await;

        let (_, tokens) = peak_usage(&starts, Duration::from_secs(60));
        assert!(tokens <= 1_000, "{} tokens in one window", tokens);
        assert_eq!(scheduler.metrics().completed, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_budget_task_eventually_dispatched() {
        let scheduler = Scheduler::new(config(100, 1_000)).unwrap();

        let starts = run_all(&scheduler, &[1_000, 300, 300, 300]).await;

        assert_eq!(starts.len(), 4);
        let (_, tokens) = peak_usage(&starts, Duration::from_secs(60));
        assert!(tokens <= 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_dispatched_cheapest_first() {
        let scheduler = Scheduler::new(config(1, 10_000)).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        // Use up the single request of the first window
        scheduler
            .submit(10, || async { Ok::<_, LlmError>(()) })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for cost in [500u64, 50, 200] {
            let scheduler = scheduler.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                scheduler
                    .submit(cost, move || {
                        let order = Arc::clone(&order);
                        async move {
                            order.lock().unwrap().push(cost);
                            Ok::<_, LlmError>(())
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![50, 200, 500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_call_is_retried() {
        let scheduler = Scheduler::new(config(10, 10_000)).unwrap();
        let llm = MockProvider::new("ok");
        llm.add_error_times(
            "verify",
            LlmError::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            },
            2,
        );

        let calls = llm.clone();
        let result = scheduler
            .submit(100, move || {
                let llm = calls.clone();
                async move { llm.generate("verify claim").await }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(llm.call_count(), 3);
        let metrics = scheduler.metrics();
        assert_eq!(metrics.retries, 2);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_only_that_caller() {
        let scheduler = Scheduler::new(config(10, 10_000)).unwrap();
        let llm = MockProvider::new("fine");
        llm.add_error("doomed", LlmError::RateLimited { retry_after: None });

        let doomed = {
            let scheduler = scheduler.clone();
            let llm = llm.clone();
            tokio::spawn(async move {
                scheduler
                    .submit(100, move || {
                        let llm = llm.clone();
                        async move { llm.generate("doomed claim").await }
                    })
                    .await
            })
        };
        let healthy = {
            let scheduler = scheduler.clone();
            let llm = llm.clone();
            tokio::spawn(async move {
                scheduler
                    .submit(100, move || {
                        let llm = llm.clone();
                        async move { llm.generate("healthy claim").await }
                    })
                    .await
            })
        };

        let doomed = doomed.await.unwrap();
        let healthy = healthy.await.unwrap();

        assert!(matches!(
            doomed,
            Err(SchedulerError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(healthy.unwrap(), "fine");
        assert_eq!(scheduler.metrics().failed, 1);
    }

    #[tokio::test]
    async fn test_cost_exceeding_budget_rejected_at_submit() {
        let scheduler = Scheduler::new(config(10, 1_000)).unwrap();

        let result = scheduler
            .submit(1_001, || async { Ok::<_, LlmError>(()) })
            .await;
        assert_eq!(
            result,
            Err(SchedulerError::CostExceedsBudget {
                cost: 1_001,
                budget: 1_000
            })
        );

        // The queue is not wedged
        scheduler
            .submit(1_000, || async { Ok::<_, LlmError>(()) })
            .await
            .unwrap();

        let metrics = scheduler.metrics();
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.submitted, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = Scheduler::new(config(0, 1_000));
        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_work_survives_dropping_other_handles() {
        let scheduler = Scheduler::new(config(1, 10_000)).unwrap();
        let clone = scheduler.clone();
        drop(scheduler);

        let handle = tokio::spawn(async move {
            clone.submit(10, || async { Ok::<_, LlmError>(7) }).await
        });
        assert_eq!(handle.await.unwrap(), Ok(7));
    }
}
