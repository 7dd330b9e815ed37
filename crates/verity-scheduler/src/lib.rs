//! Verity Scheduler
//!
//! Rate-limited dispatch of model calls against a rolling request and token budget.
//!
//! # Overview
//!
//! Every verification call goes through one [`Scheduler`]. The scheduler:
//! - **Enforces budgets**: at most `requests_per_minute` dispatches and
//!   `tokens_per_minute` estimated tokens inside any rolling window
//! - **Prefers cheap calls**: pending calls are released smallest estimate first
//! - **Retries failures**: each call gets a per-attempt timeout and exponential
//!   backoff, honouring a provider's retry-after hint when rate limited
//! - **Collects metrics**: submissions, dispatches, retries and cooldowns
//!
//! A retry runs inside the dispatched call, so only the first attempt is
//! charged to the window.
//!
//! # Usage
//!
//! ```
//! use verity_scheduler::{estimate_tokens, Scheduler, SchedulerConfig};
//! use verity_llm::MockProvider;
//! use verity_domain::traits::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Scheduler::new(SchedulerConfig::default())?;
//! let llm = MockProvider::new("ok");
//!
//! let prompt = "Is the sky blue?";
//! let reply = scheduler
//!     .submit(estimate_tokens(prompt), move || {
//!         let llm = llm.clone();
//!         async move { llm.generate(prompt).await }
//!     })
//!     .await?;
//!
//! assert_eq!(reply, "ok");
//! println!("{}", scheduler.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use verity_scheduler::SchedulerConfig;
//!
//! // Default: 60 requests and 60k tokens per minute
//! let config = SchedulerConfig::default();
//!
//! // Aggressive: throttles hard, retries patiently (free-tier keys)
//! let config = SchedulerConfig::aggressive();
//!
//! // Lenient: generous budgets for paid tiers or a local model
//! let config = SchedulerConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [scheduler]
//! requests_per_minute = 60
//! tokens_per_minute = 60000
//! window_secs = 60
//! cooldown_ms = 1000
//! idle_poll_ms = 100
//!
//! [scheduler.retry]
//! max_retries = 3
//! initial_backoff_ms = 500
//! max_backoff_ms = 30000
//! call_timeout_ms = 60000
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod retry;
mod scheduler;
mod tokens;
mod window;

pub use config::{RetryConfig, SchedulerConfig};
pub use error::SchedulerError;
pub use metrics::{MetricsSnapshot, SchedulerMetrics};
pub use scheduler::Scheduler;
pub use tokens::{estimate_tokens, CHARS_PER_TOKEN, REQUEST_OVERHEAD_TOKENS};
