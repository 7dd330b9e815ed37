//! Configuration for the Rate-Limited Scheduler
//!
//! Defines the request and token budgets, the loop's timing, and the retry
//! policy applied to every dispatched call.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Scheduler
///
/// # Examples
///
/// ```
/// use verity_scheduler::SchedulerConfig;
///
/// // Default configuration (balanced)
/// let config = SchedulerConfig::default();
/// assert_eq!(config.window_secs, 60);
///
/// // Conservative budgets for free-tier API keys
/// let config = SchedulerConfig::aggressive();
/// assert!(config.requests_per_minute < SchedulerConfig::default().requests_per_minute);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Requests allowed per rolling window
    pub requests_per_minute: u32,

    /// Estimated tokens allowed per rolling window
    pub tokens_per_minute: u64,

    /// Length of the rolling window (in seconds)
    /// Default: 60
    pub window_secs: u64,

    /// Pause when a budget is exhausted (in milliseconds)
    pub cooldown_ms: u64,

    /// Pause when budget remains but nothing pending fits (in milliseconds)
    pub idle_poll_ms: u64,

    /// Retry policy for dispatched calls
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Per-call retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt before the caller gets the error
    pub max_retries: u32,

    /// First backoff delay (in milliseconds), doubled on each retry
    pub initial_backoff_ms: u64,

    /// Upper bound on any delay, including provider hints (in milliseconds)
    pub max_backoff_ms: u64,

    /// Timeout for a single attempt (in milliseconds)
    pub call_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            call_timeout_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Get the per-attempt timeout as Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Get the first backoff delay as Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Get the delay cap as Duration
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Delay before retry number `attempt + 1`
    ///
    /// A provider hint wins over the exponential schedule; both are capped at
    /// `max_backoff`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| {
            self.initial_backoff()
                .saturating_mul(2u32.saturating_pow(attempt))
        });
        delay.min(self.max_backoff())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            tokens_per_minute: 60_000,
            window_secs: 60,
            cooldown_ms: 1_000,
            idle_poll_ms: 100,
            retry: RetryConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Conservative budgets and patient retries
    ///
    /// Suitable for free-tier keys where throttling is frequent.
    pub fn aggressive() -> Self {
        Self {
            requests_per_minute: 15,
            tokens_per_minute: 20_000,
            window_secs: 60,
            cooldown_ms: 2_000,
            idle_poll_ms: 250,
            retry: RetryConfig {
                max_retries: 5,
                initial_backoff_ms: 1_000,
                max_backoff_ms: 60_000,
                call_timeout_ms: 90_000,
            },
        }
    }

    /// Generous budgets and fast polling
    ///
    /// Suitable for paid tiers or a local model.
    pub fn lenient() -> Self {
        Self {
            requests_per_minute: 500,
            tokens_per_minute: 1_000_000,
            window_secs: 60,
            cooldown_ms: 250,
            idle_poll_ms: 50,
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 250,
                max_backoff_ms: 10_000,
                call_timeout_ms: 120_000,
            },
        }
    }

    /// Get the rolling window as Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the exhausted-budget pause as Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Get the idle poll interval as Duration
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_minute == 0 {
            return Err("requests_per_minute must be greater than 0".to_string());
        }
        if self.tokens_per_minute == 0 {
            return Err("tokens_per_minute must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("window_secs must be greater than 0".to_string());
        }
        if self.cooldown_ms == 0 || self.idle_poll_ms == 0 {
            return Err("cooldown_ms and idle_poll_ms must be greater than 0".to_string());
        }
        if self.retry.call_timeout_ms == 0 {
            return Err("retry.call_timeout_ms must be greater than 0".to_string());
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err("retry.initial_backoff_ms cannot exceed retry.max_backoff_ms".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
