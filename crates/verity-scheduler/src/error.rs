//! Error types for Scheduler operations

use thiserror::Error;

/// Errors returned to the caller of a scheduled call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The estimate can never fit the token budget
    #[error("Estimated cost {cost} exceeds the token budget of {budget} per window")]
    CostExceedsBudget {
        /// Estimated tokens of the rejected call
        cost: u64,
        /// Configured tokens per window
        budget: u64,
    },

    /// Every attempt failed or timed out
    #[error("Call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Error from the final attempt
        last_error: String,
    },

    /// The scheduling loop is no longer running
    #[error("Scheduler is shut down")]
    Shutdown,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
