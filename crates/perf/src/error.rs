//! Error types for timing operations.

use thiserror::Error;

/// Errors that can occur while measuring elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The high-resolution clock could not be read
    #[error("High-resolution clock unavailable: {0}")]
    ClockUnavailable(String),

    /// `stop` was called with no open interval
    #[error("Unbalanced stop: no open interval to close")]
    UnbalancedStop,
}

impl TimerError {
    /// Create a new ClockUnavailable error
    pub fn clock_unavailable(msg: impl Into<String>) -> Self {
        Self::ClockUnavailable(msg.into())
    }
}

/// Result type for timing operations.
pub type TimerResult<T> = Result<T, TimerError>;
