//! Error types for bounded calls
//!
//! Only misuse escapes [`crate::BoundedCallExecutor::invoke`] as an error.
//! Timeouts and operation failures are reported through the returned
//! [`crate::CallResult`].

use perf::TimerError;
use thiserror::Error;

/// Errors that abort an invocation before it can produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// A required argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The elapsed timer failed (clock unavailable or unbalanced stop)
    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl ExecutorError {
    /// Create a new InvalidArgument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether the clock could not be read.
    pub fn is_clock_unavailable(&self) -> bool {
        matches!(self, Self::Timer(TimerError::ClockUnavailable(_)))
    }

    /// Whether a timer stop had no matching start.
    pub fn is_unbalanced_stop(&self) -> bool {
        matches!(self, Self::Timer(TimerError::UnbalancedStop))
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Error raised by an operation while it runs.
///
/// Captured by the executor and turned into a failed outcome; never
/// returned from `invoke`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
}

impl OperationError {
    /// Create an operation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for OperationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for OperationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutorError::invalid_argument("operation must be provided");
        assert_eq!(err.to_string(), "Invalid argument: operation must be provided");

        let err: ExecutorError = TimerError::UnbalancedStop.into();
        assert_eq!(err.to_string(), "Unbalanced stop: no open interval to close");
        assert!(err.is_unbalanced_stop());
        assert!(!err.is_clock_unavailable());
    }

    #[test]
    fn test_clock_error_conversion() {
        let err: ExecutorError = TimerError::clock_unavailable("gone").into();
        assert!(err.is_clock_unavailable());
    }

    #[test]
    fn test_operation_error_message() {
        let err = OperationError::from("boom");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
