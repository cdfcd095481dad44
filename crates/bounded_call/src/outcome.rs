//! Result records returned by the executor.

use chrono::{DateTime, Utc};
use perf::{Elapsed, OutcomeKind, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status reported when the operation raised an error.
pub const STATUS_FAILED: i32 = -1;
/// Status reported when the deadline passed before the operation finished.
pub const STATUS_TIMED_OUT: i32 = -2;
/// Status of a record whose operation was never dispatched.
pub const STATUS_NOT_RUN: i32 = -3;

/// How an invocation ended.
///
/// The integer view in [`CallResult::status_code`] folds this into one code
/// and cannot tell an operation's own negative codes apart from the reserved
/// ones. Match on the outcome when that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// The operation returned before the deadline
    Completed {
        /// Status code returned by the operation
        status: i32,
        /// Output values returned by the operation
        outputs: Vec<Value>,
    },
    /// The deadline passed first; the worker was left running
    TimedOut,
    /// The operation raised an error or panicked
    Failed {
        /// Error text
        message: String,
    },
    /// Nothing has been dispatched yet
    NotRun,
}

impl Outcome {
    /// Integer status for this outcome.
    pub fn status_code(&self) -> i32 {
        match self {
            Outcome::Completed { status, .. } => *status,
            Outcome::TimedOut => STATUS_TIMED_OUT,
            Outcome::Failed { .. } => STATUS_FAILED,
            Outcome::NotRun => STATUS_NOT_RUN,
        }
    }

    /// Metrics category, if the operation was dispatched.
    pub fn kind(&self) -> Option<OutcomeKind> {
        match self {
            Outcome::Completed { .. } => Some(OutcomeKind::Completed),
            Outcome::TimedOut => Some(OutcomeKind::TimedOut),
            Outcome::Failed { .. } => Some(OutcomeKind::Failed),
            Outcome::NotRun => None,
        }
    }
}

/// Immutable record of one bounded invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    operation_name: String,
    outcome: Outcome,
    elapsed: Elapsed,
    timeout_ms: u64,
    started_at: DateTime<Utc>,
}

impl CallResult {
    /// A record in its initial state: not run, nothing elapsed.
    pub(crate) fn pending(operation_name: impl Into<String>, timeout_ms: u64, unit: TimeUnit) -> Self {
        Self {
            operation_name: operation_name.into(),
            outcome: Outcome::NotRun,
            elapsed: Elapsed::zero(unit),
            timeout_ms,
            started_at: Utc::now(),
        }
    }

    pub(crate) fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Elapsed) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Diagnostic name of the operation.
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// How the invocation ended.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Consume the record, keeping only the outcome.
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Operation status, or one of the reserved executor codes.
    pub fn status_code(&self) -> i32 {
        self.outcome.status_code()
    }

    /// Whether the deadline passed before the operation finished.
    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, Outcome::TimedOut)
    }

    /// Whether the operation completed with status 0.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { status: 0, .. })
    }

    /// Error text, present only for failed invocations.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Output values; empty unless the operation completed.
    pub fn output_args(&self) -> &[Value] {
        match &self.outcome {
            Outcome::Completed { outputs, .. } => outputs,
            _ => &[],
        }
    }

    /// Time spent dispatching and waiting.
    pub fn elapsed(&self) -> Elapsed {
        self.elapsed
    }

    /// Time spent dispatching and waiting, in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_millis()
    }

    /// Deadline the invocation was run with.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Wall-clock time the invocation began.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
