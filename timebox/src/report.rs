//! Flat JSON view of a call result, plus the process exit code it maps to.

use bounded_call::{CallResult, Outcome, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Exit code used when the deadline passed, matching coreutils `timeout`.
pub const EXIT_TIMED_OUT: u8 = 124;
/// Exit code used when the command could not be run.
pub const EXIT_FAILED: u8 = 1;

/// What timebox prints for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Program that was run
    pub operation_name: String,
    /// Exit code, or a reserved executor code (-1 failed, -2 timed out)
    pub status_code: i32,
    /// Whether the deadline passed first
    pub timed_out: bool,
    /// Time spent dispatching and waiting
    pub elapsed_ms: f64,
    /// Deadline the program ran with
    pub timeout_ms: u64,
    /// Why the program could not be run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// `[stdout, stderr]` when the program finished
    pub output_args: Vec<Value>,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
}

impl Report {
    /// Flatten a call result into the printed shape.
    pub fn from_result(result: &CallResult) -> Self {
        Self {
            operation_name: result.operation_name().to_string(),
            status_code: result.status_code(),
            timed_out: result.timed_out(),
            elapsed_ms: result.elapsed_ms(),
            timeout_ms: result.timeout_ms(),
            error_message: result.error_message().map(str::to_string),
            output_args: result.output_args().to_vec(),
            started_at: result.started_at(),
        }
    }
}

/// Process exit code for a finished invocation.
pub fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Completed { status: 0, .. } => 0,
        Outcome::Completed { status, .. } => (*status).clamp(1, 255) as u8,
        Outcome::TimedOut => EXIT_TIMED_OUT,
        Outcome::Failed { .. } | Outcome::NotRun => EXIT_FAILED,
    }
}
