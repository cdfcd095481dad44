//! Bounded Calls
//!
//! This crate runs synchronous, potentially blocking operations with an
//! upper bound on how long the caller waits for them:
//!
//! - [`BoundedCallExecutor`] dispatches an [`Operation`] to a worker thread
//!   and waits for it up to a timeout
//! - [`CallResult`] reports completion, timeout, or failure, always with the
//!   elapsed time measured by a [`perf::ElapsedTimer`]
//! - [`ExecutorConfig`] holds defaults such as the fallback timeout
//!
//! Timing out ends the wait, never the work: a worker whose operation does
//! not return is left running. Pick operations that are fast, cooperative,
//! or safe to abandon.
//!
//! # Example
//!
//! ```rust
//! use bounded_call::{named, BoundedCallExecutor, OperationOutput, OperationError};
//! use std::time::Duration;
//!
//! let mut executor = BoundedCallExecutor::new();
//! let slow = named("slow", |_args| {
//!     std::thread::sleep(Duration::from_millis(200));
//!     Ok::<_, OperationError>(OperationOutput::default())
//! });
//!
//! let result = executor.invoke(20, slow, Vec::new()).unwrap();
//! assert!(result.timed_out());
//! assert_eq!(result.status_code(), bounded_call::STATUS_TIMED_OUT);
//! ```
//!
//! # Modules
//!
//! - [`executor`] - Dispatch and bounded wait
//! - [`outcome`] - Result records and reserved status codes
//! - [`operation`] - The operation trait and closure adapters

mod config;
mod error;
pub mod executor;
pub mod operation;
pub mod outcome;

pub use config::ExecutorConfig;
pub use error::{ExecutorError, ExecutorResult, OperationError};
pub use executor::BoundedCallExecutor;
pub use operation::{named, Named, Operation, OperationOutput};
pub use outcome::{CallResult, Outcome, STATUS_FAILED, STATUS_NOT_RUN, STATUS_TIMED_OUT};

/// Re-export for convenience
pub use serde_json::Value;
