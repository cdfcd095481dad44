//! Operations that can be run under a deadline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::OperationError;

/// Status code and output values produced by an operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationOutput {
    /// Operation-defined status code
    pub status: i32,
    /// Ordered output values
    pub outputs: Vec<Value>,
}

impl OperationOutput {
    /// Create an output with the given status and values.
    pub fn new(status: i32, outputs: Vec<Value>) -> Self {
        Self { status, outputs }
    }

    /// A successful (status 0) output.
    pub fn ok(outputs: Vec<Value>) -> Self {
        Self::new(0, outputs)
    }
}

/// A synchronous, potentially blocking unit of work.
///
/// Operations run on a worker thread, so they must be `Send + Sync +
/// 'static`. A timed-out operation keeps running on its worker until it
/// returns by itself.
pub trait Operation: Send + Sync + 'static {
    /// Diagnostic label, also used in the worker thread name.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Run the operation on the given input values.
    fn call(&self, args: Vec<Value>) -> Result<OperationOutput, OperationError>;
}

impl<F, E> Operation for F
where
    F: Fn(Vec<Value>) -> Result<OperationOutput, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    fn call(&self, args: Vec<Value>) -> Result<OperationOutput, OperationError> {
        self(args).map_err(|err| OperationError::new(err.to_string()))
    }
}

/// An operation with an explicit name.
pub struct Named<F> {
    name: String,
    inner: F,
}

impl<F> fmt::Debug for Named<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Named").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<F, E> Operation for Named<F>
where
    F: Fn(Vec<Value>) -> Result<OperationOutput, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: Vec<Value>) -> Result<OperationOutput, OperationError> {
        (self.inner)(args).map_err(|err| OperationError::new(err.to_string()))
    }
}

/// Give a closure a diagnostic name.
///
/// ```rust
/// use bounded_call::{named, OperationOutput, OperationError};
///
/// let op = named("ping", |_args| Ok::<_, OperationError>(OperationOutput::ok(vec!["pong".into()])));
/// ```
pub fn named<F, E>(name: impl Into<String>, inner: F) -> Named<F>
where
    F: Fn(Vec<Value>) -> Result<OperationOutput, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    Named {
        name: name.into(),
        inner,
    }
}
