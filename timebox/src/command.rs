//! External commands as bounded operations.

use bounded_call::{Operation, OperationError, OperationOutput, Value};
use std::process::Command;

/// Runs a program with the invocation's input values as its arguments.
///
/// Outputs are `[stdout, stderr]`; the status is the process exit code. A
/// process killed by a signal has no exit code and is reported as an error.
#[derive(Debug, Clone)]
pub struct CommandOperation {
    program: String,
}

impl CommandOperation {
    /// Run `program`, looked up on `PATH` like a shell would.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Operation for CommandOperation {
    fn name(&self) -> &str {
        &self.program
    }

    fn call(&self, args: Vec<Value>) -> Result<OperationOutput, OperationError> {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| match arg {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        tracing::debug!(program = %self.program, ?args, "spawning command");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| OperationError::new(format!("failed to run {}: {err}", self.program)))?;

        let status = output.status.code().ok_or_else(|| {
            OperationError::new(format!("{} was terminated by a signal", self.program))
        })?;

        Ok(OperationOutput::new(
            status,
            vec![
                Value::String(String::from_utf8_lossy(&output.stdout).into_owned()),
                Value::String(String::from_utf8_lossy(&output.stderr).into_owned()),
            ],
        ))
    }
}
