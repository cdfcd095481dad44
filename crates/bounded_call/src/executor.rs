//! Deadline-bounded invocation of blocking operations.
//!
//! The operation runs on its own worker thread and reports back over a
//! one-shot channel. The caller waits on that channel for at most the
//! requested timeout. When the deadline passes the wait ends; the worker does
//! not. It keeps running until the operation returns, and if it never
//! returns the thread is leaked. [`BoundedCallExecutor::abandoned_workers`]
//! counts workers in that state.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};
use perf::{CallMetrics, Clock, ElapsedTimer, MetricsSummary, MonotonicClock};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::operation::{Operation, OperationOutput};
use crate::outcome::{CallResult, Outcome};

const WORKER_RUNNING: u8 = 0;
const WORKER_DONE: u8 = 1;
const WORKER_ABANDONED: u8 = 2;

/// What a worker sends back: the operation output or an error message.
type WorkerReport = Result<OperationOutput, String>;

enum Wait {
    Report(WorkerReport),
    Elapsed,
    Disconnected,
}

/// Runs operations on worker threads and waits for them up to a deadline.
///
/// Each executor owns one [`ElapsedTimer`]. `invoke` takes `&mut self`, so
/// an executor serves one call at a time; give each thread its own executor
/// for concurrent bounded calls.
///
/// # Example
///
/// ```rust
/// use bounded_call::{BoundedCallExecutor, OperationError, OperationOutput, Value};
///
/// let mut executor = BoundedCallExecutor::new();
/// let op = |_args: Vec<Value>| Ok::<_, OperationError>(OperationOutput::ok(vec!["done".into()]));
/// let result = executor.invoke(1_000, op, Vec::new()).unwrap();
///
/// assert!(!result.timed_out());
/// assert_eq!(result.status_code(), 0);
/// ```
#[derive(Debug)]
pub struct BoundedCallExecutor<C: Clock = MonotonicClock> {
    config: ExecutorConfig,
    timer: ElapsedTimer<C>,
    metrics: CallMetrics,
    abandoned: Arc<AtomicUsize>,
}

impl BoundedCallExecutor<MonotonicClock> {
    /// Create an executor with default settings.
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with the given configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl Default for BoundedCallExecutor<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BoundedCallExecutor<C> {
    /// Create an executor that times calls with the given clock.
    pub fn with_clock(config: ExecutorConfig, clock: C) -> Self {
        let timer = ElapsedTimer::with_clock(clock).with_unit(config.elapsed_unit);
        let mut metrics = CallMetrics::new().with_max_samples(config.max_metric_samples);
        metrics.set_enabled(config.collect_metrics);

        Self {
            config,
            timer,
            metrics,
            abandoned: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `operation` with a deadline of `timeout_ms` milliseconds.
    pub fn invoke<O: Operation>(
        &mut self,
        timeout_ms: u64,
        operation: O,
        input_args: Vec<Value>,
    ) -> ExecutorResult<CallResult> {
        let operation: Arc<dyn Operation> = Arc::new(operation);
        self.invoke_dyn(timeout_ms, Some(operation), input_args)
    }

    /// Run `operation` with the configured default deadline.
    pub fn invoke_default<O: Operation>(
        &mut self,
        operation: O,
        input_args: Vec<Value>,
    ) -> ExecutorResult<CallResult> {
        let timeout_ms = self.config.default_timeout_ms;
        self.invoke(timeout_ms, operation, input_args)
    }

    /// Run a shared, possibly absent operation with a deadline.
    ///
    /// A missing operation fails with [`ExecutorError::InvalidArgument`]
    /// before the timer is touched or a thread is started. Clock failures
    /// also escape as errors. Every other outcome, including timeouts and
    /// operation errors, is reported in the returned [`CallResult`].
    ///
    /// A `timeout_ms` of 0 checks for completion exactly once, right after
    /// dispatch, without blocking.
    pub fn invoke_dyn(
        &mut self,
        timeout_ms: u64,
        operation: Option<Arc<dyn Operation>>,
        input_args: Vec<Value>,
    ) -> ExecutorResult<CallResult> {
        let operation = operation
            .ok_or_else(|| ExecutorError::invalid_argument("operation must be provided"))?;
        let name = operation.name().to_string();
        let pending = CallResult::pending(name.as_str(), timeout_ms, self.timer.unit());

        let guard = self.timer.scoped()?;
        let outcome = dispatch_and_wait(
            &self.config.worker_name_prefix,
            &self.abandoned,
            operation,
            &name,
            timeout_ms,
            input_args,
        );
        let elapsed = guard.finish()?;

        let result = pending.with_outcome(outcome).with_elapsed(elapsed);
        self.observe(&result);
        Ok(result)
    }

    /// Workers whose calls timed out and that have not returned yet.
    pub fn abandoned_workers(&self) -> usize {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Open intervals on the executor's timer; 0 between calls.
    pub fn open_intervals(&self) -> usize {
        self.timer.count()
    }

    /// Metrics recorded by this executor.
    pub fn metrics(&self) -> &CallMetrics {
        &self.metrics
    }

    /// Summary of recorded metrics.
    pub fn metrics_summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Discard recorded metrics.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn observe(&mut self, result: &CallResult) {
        let operation = result.operation_name();
        let elapsed_ms = result.elapsed_ms();

        match result.outcome() {
            Outcome::Completed { status, .. } => {
                tracing::debug!(
                    target: "bounded_call",
                    operation,
                    status = *status,
                    elapsed_ms,
                    "operation completed"
                );
                if let Some(threshold_ms) = self.config.slow_call_warn_ms {
                    if elapsed_ms > threshold_ms as f64 {
                        tracing::warn!(
                            target: "bounded_call",
                            operation,
                            elapsed_ms,
                            threshold_ms,
                            "slow operation"
                        );
                    }
                }
            }
            Outcome::TimedOut => {
                tracing::warn!(
                    target: "bounded_call",
                    operation,
                    timeout_ms = result.timeout_ms(),
                    elapsed_ms,
                    abandoned = self.abandoned_workers(),
                    "operation timed out, worker left running"
                );
            }
            Outcome::Failed { message } => {
                tracing::debug!(
                    target: "bounded_call",
                    operation,
                    elapsed_ms,
                    error = %message,
                    "operation failed"
                );
            }
            Outcome::NotRun => {}
        }

        if let Some(kind) = result.outcome().kind() {
            self.metrics.record(operation, elapsed_ms, kind);
        }
    }
}

fn dispatch_and_wait(
    prefix: &str,
    abandoned: &Arc<AtomicUsize>,
    operation: Arc<dyn Operation>,
    name: &str,
    timeout_ms: u64,
    input_args: Vec<Value>,
) -> Outcome {
    let (tx, rx) = bounded::<WorkerReport>(1);
    let state = Arc::new(AtomicU8::new(WORKER_RUNNING));

    let worker_state = Arc::clone(&state);
    let worker_abandoned = Arc::clone(abandoned);
    let worker_label = name.to_string();

    let spawned = thread::Builder::new()
        .name(format!("{prefix}-{name}").replace('\0', ""))
        .spawn(move || {
            let report = run_operation(operation.as_ref(), input_args);
            // The receiver is gone if the caller stopped waiting.
            let _ = tx.send(report);

            if worker_state.swap(WORKER_DONE, Ordering::AcqRel) == WORKER_ABANDONED {
                worker_abandoned.fetch_sub(1, Ordering::AcqRel);
                tracing::debug!(
                    target: "bounded_call",
                    operation = %worker_label,
                    "abandoned worker finished"
                );
            }
        });

    if let Err(err) = spawned {
        return Outcome::Failed {
            message: format!("failed to spawn worker: {err}"),
        };
    }

    tracing::trace!(target: "bounded_call", operation = name, timeout_ms, "operation dispatched");

    match wait_for_report(&rx, timeout_ms) {
        Wait::Report(Ok(output)) => Outcome::Completed {
            status: output.status,
            outputs: output.outputs,
        },
        Wait::Report(Err(message)) => Outcome::Failed { message },
        Wait::Disconnected => Outcome::Failed {
            message: "worker exited without reporting a result".to_string(),
        },
        Wait::Elapsed => {
            // Count first so a worker finishing right now never decrements below zero.
            abandoned.fetch_add(1, Ordering::AcqRel);
            if state
                .compare_exchange(
                    WORKER_RUNNING,
                    WORKER_ABANDONED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                abandoned.fetch_sub(1, Ordering::AcqRel);
            }
            Outcome::TimedOut
        }
    }
}

fn wait_for_report(rx: &Receiver<WorkerReport>, timeout_ms: u64) -> Wait {
    if timeout_ms == 0 {
        return match rx.try_recv() {
            Ok(report) => Wait::Report(report),
            Err(TryRecvError::Empty) => Wait::Elapsed,
            Err(TryRecvError::Disconnected) => Wait::Disconnected,
        };
    }

    match rx.recv_timeout(Duration::from_millis(timeout_ms)) {
        Ok(report) => Wait::Report(report),
        Err(RecvTimeoutError::Timeout) => Wait::Elapsed,
        Err(RecvTimeoutError::Disconnected) => Wait::Disconnected,
    }
}

fn run_operation(operation: &dyn Operation, args: Vec<Value>) -> WorkerReport {
    match panic::catch_unwind(AssertUnwindSafe(|| operation.call(args))) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(err.message().to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}
