//! Integration tests for bounded calls
//! Tests completion, timeout, failure, and zero-timeout behavior
//!
//! These tests use real sleeps, so timing assertions leave generous room for
//! scheduler noise while still telling a bounded wait from a full one.

use bounded_call::{
    named, BoundedCallExecutor, ExecutorError, Operation, OperationError, OperationOutput,
    Outcome, Value, STATUS_FAILED, STATUS_TIMED_OUT,
};
use perf::ElapsedTimer;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn sleeper(ms: u64, outputs: Vec<Value>) -> impl Operation {
    named(format!("sleep_{ms}"), move |_args: Vec<Value>| {
        thread::sleep(Duration::from_millis(ms));
        Ok::<_, OperationError>(OperationOutput::ok(outputs.clone()))
    })
}

fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

#[test]
fn test_completes_before_timeout() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor
        .invoke(200, sleeper(50, vec![json!("done")]), Vec::new())
        .unwrap();

    assert_eq!(result.status_code(), 0);
    assert!(!result.timed_out());
    assert_eq!(result.output_args(), &[json!("done")]);
    assert_eq!(result.error_message(), None);
    assert!(
        result.elapsed_ms() >= 45.0 && result.elapsed_ms() < 200.0,
        "elapsed should be about 50ms, got {}",
        result.elapsed_ms()
    );
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_times_out_without_waiting_for_operation() {
    let mut executor = BoundedCallExecutor::new();

    let start = Instant::now();
    let result = executor.invoke(100, sleeper(500, Vec::new()), Vec::new()).unwrap();
    let waited = start.elapsed();

    assert!(result.timed_out());
    assert_eq!(result.status_code(), STATUS_TIMED_OUT);
    assert!(result.output_args().is_empty());
    assert!(
        waited < Duration::from_millis(400),
        "invoke should return near the 100ms deadline, took {:?}",
        waited
    );
    assert!(result.elapsed_ms() >= 95.0, "elapsed was {}", result.elapsed_ms());
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_operation_error_is_reported() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor
        .invoke(
            100,
            |_args: Vec<Value>| Err::<OperationOutput, _>(OperationError::new("boom")),
            Vec::new(),
        )
        .unwrap();

    assert_eq!(result.status_code(), STATUS_FAILED);
    assert_eq!(result.error_message(), Some("boom"));
    assert!(!result.timed_out());
    assert!(result.elapsed_ms() >= 0.0);
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_operation_panic_is_reported() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor
        .invoke(
            100,
            |_args: Vec<Value>| -> Result<OperationOutput, OperationError> { panic!("boom") },
            Vec::new(),
        )
        .unwrap();

    assert_eq!(result.status_code(), STATUS_FAILED);
    assert_eq!(result.error_message(), Some("boom"));
}

#[test]
fn test_zero_timeout_slow_operation_times_out() {
    let mut executor = BoundedCallExecutor::new();

    let start = Instant::now();
    let result = executor.invoke(0, sleeper(200, Vec::new()), Vec::new()).unwrap();

    assert!(result.timed_out());
    assert_eq!(result.status_code(), STATUS_TIMED_OUT);
    assert!(start.elapsed() < Duration::from_millis(150));
}

#[test]
fn test_zero_timeout_instant_operation_never_blocks_or_fails() {
    let mut executor = BoundedCallExecutor::new();

    for _ in 0..20 {
        let start = Instant::now();
        let result = executor
            .invoke(
                0,
                |_args: Vec<Value>| Ok::<_, OperationError>(OperationOutput::ok(Vec::new())),
                Vec::new(),
            )
            .unwrap();

        assert!(start.elapsed() < Duration::from_millis(100));
        match result.outcome() {
            Outcome::Completed { status, .. } => {
                assert_eq!(*status, 0);
                assert!(!result.timed_out());
            }
            Outcome::TimedOut => assert_eq!(result.status_code(), STATUS_TIMED_OUT),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_zero_timeout_instant_operation_can_complete() {
    // A single check right after dispatch only wins when the worker gets
    // scheduled first, so retry until it does.
    let mut executor = BoundedCallExecutor::new();

    let completed = (0..5000).any(|_| {
        let result = executor
            .invoke(
                0,
                |_args: Vec<Value>| Ok::<_, OperationError>(OperationOutput::ok(vec![json!("fast")])),
                Vec::new(),
            )
            .unwrap();

        matches!(result.outcome(), Outcome::Completed { status: 0, .. })
            && !result.timed_out()
            && result.output_args() == [json!("fast")]
    });

    assert!(completed, "no zero-timeout call completed in 5000 attempts");
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_missing_operation() {
    let mut executor = BoundedCallExecutor::new();

    let err = executor.invoke_dyn(100, None, vec![json!(1)]).unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidArgument(_)));
    assert_eq!(executor.open_intervals(), 0);
}

#[test]
fn test_shared_operation_reused() {
    let mut executor = BoundedCallExecutor::new();
    let op: Arc<dyn Operation> = Arc::new(named("echo", |args: Vec<Value>| {
        Ok::<_, OperationError>(OperationOutput::ok(args))
    }));

    for i in 0..3 {
        let result = executor
            .invoke_dyn(1_000, Some(Arc::clone(&op)), vec![json!(i)])
            .unwrap();
        assert_eq!(result.operation_name(), "echo");
        assert_eq!(result.output_args(), &[json!(i)]);
    }
    assert_eq!(executor.metrics_summary().operations["echo"].completed, 3);
}

#[test]
fn test_abandoned_worker_is_tracked_until_it_finishes() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor.invoke(10, sleeper(150, Vec::new()), Vec::new()).unwrap();
    assert!(result.timed_out());
    assert_eq!(executor.abandoned_workers(), 1);

    assert!(
        wait_until(Duration::from_secs(3), || executor.abandoned_workers() == 0),
        "abandoned worker should finish on its own"
    );
}

#[test]
fn test_completed_worker_is_not_abandoned() {
    let mut executor = BoundedCallExecutor::new();

    executor.invoke(500, sleeper(5, Vec::new()), Vec::new()).unwrap();
    assert_eq!(executor.abandoned_workers(), 0);
}

#[test]
fn test_executors_on_separate_threads_do_not_interfere() {
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            thread::spawn(move || {
                let mut executor = BoundedCallExecutor::new();
                let result = executor
                    .invoke(1_000, sleeper(10 * (i + 1), vec![json!(i)]), Vec::new())
                    .unwrap();
                (i, result, executor.open_intervals())
            })
        })
        .collect();

    for handle in handles {
        let (i, result, open) = handle.join().unwrap();
        assert!(result.is_success());
        assert_eq!(result.output_args(), &[json!(i)]);
        assert_eq!(open, 0);
    }
}

#[test]
fn test_operation_can_time_its_own_inner_work() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor
        .invoke(
            1_000,
            |_args: Vec<Value>| -> Result<OperationOutput, String> {
                let mut timer = ElapsedTimer::new();
                timer.start().map_err(|e| e.to_string())?;
                thread::sleep(Duration::from_millis(20));
                let inner = timer.stop().map_err(|e| e.to_string())?;
                Ok(OperationOutput::ok(vec![json!(inner.as_millis())]))
            },
            Vec::new(),
        )
        .unwrap();

    let inner_ms = result.output_args()[0].as_f64().unwrap();
    assert!(inner_ms >= 19.0);
    assert!(result.elapsed_ms() >= inner_ms);
}

#[test]
fn test_nested_invocation() {
    let mut executor = BoundedCallExecutor::new();

    let result = executor
        .invoke(
            1_000,
            |_args: Vec<Value>| -> Result<OperationOutput, String> {
                let mut inner = BoundedCallExecutor::new();
                let inner_result = inner
                    .invoke(20, sleeper(300, Vec::new()), Vec::new())
                    .map_err(|e| e.to_string())?;
                Ok(OperationOutput::new(
                    inner_result.status_code(),
                    vec![json!(inner_result.elapsed_ms())],
                ))
            },
            Vec::new(),
        )
        .unwrap();

    assert_eq!(result.status_code(), STATUS_TIMED_OUT);
    assert!(!result.timed_out());
    assert!(matches!(result.outcome(), Outcome::Completed { .. }));

    let inner_ms = result.output_args()[0].as_f64().unwrap();
    assert!(result.elapsed_ms() >= inner_ms);
}

#[test]
fn test_result_serializes_for_reporting() {
    let mut executor = BoundedCallExecutor::new();
    let result = executor
        .invoke(1_000, sleeper(1, vec![json!("done")]), Vec::new())
        .unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["operationName"], "sleep_1");
    assert_eq!(value["timeoutMs"], 1_000);
    assert_eq!(value["outcome"]["kind"], "completed");
    assert_eq!(value["outcome"]["status"], 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_status_passes_through(status in any::<i32>(), timeout_ms in 50u64..500) {
        let mut executor = BoundedCallExecutor::new();
        let result = executor
            .invoke(
                timeout_ms,
                move |_args: Vec<Value>| Ok::<_, OperationError>(OperationOutput::new(status, Vec::new())),
                Vec::new(),
            )
            .unwrap();

        prop_assert!(!result.timed_out());
        prop_assert_eq!(result.status_code(), status);
        prop_assert_eq!(result.outcome(), &Outcome::Completed { status, outputs: Vec::new() });
        prop_assert!(result.elapsed_ms() >= 0.0);
        prop_assert_eq!(executor.open_intervals(), 0);
    }
}
