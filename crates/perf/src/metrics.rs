//! Metrics collection for timed calls

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a timed call ended, as far as metrics are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeKind {
    /// The call finished within its deadline
    Completed,
    /// The deadline passed first
    TimedOut,
    /// The call raised an error
    Failed,
}

/// Samples and outcome counters for a single operation name.
#[derive(Debug, Clone, Default)]
struct OperationSamples {
    elapsed_ms: Vec<f64>,
    completed: u64,
    timed_out: u64,
    failed: u64,
}

/// Per-operation timing metrics.
///
/// Owned by whoever records into it; there is no process-wide instance.
#[derive(Debug, Clone)]
pub struct CallMetrics {
    /// Samples keyed by operation name
    operations: HashMap<String, OperationSamples>,
    /// Maximum samples to keep per operation (to prevent unbounded growth)
    max_samples: usize,
    /// Whether metrics collection is enabled
    enabled: bool,
}

impl CallMetrics {
    /// Create a new metrics collector with default settings.
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            max_samples: 1000,
            enabled: true,
        }
    }

    /// Set the maximum number of samples to keep per operation.
    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = max.max(1);
        self
    }

    /// Enable or disable metrics collection.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if metrics collection is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one finished call.
    pub fn record(&mut self, name: &str, elapsed_ms: f64, outcome: OutcomeKind) {
        if !self.enabled {
            return;
        }

        let samples = self.operations.entry(name.to_string()).or_default();

        if samples.elapsed_ms.len() >= self.max_samples {
            samples.elapsed_ms.remove(0);
        }
        samples.elapsed_ms.push(elapsed_ms);

        match outcome {
            OutcomeKind::Completed => samples.completed += 1,
            OutcomeKind::TimedOut => samples.timed_out += 1,
            OutcomeKind::Failed => samples.failed += 1,
        }

        tracing::trace!(
            target: "perf::calls",
            operation = name,
            elapsed_ms = elapsed_ms,
            outcome = ?outcome,
            "call recorded"
        );
    }

    /// Raw elapsed samples for an operation.
    pub fn samples(&self, name: &str) -> &[f64] {
        self.operations
            .get(name)
            .map(|s| s.elapsed_ms.as_slice())
            .unwrap_or(&[])
    }

    /// Get a summary of all collected metrics.
    pub fn summary(&self) -> MetricsSummary {
        let operations: HashMap<String, OperationSummary> = self
            .operations
            .iter()
            .map(|(name, samples)| {
                (
                    name.clone(),
                    OperationSummary {
                        timing: TimingStats::from_samples(&samples.elapsed_ms),
                        completed: samples.completed,
                        timed_out: samples.timed_out,
                        failed: samples.failed,
                    },
                )
            })
            .collect();

        MetricsSummary {
            total_calls: operations.values().map(OperationSummary::total).sum(),
            total_timeouts: operations.values().map(|o| o.timed_out).sum(),
            total_failures: operations.values().map(|o| o.failed).sum(),
            operations,
        }
    }

    /// Reset all collected metrics.
    pub fn reset(&mut self) {
        self.operations.clear();
    }
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of call metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Statistics for each operation
    pub operations: HashMap<String, OperationSummary>,
    /// Total number of calls recorded
    pub total_calls: u64,
    /// Total number of calls that timed out
    pub total_timeouts: u64,
    /// Total number of calls that failed
    pub total_failures: u64,
}

/// Outcome counts and timing for one operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    /// Elapsed time statistics over the retained samples
    pub timing: TimingStats,
    /// Calls that finished in time
    pub completed: u64,
    /// Calls that hit their deadline
    pub timed_out: u64,
    /// Calls that raised an error
    pub failed: u64,
}

impl OperationSummary {
    /// Total calls counted for this operation.
    pub fn total(&self) -> u64 {
        self.completed + self.timed_out + self.failed
    }
}

/// Statistical summary of timing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    /// Number of samples
    pub count: usize,
    /// Minimum time in milliseconds
    pub min_ms: f64,
    /// Maximum time in milliseconds
    pub max_ms: f64,
    /// Mean time in milliseconds
    pub mean_ms: f64,
    /// Median time in milliseconds
    pub median_ms: f64,
    /// 95th percentile in milliseconds
    pub p95_ms: f64,
    /// 99th percentile in milliseconds
    pub p99_ms: f64,
    /// Standard deviation in milliseconds
    pub std_dev_ms: f64,
    /// Total time in milliseconds
    pub total_ms: f64,
}

impl TimingStats {
    /// Calculate statistics from a slice of samples.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let mut sorted: Vec<f64> = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let min_ms = sorted[0];
        let max_ms = sorted[count - 1];
        let total_ms: f64 = samples.iter().sum();
        let mean_ms = total_ms / count as f64;

        let median_ms = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        let variance: f64 =
            samples.iter().map(|x| (x - mean_ms).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            min_ms,
            max_ms,
            mean_ms,
            median_ms,
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
            std_dev_ms: variance.sqrt(),
            total_ms,
        }
    }
}

/// Calculate a percentile from sorted samples.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] + fraction * (sorted[upper] - sorted[lower])
    }
}
