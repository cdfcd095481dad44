//! Executor configuration.

use perf::TimeUnit;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::BoundedCallExecutor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    /// Deadline used by `invoke_default`, in milliseconds
    pub default_timeout_ms: u64,
    /// Prefix for worker thread names (`{prefix}-{operation}`)
    pub worker_name_prefix: String,
    /// Unit of the elapsed time reported in results
    pub elapsed_unit: TimeUnit,
    /// Completed calls slower than this are logged at warn level
    pub slow_call_warn_ms: Option<u64>,
    /// Maximum elapsed samples kept per operation
    pub max_metric_samples: usize,
    /// Whether to record call metrics
    pub collect_metrics: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            worker_name_prefix: "bounded-call".to_string(),
            elapsed_unit: TimeUnit::Milliseconds,
            slow_call_warn_ms: None,
            max_metric_samples: 1000,
            collect_metrics: true,
        }
    }
}

impl ExecutorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the default deadline.
    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_worker_name_prefix(mut self, prefix: &str) -> Self {
        self.worker_name_prefix = prefix.to_string();
        self
    }

    /// Set the unit of reported elapsed time.
    pub fn with_elapsed_unit(mut self, unit: TimeUnit) -> Self {
        self.elapsed_unit = unit;
        self
    }

    /// Warn about completed calls slower than the threshold.
    pub fn with_slow_call_warn_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_call_warn_ms = Some(threshold_ms);
        self
    }

    /// Set the maximum elapsed samples kept per operation.
    pub fn with_max_metric_samples(mut self, count: usize) -> Self {
        self.max_metric_samples = count;
        self
    }

    /// Enable or disable call metrics.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.collect_metrics = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.worker_name_prefix, "bounded-call");
        assert_eq!(config.elapsed_unit, TimeUnit::Milliseconds);
        assert!(config.collect_metrics);
    }

    #[test]
    fn test_builder() {
        let config = ExecutorConfig::new()
            .with_default_timeout_ms(250)
            .with_worker_name_prefix("runner")
            .with_elapsed_unit(TimeUnit::Microseconds)
            .with_slow_call_warn_ms(100)
            .with_max_metric_samples(10)
            .with_metrics(false);

        assert_eq!(config.default_timeout_ms, 250);
        assert_eq!(config.worker_name_prefix, "runner");
        assert_eq!(config.elapsed_unit, TimeUnit::Microseconds);
        assert_eq!(config.slow_call_warn_ms, Some(100));
        assert_eq!(config.max_metric_samples, 10);
        assert!(!config.collect_metrics);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ExecutorConfig::from_json(r#"{"defaultTimeoutMs": 500, "elapsedUnit": "seconds"}"#)
                .unwrap();

        assert_eq!(config.default_timeout_ms, 500);
        assert_eq!(config.elapsed_unit, TimeUnit::Seconds);
        assert_eq!(config.worker_name_prefix, "bounded-call");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(ExecutorConfig::from_json("{not json").is_err());
    }
}
