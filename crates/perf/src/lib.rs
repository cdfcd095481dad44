//! Elapsed Time Measurement
//!
//! This crate provides timing infrastructure for instrumenting calls:
//! - A pluggable monotonic [`Clock`] with tick counter and frequency
//! - [`ElapsedTimer`], a reentrant stack of start/stop intervals
//! - [`Elapsed`] durations tagged with a [`TimeUnit`]
//! - Per-operation call metrics with statistical summaries
//!
//! # Example
//!
//! ```rust
//! use perf::{ElapsedTimer, TimeUnit};
//!
//! let mut timer = ElapsedTimer::new().with_unit(TimeUnit::Microseconds);
//! let guard = timer.scoped().unwrap();
//! // ... timed work ...
//! let elapsed = guard.finish().unwrap();
//! assert_eq!(elapsed.unit(), TimeUnit::Microseconds);
//! ```

mod clock;
mod elapsed;
mod error;
mod metrics;
mod timing;

pub use clock::{Clock, ManualClock, MonotonicClock, NANOS_PER_SECOND};
pub use elapsed::{Elapsed, TimeUnit};
pub use error::{TimerError, TimerResult};
pub use metrics::{CallMetrics, MetricsSummary, OperationSummary, OutcomeKind, TimingStats};
pub use timing::{ElapsedTimer, Interval, IntervalGuard};
