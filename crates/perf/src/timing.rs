//! Reentrant interval timing.
//!
//! [`ElapsedTimer`] keeps an explicit stack of open [`Interval`]s, so a region
//! being timed can itself time an inner region:
//!
//! ```rust
//! use perf::ElapsedTimer;
//!
//! let mut timer = ElapsedTimer::new();
//! timer.start().unwrap();      // outer
//! timer.start().unwrap();      // inner
//! let inner = timer.stop().unwrap();
//! let outer = timer.stop().unwrap();
//! assert!(outer.value() >= inner.value());
//! assert_eq!(timer.count(), 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, MonotonicClock};
use crate::elapsed::{Elapsed, TimeUnit};
use crate::error::{TimerError, TimerResult};

/// One start/stop span.
///
/// Open while it sits on a timer's stack; closed once popped by `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    start_ticks: u64,
    end_ticks: Option<u64>,
    frequency_hz: Option<u64>,
}

impl Interval {
    fn open(start_ticks: u64) -> Self {
        Self {
            start_ticks,
            end_ticks: None,
            frequency_hz: None,
        }
    }

    fn close(self, end_ticks: u64, frequency_hz: u64) -> Self {
        Self {
            end_ticks: Some(end_ticks),
            frequency_hz: Some(frequency_hz),
            ..self
        }
    }

    /// Counter reading taken at start.
    pub fn start_ticks(&self) -> u64 {
        self.start_ticks
    }

    /// Counter reading taken at stop, if closed.
    pub fn end_ticks(&self) -> Option<u64> {
        self.end_ticks
    }

    /// Clock frequency read at stop, if closed.
    pub fn frequency_hz(&self) -> Option<u64> {
        self.frequency_hz
    }

    /// Whether the interval has been stopped.
    pub fn is_closed(&self) -> bool {
        self.end_ticks.is_some()
    }

    /// Length of a closed interval in seconds.
    pub fn seconds(&self) -> Option<f64> {
        let end = self.end_ticks?;
        let hz = self.frequency_hz?;
        Some(ticks_to_seconds(self.start_ticks, end, hz))
    }

    /// Length of a closed interval in the given unit.
    pub fn elapsed(&self, unit: TimeUnit) -> Option<Elapsed> {
        self.seconds().map(|s| Elapsed::from_secs_f64(s, unit))
    }
}

fn ticks_to_seconds(start: u64, end: u64, frequency_hz: u64) -> f64 {
    end.saturating_sub(start) as f64 / frequency_hz as f64
}

/// Stack-based elapsed time measurement.
///
/// Every `start` pushes an interval and every `stop` pops the most recent
/// one. The timer is meant to be owned by a single call site; both methods
/// take `&mut self`, so threads that need independent timing each own a
/// timer.
#[derive(Debug)]
pub struct ElapsedTimer<C: Clock = MonotonicClock> {
    clock: C,
    intervals: Vec<Interval>,
    unit: TimeUnit,
}

impl ElapsedTimer<MonotonicClock> {
    /// Create a timer on the monotonic clock, reporting milliseconds.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for ElapsedTimer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ElapsedTimer<C> {
    /// Create a timer reading from the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            intervals: Vec::new(),
            unit: TimeUnit::Milliseconds,
        }
    }

    /// Set the unit returned by [`ElapsedTimer::stop`].
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Unit returned by [`ElapsedTimer::stop`].
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// The underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Open a new interval.
    ///
    /// Fails with [`TimerError::ClockUnavailable`] if the counter cannot be
    /// read; nothing is pushed in that case.
    pub fn start(&mut self) -> TimerResult<()> {
        let ticks = self.clock.ticks()?;
        self.intervals.push(Interval::open(ticks));
        Ok(())
    }

    /// Close the most recently opened interval and return its length.
    pub fn stop(&mut self) -> TimerResult<Elapsed> {
        let interval = self.stop_interval()?;
        let seconds = interval.seconds().unwrap_or_default();
        Ok(Elapsed::from_secs_f64(seconds, self.unit))
    }

    /// Close the most recently opened interval and return the raw record.
    ///
    /// An empty stack is reported as [`TimerError::UnbalancedStop`] and leaves
    /// the timer untouched. If the clock fails after the interval is popped,
    /// the interval is still consumed so starts and stops stay paired.
    pub fn stop_interval(&mut self) -> TimerResult<Interval> {
        let Some(interval) = self.intervals.pop() else {
            tracing::warn!(target: "perf", "stop called with no open interval");
            return Err(TimerError::UnbalancedStop);
        };

        let end_ticks = self.clock.ticks()?;
        let frequency_hz = self.clock.frequency_hz()?;
        let closed = interval.close(end_ticks, frequency_hz);

        tracing::trace!(
            target: "perf",
            depth = self.intervals.len(),
            ticks = end_ticks.saturating_sub(closed.start_ticks),
            frequency_hz = frequency_hz,
            "interval closed"
        );

        Ok(closed)
    }

    /// Number of currently open intervals.
    pub fn count(&self) -> usize {
        self.intervals.len()
    }

    /// Whether no interval is open.
    pub fn is_idle(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Running length of the innermost open interval, without closing it.
    pub fn peek_elapsed(&self) -> TimerResult<Option<Elapsed>> {
        let Some(interval) = self.intervals.last() else {
            return Ok(None);
        };
        let now = self.clock.ticks()?;
        let hz = self.clock.frequency_hz()?;
        let seconds = ticks_to_seconds(interval.start_ticks, now, hz);
        Ok(Some(Elapsed::from_secs_f64(seconds, self.unit)))
    }

    /// Open an interval that is closed when the returned guard is finished
    /// or dropped.
    pub fn scoped(&mut self) -> TimerResult<IntervalGuard<'_, C>> {
        self.start()?;
        Ok(IntervalGuard {
            timer: self,
            finished: false,
        })
    }
}

/// RAII guard that closes its interval exactly once.
///
/// Call [`IntervalGuard::finish`] to get the measured duration. If the guard
/// is dropped instead (early return, unwinding), the interval is closed and
/// the measurement discarded.
pub struct IntervalGuard<'a, C: Clock = MonotonicClock> {
    timer: &'a mut ElapsedTimer<C>,
    finished: bool,
}

impl<'a, C: Clock> IntervalGuard<'a, C> {
    /// Access the timer to time nested regions inside this one.
    pub fn timer(&mut self) -> &mut ElapsedTimer<C> {
        &mut *self.timer
    }

    /// Close the interval and return its length.
    pub fn finish(mut self) -> TimerResult<Elapsed> {
        self.finished = true;
        self.timer.stop()
    }
}

impl<'a, C: Clock> Drop for IntervalGuard<'a, C> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.timer.stop() {
            tracing::warn!(target: "perf", error = %err, "failed to close dropped interval");
        }
    }
}
