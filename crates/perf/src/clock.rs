//! Monotonic tick sources for interval timing.
//!
//! A [`Clock`] exposes a raw tick counter plus the number of ticks per second.
//! [`MonotonicClock`] is the production source; [`ManualClock`] is advanced by
//! hand and is meant for tests that need exact durations or a failing clock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::error::{TimerError, TimerResult};

/// Ticks per second reported by [`MonotonicClock`].
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Process-wide reference point for [`MonotonicClock`] tick readings.
static CLOCK_ANCHOR: OnceLock<Instant> = OnceLock::new();

/// A monotonic high-resolution counter.
pub trait Clock {
    /// Read the current counter value.
    fn ticks(&self) -> TimerResult<u64>;

    /// Number of ticks per second.
    fn frequency_hz(&self) -> TimerResult<u64>;
}

/// Clock backed by [`std::time::Instant`], counting nanoseconds since the
/// first reading taken in this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Create a new monotonic clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn ticks(&self) -> TimerResult<u64> {
        let anchor = CLOCK_ANCHOR.get_or_init(Instant::now);
        let nanos = anchor.elapsed().as_nanos();
        u64::try_from(nanos)
            .map_err(|_| TimerError::clock_unavailable("monotonic counter overflowed u64"))
    }

    fn frequency_hz(&self) -> TimerResult<u64> {
        Ok(NANOS_PER_SECOND)
    }
}

#[derive(Debug)]
struct ManualClockState {
    ticks: AtomicU64,
    frequency_hz: AtomicU64,
    available: AtomicBool,
}

/// A clock that only moves when told to.
///
/// Clones share the same counter, so a test can keep one handle and give
/// another to the timer under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<ManualClockState>,
}

impl ManualClock {
    /// Create a manual clock at tick 0 with the given frequency.
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            state: Arc::new(ManualClockState {
                ticks: AtomicU64::new(0),
                frequency_hz: AtomicU64::new(frequency_hz),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Create a manual clock ticking in nanoseconds.
    pub fn nanos() -> Self {
        Self::new(NANOS_PER_SECOND)
    }

    /// Move the counter forward.
    pub fn advance(&self, ticks: u64) {
        self.state.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Set the counter to an absolute value.
    pub fn set_ticks(&self, ticks: u64) {
        self.state.ticks.store(ticks, Ordering::SeqCst);
    }

    /// Change the reported frequency.
    pub fn set_frequency(&self, frequency_hz: u64) {
        self.state.frequency_hz.store(frequency_hz, Ordering::SeqCst);
    }

    /// Make every subsequent reading succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> TimerResult<()> {
        if self.state.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TimerError::clock_unavailable("manual clock disabled"))
        }
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> TimerResult<u64> {
        self.check_available()?;
        Ok(self.state.ticks.load(Ordering::SeqCst))
    }

    fn frequency_hz(&self) -> TimerResult<u64> {
        self.check_available()?;
        match self.state.frequency_hz.load(Ordering::SeqCst) {
            0 => Err(TimerError::clock_unavailable("clock reported zero frequency")),
            hz => Ok(hz),
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn ticks(&self) -> TimerResult<u64> {
        (**self).ticks()
    }

    fn frequency_hz(&self) -> TimerResult<u64> {
        (**self).frequency_hz()
    }
}
