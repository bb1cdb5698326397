//! Wall-clock sampling
//!
//! The scheduler never queries the OS directly; it reads time and sleeps
//! through a [`Clock`] so that tests can drive it with synthetic time.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Source of elapsed time and the loop's only way to suspend
pub trait Clock {
    /// Seconds elapsed since the clock's own origin
    fn now(&self) -> f64;

    /// Suspend the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Monotonic clock backed by [`Instant`] and [`thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Synthetic clock for deterministic runs
///
/// Clones share the same reading, so a test can hold one handle while the
/// scheduler owns another. Sleeping advances the reading by the slept
/// duration instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
    slept: Rc<Cell<Duration>>,
    sleeps: Rc<Cell<u64>>,
    /// Added after every read
    auto_advance: f64,
}

impl ManualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every [`Clock::now`] call move time forward by `seconds`
    ///
    /// Without it a loop waiting out a sub-millisecond remainder would spin
    /// forever, since nothing else moves synthetic time.
    pub fn with_auto_advance(mut self, seconds: f64) -> Self {
        self.auto_advance = seconds;
        self
    }

    /// Jump to an absolute reading. Moving backwards is allowed.
    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    /// Move the reading forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    /// Total time spent in [`Clock::sleep`]
    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }

    /// Number of [`Clock::sleep`] calls
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        let reading = self.now.get();
        if self.auto_advance > 0.0 {
            self.now.set(reading + self.auto_advance);
        }
        reading
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration.as_secs_f64());
        self.slept.set(self.slept.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}
