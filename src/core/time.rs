//! Simulation time tracking
//!
//! Both types advance only by the fixed step handed to `update`, never by
//! measured wall time.

/// Accumulated simulation time
#[derive(Debug, Clone, Default)]
pub struct Time {
    delta_seconds: f32,
    elapsed: f64,
    ticks: u64,
}

impl Time {
    /// Create a new time tracker at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one simulation step
    pub fn advance(&mut self, delta_seconds: f32) {
        self.delta_seconds = delta_seconds;
        self.elapsed += f64::from(delta_seconds);
        self.ticks += 1;
    }

    /// Step size of the last update
    pub fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }

    /// Sum of all steps so far
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Number of steps so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Countdown driven by simulation steps
#[derive(Debug, Clone)]
pub struct Timer {
    duration: f32,
    elapsed: f32,
    repeating: bool,
    finished: bool,
}

impl Timer {
    /// Timer that fires once after `seconds`
    pub fn once(seconds: f32) -> Self {
        Self {
            duration: seconds.max(0.0),
            elapsed: 0.0,
            repeating: false,
            finished: false,
        }
    }

    /// Timer that fires every `seconds`
    pub fn repeating(seconds: f32) -> Self {
        Self {
            repeating: true,
            ..Self::once(seconds)
        }
    }

    /// Advance by one step; returns true if the timer fired during it
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        if self.finished {
            return false;
        }

        self.elapsed += delta_seconds;
        if self.elapsed < self.duration {
            return false;
        }

        if self.repeating && self.duration > 0.0 {
            // Keep the overshoot so the period does not drift.
            self.elapsed %= self.duration;
        } else {
            self.elapsed = self.duration;
            self.finished = true;
        }
        true
    }

    /// Whether a one-shot timer has fired
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Seconds until the next firing
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Restart the countdown
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.finished = false;
    }
}
