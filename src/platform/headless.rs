//! Host without a window
//!
//! Keeps the engine-side bookkeeping (simulation time, frame stats) and stays
//! alive until closed or until an optional budget is spent. Useful for batch
//! simulation and for exercising applications in tests.

use crate::core::{BoxError, FrameStats, Host, Time};

/// Host that never opens a window
#[derive(Debug, Default)]
pub struct HeadlessHost {
    time: Time,
    frame_stats: FrameStats,
    max_updates: Option<u64>,
    max_seconds: Option<f64>,
    closed: bool,
    initialized: bool,
}

impl HeadlessHost {
    /// Create a host that stays alive until [`HeadlessHost::close`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after this many simulation steps
    pub fn with_max_updates(mut self, updates: u64) -> Self {
        self.max_updates = Some(updates);
        self
    }

    /// Stop once this much simulation time has elapsed
    ///
    /// A NaN or negative limit counts as already spent, so the loop ends
    /// before the first step instead of never. An infinite limit never runs
    /// out.
    pub fn with_max_seconds(mut self, seconds: f64) -> Self {
        let seconds = if seconds.is_nan() || seconds < 0.0 {
            log::warn!("Invalid simulation budget {seconds}s, nothing will run");
            0.0
        } else {
            seconds
        };
        self.max_seconds = Some(seconds);
        self
    }

    /// Request the loop to end at the next liveness check
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Simulation time accumulated from fixed steps
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Render cadence so far
    pub fn frame_stats(&self) -> &FrameStats {
        &self.frame_stats
    }

    /// Frames rendered so far
    pub fn renders(&self) -> u64 {
        self.frame_stats.frames()
    }

    fn budget_spent(&self) -> bool {
        let updates_spent = self
            .max_updates
            .is_some_and(|limit| self.time.ticks() >= limit);
        let seconds_spent = self
            .max_seconds
            .is_some_and(|limit| self.time.elapsed_seconds() >= limit);
        updates_spent || seconds_spent
    }
}

impl Host for HeadlessHost {
    fn init(&mut self) -> Result<(), BoxError> {
        log::info!("Headless host started");
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), BoxError> {
        log::info!(
            "Headless host stopped after {:.2}s of simulation, {}",
            self.time.elapsed_seconds(),
            self.frame_stats.format_stats()
        );
        self.initialized = false;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.initialized && !self.closed && !self.budget_spent()
    }

    fn update(&mut self, delta_seconds: f32) -> Result<(), BoxError> {
        self.time.advance(delta_seconds);
        self.frame_stats.record_update();
        Ok(())
    }

    fn render(&mut self) -> Result<(), BoxError> {
        self.frame_stats.record_render();
        Ok(())
    }
}
