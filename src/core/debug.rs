//! Debug and statistics module

use std::collections::VecDeque;
use std::time::Duration;

/// Counters maintained by the frame scheduler over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Simulation steps executed
    pub updates: u64,
    /// Frames rendered
    pub renders: u64,
    /// Renders issued only because the skip budget ran out
    pub forced_renders: u64,
    /// Times the deadline was resynchronized after a stall
    pub resyncs: u64,
    /// Pacing sleeps taken
    pub sleeps: u64,
    /// Total time spent in pacing sleeps
    pub slept: Duration,
}

impl LoopStats {
    /// Update steps whose render was deferred
    pub fn skipped_renders(&self) -> u64 {
        self.updates.saturating_sub(self.renders)
    }

    /// Get a formatted one-line summary
    pub fn summary(&self) -> String {
        format!(
            "updates: {} | renders: {} (forced: {}) | resyncs: {} | slept: {:.3}s in {} sleeps",
            self.updates,
            self.renders,
            self.forced_renders,
            self.resyncs,
            self.slept.as_secs_f64(),
            self.sleeps
        )
    }
}

/// Render cadence measured in simulation steps
///
/// Hosts call [`FrameStats::record_update`] for every fixed step and
/// [`FrameStats::record_render`] for every frame, so the numbers describe how
/// the scheduler interleaves the two rather than how long anything took.
/// A steady loop renders once per step; a loop that keeps skipping renders
/// shows more steps per frame, bounded by the skip budget plus one.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Steps between consecutive renders, most recent last
    gaps: VecDeque<u32>,
    /// Maximum gaps to keep
    max_samples: usize,
    steps_since_render: u32,
    longest_gap: u32,
    steps: u64,
    frames: u64,
}

impl FrameStats {
    /// Create a tracker averaging over the last 120 frames
    pub fn new() -> Self {
        Self::with_window(120)
    }

    /// Create a tracker averaging over the last `frames` frames
    pub fn with_window(frames: usize) -> Self {
        let max_samples = frames.max(1);
        Self {
            gaps: VecDeque::with_capacity(max_samples),
            max_samples,
            steps_since_render: 0,
            longest_gap: 0,
            steps: 0,
            frames: 0,
        }
    }

    /// Count one simulation step
    pub fn record_update(&mut self) {
        self.steps += 1;
        self.steps_since_render += 1;
    }

    /// Count one rendered frame, closing the current gap
    pub fn record_render(&mut self) {
        self.frames += 1;

        if self.gaps.len() >= self.max_samples {
            self.gaps.pop_front();
        }
        self.gaps.push_back(self.steps_since_render);
        self.longest_gap = self.longest_gap.max(self.steps_since_render);
        self.steps_since_render = 0;
    }

    /// Total simulation steps seen
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Total frames rendered
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Steps taken since the last frame
    pub fn steps_since_render(&self) -> u32 {
        self.steps_since_render
    }

    /// Most steps ever run between two frames
    pub fn longest_gap(&self) -> u32 {
        self.longest_gap
    }

    /// Average steps per frame over the recent window, 0 before any frame
    pub fn avg_steps_per_frame(&self) -> f32 {
        if self.gaps.is_empty() {
            return 0.0;
        }
        let total: u32 = self.gaps.iter().sum();
        total as f32 / self.gaps.len() as f32
    }

    /// Frames per simulated second for a given step size
    pub fn frames_per_sim_second(&self, step_seconds: f32) -> f32 {
        let per_frame = self.avg_steps_per_frame() * step_seconds;
        if per_frame > 0.0 { 1.0 / per_frame } else { 0.0 }
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "frames: {} | steps/frame: {:.2} (worst: {})",
            self.frames,
            self.avg_steps_per_frame(),
            self.longest_gap
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}
