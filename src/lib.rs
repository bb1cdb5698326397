//! A fixed-timestep game loop driver
//!
//! This crate provides:
//! - A frame scheduler that decouples simulation steps from wall-clock time
//!   and rendering cost
//! - `Host` and `Application` lifecycle contracts the scheduler drives
//! - An injectable clock, so loops can run on synthetic time
//! - Headless and winit-backed hosts

pub mod core;
pub mod platform;

// Re-exports for convenience
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{
        Application, BoxError, Clock, EngineConfig, FrameScheduler, Host, LoopConfig, LoopStats,
        ManualClock, StepOutcome, SystemClock, Time, Timer, WindowConfig,
    };
    pub use crate::platform::HeadlessHost;
    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    pub use crate::platform::WindowHost;
}
