//! Core loop module
//!
//! Contains the frame scheduler, its lifecycle contracts, and configuration

mod clock;
mod config;
mod debug;
mod scheduler;
mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig, LoopConfig, WindowConfig};
pub use debug::{FrameStats, LoopStats};
pub use scheduler::{Application, BoxError, FrameScheduler, Host, StepOutcome};
pub use time::{Time, Timer};
