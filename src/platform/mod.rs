//! Concrete hosts
//!
//! A headless host for batch runs and tests, and a winit window host on the
//! desktop platforms that support pumping the event loop.

mod headless;
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
mod window;

pub use headless::HeadlessHost;
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub use window::WindowHost;
