//! Windowed host backed by winit
//!
//! The scheduler owns the thread, so instead of handing control to
//! `EventLoop::run_app` this host pumps the event loop once per update step.
//!
//! This host draws nothing. Putting pixels on the surface is the job of
//! whatever renderer the application brings, which can reach the window
//! through [`WindowHost::window`]. `render` only feeds the frame statistics.

use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

use crate::core::{BoxError, FrameStats, Host, Time, Timer, WindowConfig};

/// How many pumps `init` waits for the platform to deliver `resumed`
const MAX_INIT_PUMPS: u32 = 16;

/// Host that owns one OS window
pub struct WindowHost {
    event_loop: Option<EventLoop<()>>,
    state: WindowState,
}

/// Everything the event loop callbacks touch
struct WindowState {
    config: WindowConfig,
    window: Option<Window>,
    window_error: Option<String>,
    status: WindowStatus,
    time: Time,
    frame_stats: FrameStats,
    title_timer: Timer,
}

/// Liveness and input flags, independent of any live window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WindowStatus {
    opened: bool,
    close_requested: bool,
    show_stats: bool,
}

impl WindowStatus {
    fn is_alive(&self) -> bool {
        self.opened && !self.close_requested
    }

    fn on_opened(&mut self) {
        self.opened = true;
    }

    fn on_closed(&mut self) {
        self.opened = false;
    }

    fn on_close_requested(&mut self) {
        self.close_requested = true;
    }

    /// React to a key press; `repeat` is set for auto-repeated presses
    fn on_key(&mut self, key: KeyCode, repeat: bool) {
        match key {
            KeyCode::Escape => {
                log::info!("Escape pressed, shutting down");
                self.close_requested = true;
            }
            KeyCode::F3 if !repeat => {
                self.show_stats = !self.show_stats;
            }
            _ => {}
        }
    }
}

/// Window title, with the cadence and simulation clock appended when shown
fn compose_title(base: &str, show_stats: bool, stats: &FrameStats, time: &Time) -> String {
    if !show_stats {
        return base.to_string();
    }
    format!(
        "{base} | {} | sim: {:.1}s ({} steps)",
        stats.format_stats(),
        time.elapsed_seconds(),
        time.ticks()
    )
}

impl WindowHost {
    /// Create a host; the window itself is opened by [`Host::init`]
    pub fn new(config: WindowConfig) -> Self {
        Self {
            event_loop: None,
            state: WindowState {
                config,
                window: None,
                window_error: None,
                status: WindowStatus::default(),
                time: Time::new(),
                frame_stats: FrameStats::new(),
                title_timer: Timer::repeating(1.0),
            },
        }
    }

    /// Simulation time accumulated from fixed steps
    pub fn time(&self) -> &Time {
        &self.state.time
    }

    /// Render cadence so far
    pub fn frame_stats(&self) -> &FrameStats {
        &self.state.frame_stats
    }

    /// Get the window, if open
    pub fn window(&self) -> Option<&Window> {
        self.state.window.as_ref()
    }

    /// Ask the window to close at the next liveness check
    pub fn request_close(&mut self) {
        self.state.status.on_close_requested();
    }

    fn pump(&mut self) -> Result<(), BoxError> {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return Err("window event loop is not running".into());
        };

        let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::info!("Window event loop exited with code {code}");
            self.state.status.on_close_requested();
        }

        match self.state.window_error.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn refresh_title(&self) {
        let Some(window) = &self.state.window else {
            return;
        };
        window.set_title(&compose_title(
            &self.state.config.title,
            self.state.status.show_stats,
            &self.state.frame_stats,
            &self.state.time,
        ));
    }
}

impl Host for WindowHost {
    fn init(&mut self) -> Result<(), BoxError> {
        self.event_loop = Some(EventLoop::new()?);

        for _ in 0..MAX_INIT_PUMPS {
            self.pump()?;
            if self.state.window.is_some() {
                log::info!(
                    "Window '{}' opened ({}x{})",
                    self.state.config.title,
                    self.state.config.width,
                    self.state.config.height
                );
                return Ok(());
            }
        }

        Err("platform never resumed the window event loop".into())
    }

    fn deinit(&mut self) -> Result<(), BoxError> {
        self.state.window = None;
        self.state.status.on_closed();
        self.event_loop = None;
        log::info!(
            "Window closed after {:.2}s of simulation, {}",
            self.state.time.elapsed_seconds(),
            self.state.frame_stats.format_stats()
        );
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.state.status.is_alive()
    }

    fn poll_events(&mut self) -> Result<(), BoxError> {
        self.pump()
    }

    fn update(&mut self, delta_seconds: f32) -> Result<(), BoxError> {
        self.state.time.advance(delta_seconds);
        self.state.frame_stats.record_update();
        if self.state.title_timer.tick(delta_seconds) {
            self.refresh_title();
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), BoxError> {
        self.state.frame_stats.record_render();
        Ok(())
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                self.window = Some(window);
                self.status.on_opened();
            }
            Err(e) => self.window_error = Some(format!("failed to create window: {e}")),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.status.on_close_requested();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.status.on_key(key, event.repeat);
                }
            }

            _ => {}
        }
    }
}
