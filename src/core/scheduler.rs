//! Fixed-timestep frame scheduler and the lifecycle contracts it drives
//!
//! The scheduler advances simulation in constant steps of `1 / target_fps`
//! seconds, renders when the simulation has caught up with the clock (or when
//! too many renders were skipped in a row), and sleeps otherwise.
//!
//! # Example
//!
//! ```ignore
//! let host = HeadlessHost::new().with_max_updates(120);
//! let mut scheduler = FrameScheduler::new(LoopConfig::default(), host)?;
//! scheduler.run(&mut my_app)?;
//! ```

use std::time::Duration;

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{ConfigError, LoopConfig};
use crate::core::debug::LoopStats;

/// Error type returned by lifecycle hooks and by [`FrameScheduler::run`]
pub type BoxError = Box<dyn std::error::Error>;

/// Engine-level services the scheduler runs inside of
///
/// A host owns whatever must exist before the application starts (a window,
/// an audio device) and performs per-frame housekeeping.
pub trait Host {
    /// Called once, before the application is initialized
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once, after the application is torn down
    fn deinit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Polled once per loop iteration; the loop ends when this returns false
    fn is_alive(&self) -> bool;

    /// Drain pending window and input events
    fn poll_events(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Engine housekeeping for one fixed step
    fn update(&mut self, _delta_seconds: f32) -> Result<(), BoxError> {
        Ok(())
    }

    /// Produce one visible frame
    fn render(&mut self) -> Result<(), BoxError>;
}

/// The thing being run
pub trait Application {
    /// Called once, after the host is initialized
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Advance the simulation by exactly `delta_seconds`
    fn update(&mut self, delta_seconds: f32) -> Result<(), BoxError>;

    /// Called once, after the loop ends
    fn deinit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// What a single loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A simulation step ran, optionally followed by a render
    Updated {
        /// Whether the host rendered after the step
        rendered: bool,
    },
    /// No step was due; the thread slept until the deadline
    Slept(Duration),
    /// No step was due, but the deadline is less than a millisecond away
    Pending,
}

/// Drives a [`Host`] and an [`Application`] at a fixed update rate
pub struct FrameScheduler<H: Host, C: Clock = SystemClock> {
    config: LoopConfig,
    host: H,
    clock: C,
    delta_seconds: f64,
    /// Clock reading captured by `start`
    initial_time: f64,
    /// Deadline of the next update, relative to `initial_time`
    next_time: f64,
    skipped_frames: u32,
    stats: LoopStats,
}

impl<H: Host> FrameScheduler<H> {
    /// Create a scheduler paced by the system clock
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails [`LoopConfig::validate`]
    pub fn new(config: LoopConfig, host: H) -> Result<Self, ConfigError> {
        Self::with_clock(config, host, SystemClock::new())
    }
}

impl<H: Host, C: Clock> FrameScheduler<H, C> {
    /// Create a scheduler paced by the given clock
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails [`LoopConfig::validate`]
    pub fn with_clock(config: LoopConfig, host: H, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let delta_seconds = config.delta_seconds();
        Ok(Self {
            config,
            host,
            clock,
            delta_seconds,
            initial_time: 0.0,
            next_time: 0.0,
            skipped_frames: 1,
            stats: LoopStats::default(),
        })
    }

    /// Run until the host stops being alive
    ///
    /// Initializes the host then the application, loops, and tears them down
    /// in reverse order. A failing hook aborts the run immediately and its
    /// error is returned as is; nothing is torn down after a failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any host or application hook
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), BoxError> {
        self.host.init()?;
        app.init()?;

        self.start();
        log::info!(
            "Frame loop started: {} updates/s, drift bound {:.2}s, up to {} skipped renders",
            self.config.target_fps,
            self.config.max_time_drift,
            self.config.max_skipped_frames
        );

        while self.host.is_alive() {
            self.step(app)?;
        }

        log::info!("Frame loop stopped: {}", self.stats.summary());

        app.deinit()?;
        self.host.deinit()?;
        Ok(())
    }

    /// Reset the clock state for a new run
    pub fn start(&mut self) {
        self.initial_time = self.clock.now();
        self.next_time = 0.0;
        self.skipped_frames = 1;
        self.stats = LoopStats::default();
    }

    /// Execute one loop iteration
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a host or application hook
    pub fn step<A: Application>(&mut self, app: &mut A) -> Result<StepOutcome, BoxError> {
        let curr_time = self.clock.now() - self.initial_time;

        if curr_time - self.next_time > self.config.max_time_drift {
            log::warn!(
                "Clock is {:.3}s ahead of the simulation, dropping catch-up steps",
                curr_time - self.next_time
            );
            self.next_time = curr_time;
            self.stats.resyncs += 1;
        }

        if curr_time < self.next_time {
            return Ok(self.wait_for_deadline(curr_time));
        }

        self.next_time += self.delta_seconds;

        let delta_seconds = self.delta_seconds as f32;
        self.host.poll_events()?;
        self.host.update(delta_seconds)?;
        app.update(delta_seconds)?;
        self.stats.updates += 1;

        let caught_up = curr_time < self.next_time;
        let budget_exhausted = self.skipped_frames > self.config.max_skipped_frames;

        if caught_up || budget_exhausted {
            self.host.render()?;
            self.stats.renders += 1;
            if !caught_up {
                log::debug!(
                    "Forcing a render after {} skipped frames",
                    self.skipped_frames - 1
                );
                self.stats.forced_renders += 1;
            }
            self.skipped_frames = 1;
            Ok(StepOutcome::Updated { rendered: true })
        } else {
            self.skipped_frames = self.skipped_frames.saturating_add(1);
            Ok(StepOutcome::Updated { rendered: false })
        }
    }

    fn wait_for_deadline(&mut self, curr_time: f64) -> StepOutcome {
        // Whole milliseconds, truncated; sub-millisecond waits spin instead.
        let sleep_ms = (1000.0 * (self.next_time - curr_time)) as u64;
        if sleep_ms == 0 {
            return StepOutcome::Pending;
        }

        let duration = Duration::from_millis(sleep_ms);
        log::trace!("Sleeping {sleep_ms}ms until the next update");
        self.clock.sleep(duration);
        self.stats.sleeps += 1;
        self.stats.slept += duration;
        StepOutcome::Slept(duration)
    }

    /// Deadline of the next update, in seconds since `start`
    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    /// Consecutive update steps since the last render, plus one
    pub fn skipped_frames(&self) -> u32 {
        self.skipped_frames
    }

    /// Fixed simulation step in seconds
    pub fn delta_seconds(&self) -> f64 {
        self.delta_seconds
    }

    /// Tunables this scheduler was built with
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Counters for the current or last run
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Get the host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Get the host mutably
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Get the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Give back the host
    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::core::clock::ManualClock;

    const DT: f64 = 1.0 / 60.0;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    /// Host that stays alive for a fixed number of iterations and moves the
    /// clock forward between them
    struct FakeHost {
        log: CallLog,
        clock: ManualClock,
        alive_checks: Cell<u32>,
        iterations: u32,
        advance_per_iteration: f64,
        fail_init: bool,
    }

    impl FakeHost {
        fn new(log: &CallLog, clock: &ManualClock, iterations: u32) -> Self {
            Self {
                log: Rc::clone(log),
                clock: clock.clone(),
                alive_checks: Cell::new(0),
                iterations,
                advance_per_iteration: 0.0,
                fail_init: false,
            }
        }
    }

    impl Host for FakeHost {
        fn init(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("host.init");
            if self.fail_init {
                return Err("no display".into());
            }
            Ok(())
        }

        fn deinit(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("host.deinit");
            Ok(())
        }

        fn is_alive(&self) -> bool {
            let checks = self.alive_checks.get();
            self.alive_checks.set(checks + 1);
            if checks > 0 {
                self.clock.advance(self.advance_per_iteration);
            }
            checks < self.iterations
        }

        fn poll_events(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("host.poll");
            Ok(())
        }

        fn update(&mut self, _delta_seconds: f32) -> Result<(), BoxError> {
            self.log.borrow_mut().push("host.update");
            Ok(())
        }

        fn render(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("host.render");
            Ok(())
        }
    }

    /// Application whose update may burn synthetic wall time
    struct FakeApp {
        log: CallLog,
        clock: ManualClock,
        update_cost: f64,
        deltas: Vec<f32>,
        fail_on_update: Option<usize>,
    }

    impl FakeApp {
        fn new(log: &CallLog, clock: &ManualClock) -> Self {
            Self {
                log: Rc::clone(log),
                clock: clock.clone(),
                update_cost: 0.0,
                deltas: Vec::new(),
                fail_on_update: None,
            }
        }
    }

    impl Application for FakeApp {
        fn init(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("app.init");
            Ok(())
        }

        fn update(&mut self, delta_seconds: f32) -> Result<(), BoxError> {
            self.log.borrow_mut().push("app.update");
            self.deltas.push(delta_seconds);
            self.clock.advance(self.update_cost);
            if self.fail_on_update == Some(self.deltas.len()) {
                return Err("simulation diverged".into());
            }
            Ok(())
        }

        fn deinit(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push("app.deinit");
            Ok(())
        }
    }

    fn fixture(iterations: u32) -> (CallLog, ManualClock, FakeHost, FakeApp) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let clock = ManualClock::new();
        let host = FakeHost::new(&log, &clock, iterations);
        let app = FakeApp::new(&log, &clock);
        (log, clock, host, app)
    }

    fn build(
        host: FakeHost,
        clock: &ManualClock,
    ) -> FrameScheduler<FakeHost, ManualClock> {
        FrameScheduler::with_clock(LoopConfig::default(), host, clock.clone()).unwrap()
    }

    fn count(log: &CallLog, entry: &str) -> usize {
        log.borrow().iter().filter(|e| **e == entry).count()
    }

    #[test]
    fn test_dead_host_only_runs_lifecycle() {
        let (log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);

        scheduler.run(&mut app).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["host.init", "app.init", "app.deinit", "host.deinit"]
        );
        assert_eq!(scheduler.stats().updates, 0);
        assert_eq!(scheduler.stats().renders, 0);
    }

    #[test]
    fn test_steady_clock_updates_and_renders_every_iteration() {
        let (log, clock, mut host, mut app) = fixture(10);
        host.advance_per_iteration = DT;
        let mut scheduler = build(host, &clock);

        scheduler.run(&mut app).unwrap();

        let stats = scheduler.stats();
        assert_eq!(stats.updates, 10);
        assert_eq!(stats.renders, 10);
        assert_eq!(stats.forced_renders, 0);
        assert_eq!(stats.sleeps, 0);
        assert_eq!(scheduler.skipped_frames(), 1);

        // Simulation never sees the measured delta, only the fixed step
        assert_eq!(app.deltas.len(), 10);
        assert!(app.deltas.iter().all(|&dt| dt == DT as f32));

        // Host housekeeping and simulation precede the render of each frame
        let log = log.borrow();
        assert_eq!(
            &log[2..6],
            &["host.poll", "host.update", "app.update", "host.render"]
        );
        assert_eq!(log.last(), Some(&"host.deinit"));
    }

    #[test]
    fn test_slow_updates_force_render_after_skip_budget() {
        let (log, clock, host, mut app) = fixture(0);
        app.update_cost = 0.05;
        let mut scheduler = build(host, &clock);
        scheduler.start();

        let mut rendered = Vec::new();
        let mut max_skipped = 0;
        for _ in 0..7 {
            match scheduler.step(&mut app).unwrap() {
                StepOutcome::Updated { rendered: r } => rendered.push(r),
                other => panic!("expected an update, got {other:?}"),
            }
            max_skipped = max_skipped.max(scheduler.skipped_frames());
        }

        // Step 1 is caught up and renders, leaving skipped_frames at 1. Every
        // later step overruns the timestep. Steps 2 to 6 each skip their
        // render and raise skipped_frames to 2, 3, 4, 5, 6. At step 7, the
        // sixth overrunning step, 6 > max_skipped_frames (5), so that render
        // is forced. "Forced on the 6th" counts overrunning steps only, so it
        // is the 7th step overall.
        assert_eq!(rendered, vec![true, false, false, false, false, false, true]);
        assert_eq!(scheduler.stats().forced_renders, 1);
        assert_eq!(max_skipped, scheduler.config().max_skipped_frames + 1);
        assert_eq!(scheduler.skipped_frames(), 1);
        assert_eq!(count(&log, "host.render"), 2);
    }

    #[test]
    fn test_stall_beyond_drift_bound_resyncs_without_catch_up() {
        let (_log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);
        scheduler.start();

        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Updated { rendered: true }
        );

        clock.set(6.0);
        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Updated { rendered: true }
        );
        assert_eq!(scheduler.stats().resyncs, 1);
        assert_eq!(scheduler.next_time(), 6.0 + scheduler.delta_seconds());

        // Caught up after a single step: the next iteration paces instead
        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Slept(Duration::from_millis(16))
        );
        assert_eq!(app.deltas.len(), 2);
    }

    #[test]
    fn test_stall_within_drift_bound_is_caught_up() {
        let (_log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);
        scheduler.start();
        scheduler.step(&mut app).unwrap();

        clock.set(0.21);
        let mut catch_up = 0;
        let mut max_skipped = 0;
        while let StepOutcome::Updated { .. } = scheduler.step(&mut app).unwrap() {
            catch_up += 1;
            max_skipped = max_skipped.max(scheduler.skipped_frames());
        }

        assert_eq!(catch_up, 12);
        assert_eq!(scheduler.stats().resyncs, 0);
        assert_eq!(scheduler.stats().forced_renders, 1);
        assert_eq!(scheduler.stats().renders, 3);
        assert!(max_skipped <= scheduler.config().max_skipped_frames + 1);
    }

    #[test]
    fn test_exact_deadline_defers_render() {
        let (_log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);
        scheduler.start();
        scheduler.step(&mut app).unwrap();

        // Land exactly on the deadline the step is about to set
        clock.set(scheduler.next_time() + scheduler.delta_seconds());
        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Updated { rendered: false }
        );
        assert_eq!(scheduler.skipped_frames(), 2);
    }

    #[test]
    fn test_paces_with_truncated_millisecond_sleeps() {
        let (log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);
        scheduler.start();
        scheduler.step(&mut app).unwrap();

        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Slept(Duration::from_millis(16))
        );
        assert_eq!(clock.total_slept(), Duration::from_millis(16));

        // 0.67ms left: too short to sleep
        assert_eq!(scheduler.step(&mut app).unwrap(), StepOutcome::Pending);
        assert_eq!(clock.sleep_count(), 1);

        clock.advance(0.001);
        assert_eq!(
            scheduler.step(&mut app).unwrap(),
            StepOutcome::Updated { rendered: true }
        );
        assert_eq!(count(&log, "app.update"), 2);
    }

    #[test]
    fn test_next_time_is_monotonic_and_updates_only_when_due() {
        let (_log, clock, host, mut app) = fixture(0);
        let mut scheduler = build(host, &clock);
        scheduler.start();

        let readings = [
            0.0, 0.004, 0.02, 0.02, 0.5, 0.3, 0.31, 7.0, 6.9, 6.95, 7.2, 20.0, 19.0, 19.5, 19.5,
            20.01, 20.02, 26.5, 26.51,
        ];

        for &reading in &readings {
            clock.set(reading);
            let before = scheduler.next_time();
            let resyncs = scheduler.stats().resyncs;

            let outcome = scheduler.step(&mut app).unwrap();

            let resynced = scheduler.stats().resyncs > resyncs;
            assert_eq!(resynced, reading - before > scheduler.config().max_time_drift);
            let due = resynced || reading >= before;
            assert_eq!(matches!(outcome, StepOutcome::Updated { .. }), due);

            assert!(scheduler.next_time() >= before);
            assert!(scheduler.skipped_frames() <= scheduler.config().max_skipped_frames + 1);
        }
    }

    #[test]
    fn test_update_error_aborts_without_teardown() {
        let (log, clock, mut host, mut app) = fixture(100);
        host.advance_per_iteration = DT;
        app.fail_on_update = Some(3);
        let mut scheduler = build(host, &clock);

        let err = scheduler.run(&mut app).unwrap_err();

        assert_eq!(err.to_string(), "simulation diverged");
        assert_eq!(count(&log, "app.update"), 3);
        assert_eq!(count(&log, "app.deinit"), 0);
        assert_eq!(count(&log, "host.deinit"), 0);
    }

    #[test]
    fn test_host_init_error_skips_application() {
        let (log, clock, mut host, mut app) = fixture(10);
        host.fail_init = true;
        let mut scheduler = build(host, &clock);

        assert!(scheduler.run(&mut app).is_err());
        assert_eq!(*log.borrow(), vec!["host.init"]);
    }

    #[test]
    fn test_start_is_relative_to_clock_origin() {
        let (_log, clock, host, mut app) = fixture(0);
        clock.set(100.0);
        let mut scheduler = build(host, &clock);
        scheduler.start();

        // 100s on the clock is t=0 for the loop: no resync
        scheduler.step(&mut app).unwrap();
        assert_eq!(scheduler.stats().resyncs, 0);
        assert_eq!(scheduler.next_time(), scheduler.delta_seconds());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (_log, clock, host, _app) = fixture(0);
        let config = LoopConfig::default().with_target_fps(0);
        assert!(FrameScheduler::with_clock(config, host, clock).is_err());
    }
}
