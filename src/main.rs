//! Example application driven by the frame scheduler
//!
//! Usage: `frameloop [--headless] [--seconds N] [CONFIG.ron|CONFIG.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use frameloop::prelude::*;

/// A ball bouncing on the floor, integrated with the fixed step
struct BouncingBall {
    height: f32,
    velocity: f32,
    bounces: u32,
    report: Timer,
    time: Time,
}

impl BouncingBall {
    const GRAVITY: f32 = -9.81;
    const RESTITUTION: f32 = 0.8;

    fn new() -> Self {
        Self {
            height: 10.0,
            velocity: 0.0,
            bounces: 0,
            report: Timer::repeating(1.0),
            time: Time::new(),
        }
    }
}

impl Application for BouncingBall {
    fn init(&mut self) -> Result<(), BoxError> {
        log::info!("Dropping ball from {:.1}m", self.height);
        Ok(())
    }

    fn update(&mut self, delta_seconds: f32) -> Result<(), BoxError> {
        self.time.advance(delta_seconds);

        self.velocity += Self::GRAVITY * delta_seconds;
        self.height += self.velocity * delta_seconds;

        if self.height < 0.0 {
            self.height = -self.height;
            self.velocity = -self.velocity * Self::RESTITUTION;
            self.bounces += 1;
        }

        if self.report.tick(delta_seconds) {
            log::info!(
                "t={:.1}s height={:.2}m velocity={:.2}m/s bounces={}",
                self.time.elapsed_seconds(),
                self.height,
                self.velocity,
                self.bounces
            );
        }
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), BoxError> {
        log::info!(
            "Ball came to {:.2}m after {} bounces in {} steps",
            self.height,
            self.bounces,
            self.time.ticks()
        );
        Ok(())
    }
}

#[derive(Parser)]
#[command(name = "frameloop")]
#[command(about = "Run a bouncing ball through the fixed-step frame loop")]
struct Cli {
    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Simulated seconds to run for in headless mode
    #[arg(long, default_value_t = 10.0, value_parser = parse_seconds)]
    seconds: f64,

    /// Engine config file (.ron or .json)
    config: Option<PathBuf>,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(format!("expected a positive, finite number of seconds, got {value}"))
    }
}

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
fn run_windowed(config: EngineConfig, app: &mut BouncingBall) -> Result<LoopStats, BoxError> {
    let host = WindowHost::new(config.window);
    let mut scheduler = FrameScheduler::new(config.timing, host)?;
    scheduler.run(app)?;
    Ok(scheduler.stats().clone())
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn run_windowed(_config: EngineConfig, _app: &mut BouncingBall) -> Result<LoopStats, BoxError> {
    Err("no window host on this platform, use --headless".into())
}

fn run(cli: Cli) -> Result<LoopStats, BoxError> {
    let config = match &cli.config {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };

    let mut app = BouncingBall::new();

    if cli.headless {
        let host = HeadlessHost::new().with_max_seconds(cli.seconds);
        let mut scheduler = FrameScheduler::new(config.timing, host)?;
        scheduler.run(&mut app)?;
        Ok(scheduler.stats().clone())
    } else {
        run_windowed(config, &mut app)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(cli) {
        Ok(stats) => {
            log::info!("Done: {}", stats.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("frameloop error: {e}");
            ExitCode::FAILURE
        }
    }
}
