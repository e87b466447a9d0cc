//! Headless lorenz-trail runner.
//!
//! Drives a trajectory for a fixed wall-clock duration, advancing a view that
//! follows the newest segment at ~60 frames per second, and logs what a
//! renderer would receive.
//!
//! Usage: `lorenz-trail [--config FILE] [--seconds N] [--worker] [--follow 0-3] [--dump FILE]`

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use lorenz_trail::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_micros(16_667);

#[derive(Parser, Debug)]
#[command(name = "lorenz-trail")]
#[command(
    about = "Run a Lorenz attractor trajectory and report what a renderer would draw",
    long_about = None
)]
struct Cli {
    /// JSON configuration file (defaults are used for missing fields).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to run, in seconds.
    #[arg(short, long, default_value = "5")]
    seconds: f64,

    /// Run the trajectory on a worker thread.
    #[arg(long)]
    worker: bool,

    /// Follow this segment (1 = blue, 2 = red, 3 = green; 0 = don't follow).
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(0..=3))]
    follow: u32,

    /// Write the final snapshot as JSON to this file.
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => LorenzConfig::load(path)?,
        None => LorenzConfig::default(),
    };
    let duration = Duration::try_from_secs_f64(cli.seconds)?;

    let mut view = ViewState::new(&config.camera);
    if let Some(segment) = Segment::from_number(cli.follow) {
        view.start_following(segment);
    }

    let last = if cli.worker {
        run_worker(&config, duration, &mut view)?
    } else {
        run_local(&config, duration, &mut view)?
    };

    info!(
        sequence = last.sequence,
        points = last.len(),
        center = %last.center,
        "final snapshot"
    );

    if let Some(path) = &cli.dump {
        fs::write(path, serde_json::to_string_pretty(last.as_ref())?)?;
        info!(path = %path.display(), "snapshot written");
    }
    Ok(())
}

/// Single-threaded loop: simulation timers and frames share one thread.
fn run_local(
    config: &LorenzConfig,
    duration: Duration,
    view: &mut ViewState,
) -> Result<Arc<Snapshot>, Box<dyn std::error::Error>> {
    let mut manager = TrajectoryManager::new(config.clone())?;
    let start = Instant::now();
    let end = start + duration;
    manager.start(start);

    let mut next_frame = start + FRAME;
    let mut frames = 0u64;
    let mut seen = 0;

    while Instant::now() < end {
        let wake = manager
            .next_deadline()
            .map_or(next_frame, |d| d.min(next_frame))
            .min(end);
        thread::sleep(wake.saturating_duration_since(Instant::now()));

        let now = Instant::now();
        manager.poll(now);
        if now >= next_frame {
            let snapshot = manager.latest();
            report_frame(view, &snapshot, &mut seen);
            frames += 1;
            next_frame += FRAME;
        }

        if let Status::Faulted(fault) = manager.status() {
            return Err(fault.into());
        }
    }

    manager.stop();
    info!(frames, ticks = manager.ticks(), "run finished");
    Ok(manager.latest())
}

/// Worker-thread placement: frames here, simulation on the worker.
fn run_worker(
    config: &LorenzConfig,
    duration: Duration,
    view: &mut ViewState,
) -> Result<Arc<Snapshot>, Box<dyn std::error::Error>> {
    let worker = spawn_worker(WorkerRequest::from_config(config), config)?;
    let end = Instant::now() + duration;
    let mut seen = 0;

    while Instant::now() < end {
        thread::sleep(FRAME);
        let snapshot = worker.latest();
        report_frame(view, &snapshot, &mut seen);

        if let Some(fault) = worker.fault() {
            worker.stop()?;
            return Err(fault.into());
        }
    }

    let last = worker.latest();
    worker.stop()?;
    Ok(last)
}

fn report_frame(view: &mut ViewState, snapshot: &Snapshot, seen: &mut u64) {
    let frame = view.frame(snapshot);
    if snapshot.sequence == *seen {
        return;
    }
    *seen = snapshot.sequence;

    let [blue, red, green] = &frame.segments;
    info!(
        sequence = snapshot.sequence,
        blue = blue.points.len(),
        red = red.points.len(),
        green = green.points.len(),
        camera = %frame.camera.position,
        target = %frame.camera.target,
        axes = frame.axes_visible,
        "published"
    );
}
