//! Steady Trainer - terminal front-end
//!
//! Drives the trainer at the configured frame rate from the terminal
//! pointer (or a simulated hand), with mouse clicks for calibration.
//! Logs go to a file because the terminal is in raw mode.

use clap::{Parser, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use steady_trainer::cli::{Command, Display, InputEvent, InputHandler};
use steady_trainer::config::{FollowScoring, HoldScoring, PathStyle, TrainerConfig};
use steady_trainer::metrics::geometry::Point;
use steady_trainer::session::{SessionMode, SessionState, SessionSummary};
use steady_trainer::storage::SessionStore;
use steady_trainer::tracker::{HandProfile, MarkerTracker, PointerTracker, SimulatedHand};
use steady_trainer::trainer::Trainer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Hold,
    Follow,
}

#[derive(Parser, Debug)]
#[command(name = "Steady Trainer")]
#[command(about = "Hand-steadiness trainer: hold still or follow a moving target")]
struct Args {
    /// Mode selected at startup
    #[arg(short, long, value_enum, default_value = "hold")]
    mode: ModeArg,

    /// JSON config file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where completed sessions are appended
    #[arg(long)]
    sessions_file: Option<PathBuf>,

    /// Do not save completed sessions
    #[arg(long)]
    no_save: bool,

    /// HOLD session length in seconds
    #[arg(long)]
    hold_duration: Option<f64>,

    /// FOLLOW session length in seconds
    #[arg(long)]
    follow_duration: Option<f64>,

    /// Metronome tempo for FOLLOW
    #[arg(long)]
    bpm: Option<u32>,

    /// Circle around the frame center instead of the A/B path
    #[arg(long)]
    orbit: bool,

    /// Use the blended jitter/jerk/wobble FOLLOW score
    #[arg(long)]
    blended: bool,

    /// Report the HOLD score as raw pixels (lower is better)
    #[arg(long)]
    legacy_score: bool,

    /// Drive the marker with a simulated hand instead of the mouse
    #[arg(long)]
    simulate: bool,

    /// Seed for the simulated hand
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log file
    #[arg(long, default_value = "steady-trainer.log")]
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied
    fn trainer_config(&self) -> Result<TrainerConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(path) = &self.sessions_file {
            config.sessions_file = path.clone();
        }
        if let Some(duration) = self.hold_duration {
            config.hold.duration_s = duration;
        }
        if let Some(duration) = self.follow_duration {
            config.follow.duration_s = duration;
        }
        if let Some(bpm) = self.bpm {
            config.follow.default_bpm = bpm;
        }
        if self.orbit {
            config.follow.path_style = PathStyle::Orbit;
        }
        if self.blended {
            config.follow.scoring = FollowScoring::Blended;
        }
        if self.legacy_score {
            config.hold.scoring = HoldScoring::LegacyPixels;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(path: &Path, debug: bool) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let default_level = if debug { "steady_trainer=debug" } else { "steady_trainer=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Where marker positions come from
enum Source {
    Pointer(PointerTracker),
    Simulated(SimulatedHand),
}

impl Source {
    fn detect(&mut self, trainer: &Trainer, now: Instant) -> Option<Point> {
        match self {
            Source::Pointer(tracker) => tracker.detect(now),
            Source::Simulated(hand) => {
                let aim = trainer.current_target(now).unwrap_or_else(|| {
                    match trainer.mode() {
                        SessionMode::Hold => trainer.effective_circle().0,
                        SessionMode::Follow => trainer
                            .segment_calibration()
                            .point_a()
                            .unwrap_or(trainer.effective_circle().0),
                    }
                });
                hand.aim_at(aim);
                hand.detect(now)
            }
        }
    }
}

/// Apply one input event; returns false to quit
fn handle_event(
    event: InputEvent,
    trainer: &mut Trainer,
    display: &mut Display,
    source: &mut Source,
) -> bool {
    match event {
        InputEvent::Command(Command::Quit) => return false,
        InputEvent::Command(Command::SelectMode(mode)) => {
            trainer.set_mode(mode);
        }
        InputEvent::Command(Command::Toggle) => match trainer.state() {
            SessionState::Idle => {
                if trainer.start_session(Instant::now()).is_err() {
                    display.show_message("Click points A and B first");
                }
            }
            SessionState::Running { .. } | SessionState::Complete { .. } => trainer.stop_session(),
        },
        InputEvent::Command(Command::AdjustBpm(delta)) => {
            trainer.adjust_bpm(delta);
        }
        InputEvent::Command(Command::ResetCalibration) => trainer.reset_calibration(),
        InputEvent::Click { col, row } => {
            if let Some(point) = display.cell_to_frame(col, row) {
                trainer.handle_click(point);
            }
        }
        InputEvent::Pointer { col, row } => {
            if let Source::Pointer(tracker) = source {
                match display.cell_to_frame(col, row) {
                    Some(point) => tracker.set_position(point),
                    None => tracker.clear(),
                }
            }
        }
        InputEvent::Resize { cols, rows } => display.resize(cols, rows),
    }
    true
}

fn run(
    trainer: &mut Trainer,
    display: &mut Display,
    source: &mut Source,
    frame_interval: Duration,
) -> Result<Vec<SessionSummary>, Box<dyn Error>> {
    let input = InputHandler::default();
    let mut completed = Vec::new();
    let mut next_tick = Instant::now();

    'session: loop {
        // Handle input until the next frame is due
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            if wait.is_zero() {
                break;
            }
            if let Some(event) = input.read_event(wait)? {
                if !handle_event(event, trainer, display, source) {
                    break 'session;
                }
            }
        }

        let now = Instant::now();
        let position = source.detect(trainer, now);
        if let Some(summary) = trainer.tick(position, now) {
            completed.push(summary);
        }
        display.render(trainer, now)?;

        next_tick += frame_interval;
        if next_tick < now {
            // Fell behind; skip the missed frames instead of bursting
            next_tick = now + frame_interval;
        }
    }

    Ok(completed)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args.log_file, args.debug)?;
    let config = args.trainer_config()?;
    tracing::info!(?config, simulate = args.simulate, "starting trainer");

    let frame_interval = Duration::from_secs_f64(config.frame_dt());
    let sessions_file = config.sessions_file.clone();
    let frame_center = Point::new(
        config.frame_width as f64 / 2.0,
        config.frame_height as f64 / 2.0,
    );

    let mut trainer = Trainer::new(config.clone()).with_beat_callback(Arc::new(|_| {
        // Terminal bell on every beat
        let mut out = stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }));
    if !args.no_save {
        trainer = trainer.with_store(SessionStore::new(&sessions_file));
    }
    trainer.set_mode(match args.mode {
        ModeArg::Hold => SessionMode::Hold,
        ModeArg::Follow => SessionMode::Follow,
    });

    let mut source = if args.simulate {
        Source::Simulated(SimulatedHand::new(
            args.seed,
            frame_center,
            HandProfile::default(),
        ))
    } else {
        Source::Pointer(PointerTracker::new())
    };

    InputHandler::enable()?;
    let mut display = Display::new(config.frame_width, config.frame_height)?;
    let result = run(&mut trainer, &mut display, &mut source, frame_interval);

    // Restore the terminal before reporting anything
    trainer.stop_session();
    display.shutdown()?;
    InputHandler::disable()?;
    let completed = result?;

    println!("Steady Trainer - {} session(s) completed", completed.len());
    for summary in &completed {
        println!(
            "  {:<6} score {:>6.1}  jitter avg {:.2}px p95 {:.2}px  marker found {:.0}%",
            summary.mode.as_str(),
            summary.score(),
            summary.avg_jitter,
            summary.p95_jitter,
            summary.detection_pct()
        );
    }
    if !completed.is_empty() && !args.no_save {
        println!("Saved to {}", sessions_file.display());
    }
    Ok(())
}
