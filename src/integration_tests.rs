//! End-to-end scenarios driven through the Trainer at 30 Hz

use crate::config::{HoldScoring, PathStyle, TrainerConfig};
use crate::metrics::geometry::{distance, Point};
use crate::session::{SessionMode, SessionState, SessionSummary};
use crate::storage::{history_stats, SessionStore};
use crate::trainer::Trainer;
use std::time::{Duration, Instant};

/// Timestamp of frame `i` at 30 Hz, rounded up so frame 30 lands past 1 s
fn frame(start: Instant, i: u64) -> Instant {
    start + Duration::from_micros(i * 33_334)
}

fn hold_trainer(scoring: HoldScoring, duration_s: f64) -> Trainer {
    let mut config = TrainerConfig::default();
    config.hold.scoring = scoring;
    config.hold.duration_s = duration_s;
    let mut trainer = Trainer::new(config);
    trainer.handle_click(Point::new(100.0, 100.0));
    trainer.handle_click(Point::new(150.0, 100.0));
    trainer
}

fn run_still_hold(trainer: &mut Trainer, frames: u64) -> Option<SessionSummary> {
    let start = Instant::now();
    trainer.start_session(start).unwrap();
    let mut completed = None;
    for i in 1..=frames {
        if let Some(summary) = trainer.tick(Some(Point::new(100.0, 100.0)), frame(start, i)) {
            completed = Some(summary);
        }
    }
    completed
}

#[test]
fn test_hold_still_marker_legacy_profile() {
    // 40 frames: the 40th is the first at or past 40/30 s
    let mut trainer = hold_trainer(HoldScoring::LegacyPixels, 40.0 / 30.0);
    let summary = run_still_hold(&mut trainer, 40).expect("session completes on frame 40");

    let hold = summary.hold().unwrap();
    assert_eq!(hold.inside_circle_pct, 100.0);
    assert!(hold.tremor_score.abs() < 1e-9);
    assert_eq!(summary.frames_total, 40);
    assert_eq!(summary.frames_marker_found, 40);
    assert!(matches!(trainer.state(), SessionState::Complete { .. }));
}

#[test]
fn test_hold_still_marker_normalized_profile() {
    let mut trainer = hold_trainer(HoldScoring::Normalized, 40.0 / 30.0);
    let summary = run_still_hold(&mut trainer, 40).unwrap();
    assert_eq!(summary.score(), 100.0);
    assert_eq!(summary.avg_jitter, 0.0);
}

#[test]
fn test_final_metrics_only_after_completion() {
    let mut trainer = hold_trainer(HoldScoring::Normalized, 1.0);
    let start = Instant::now();
    trainer.start_session(start).unwrap();
    for i in 1..30 {
        trainer.tick(Some(Point::new(100.0, 100.0)), frame(start, i));
        assert!(trainer.final_metrics().is_none());
        assert!(trainer.is_active());
    }
    assert!(trainer
        .tick(Some(Point::new(100.0, 100.0)), frame(start, 30))
        .is_some());
    assert!(trainer.final_metrics().is_some());
    assert_eq!(trainer.time_remaining(), 0.0);
}

#[test]
fn test_follow_perfect_tracking_scores_full() {
    let mut config = TrainerConfig::default();
    config.follow.duration_s = 10.0;
    let mut trainer = Trainer::new(config);
    trainer.set_mode(SessionMode::Follow);
    trainer.handle_click(Point::new(0.0, 0.0));
    trainer.handle_click(Point::new(100.0, 0.0));

    let start = Instant::now();
    trainer.start_session(start).unwrap();
    let mut completed = None;
    for i in 1..=300 {
        let now = frame(start, i);
        let target = trainer.current_target(now);
        assert!(target.is_some());
        if let Some(summary) = trainer.tick(target, now) {
            completed = Some(summary);
        }
    }
    let summary = completed.expect("FOLLOW completes after 10 s");
    let follow = summary.follow().unwrap();

    assert!(summary.score() > 99.0);
    assert_eq!(follow.avg_target_error, 0.0);
    assert_eq!(follow.p95_lateral_jitter, 0.0);

    // Only the turnaround frames, where the direction is undefined, can read nonzero
    let lateral = trainer.follow().tracker().lateral_history();
    let nonzero = lateral.iter().filter(|&&v| v > 1e-9).count();
    assert!(!lateral.is_empty());
    assert!(nonzero * 20 < lateral.len());
    assert!(!trainer.metronome_running());
}

#[test]
fn test_follow_orbit_runs_without_calibration() {
    let mut config = TrainerConfig::default();
    config.follow.path_style = PathStyle::Orbit;
    config.follow.duration_s = 2.0;
    let mut trainer = Trainer::new(config);
    trainer.set_mode(SessionMode::Follow);
    assert!(trainer.ready());

    let start = Instant::now();
    trainer.start_session(start).unwrap();
    assert!(trainer.metronome_running());

    // Orbit around the 640x480 frame center, radius 0.25 * 480
    let center = Point::new(320.0, 240.0);
    let mut completed = None;
    let mut last_target = None;
    for i in 1..=60 {
        let now = frame(start, i);
        let target = trainer.current_target(now).expect("target while running");
        assert!((distance(target, center) - 120.0).abs() < 1e-9);
        last_target = Some(target);
        if let Some(summary) = trainer.tick(Some(target), now) {
            completed = Some(summary);
        }
    }

    // 2 s of an 8 s period: a quarter turn from (440, 240)
    let last_target = last_target.unwrap();
    assert!((last_target.x - 320.0).abs() < 0.1);
    assert!((last_target.y - 360.0).abs() < 0.1);

    let summary = completed.expect("orbit session completes after 2 s");
    let follow = summary.follow().unwrap();
    assert_eq!(follow.path_style, PathStyle::Orbit);
    assert_eq!(follow.avg_target_error, 0.0);
    assert_eq!(summary.frames_marker_found, 60);
    assert!(follow.wobble_ratio < 0.1);
    assert!(!trainer.metronome_running());
    assert!(trainer.current_target(frame(start, 61)).is_none());
}

#[test]
fn test_completed_sessions_feed_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("sessions.json"));

    let mut trainer = hold_trainer(HoldScoring::Normalized, 1.0).with_store(store.clone());
    for _ in 0..2 {
        assert!(run_still_hold(&mut trainer, 30).is_some());
        trainer.stop_session();
    }

    let records = store.load();
    assert_eq!(records.len(), 2);
    let stats = history_stats(&records);
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.hold_sessions, 2);
    assert_eq!(stats.avg_score_recent, 100.0);
}
