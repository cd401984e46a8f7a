//! Terminal display and UI rendering
//!
//! Features:
//! - Scaled view of the tracked frame (circle, A/B path, target, marker)
//! - Live jitter readout color coded by stability level
//! - Session timer, metronome beats and speed ramp
//! - Results panel once a session completes

use crate::calibration::{CircleCalibration, SegmentCalibration};
use crate::config::HoldScoring;
use crate::metrics::geometry::Point;
use crate::metrics::jitter::StabilityLevel;
use crate::session::{SessionMode, SessionState, SessionSummary};
use crate::tracker::ScreenMapping;
use crate::trainer::Trainer;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::error::Error;
use std::f64::consts::TAU;
use std::io::{stdout, Stdout, Write};
use std::time::{Duration, Instant};

/// Status lines above the frame view
pub const FRAME_TOP: u16 = 4;
/// Help line below the frame view
const FOOTER_ROWS: u16 = 1;
/// Points sampled along the circle outline
const CIRCLE_SAMPLES: usize = 72;
/// How long a transient message stays on screen
const MESSAGE_TTL: Duration = Duration::from_secs(2);

fn stability_color(level: StabilityLevel) -> Color {
    match level {
        StabilityLevel::Stable => Color::Green,
        StabilityLevel::Warning => Color::Yellow,
        StabilityLevel::Unstable => Color::Red,
    }
}

/// Color for a 0-100 higher-is-better score
fn score_color(score: f64) -> Color {
    if score >= 80.0 {
        Color::Green
    } else if score >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn frame_point(mapping: &ScreenMapping, col: u16, row: u16) -> Option<Point> {
    if row < FRAME_TOP || row >= FRAME_TOP + mapping.rows || col >= mapping.cols {
        return None;
    }
    Some(mapping.to_frame(col, row - FRAME_TOP))
}

/// Legacy pixel scores run lower-is-better and get no color
fn headline_color(trainer: &Trainer, score: f64) -> Color {
    if trainer.mode() == SessionMode::Hold && trainer.config().hold.scoring == HoldScoring::LegacyPixels {
        Color::White
    } else {
        score_color(score)
    }
}

/// Terminal display manager
pub struct Display {
    mapping: ScreenMapping,
    frame_width: u32,
    frame_height: u32,
    message: Option<(String, Instant)>,
}

impl Display {
    /// Take over the terminal with an alternate screen sized to the current window
    pub fn new(frame_width: u32, frame_height: u32) -> Result<Self, Box<dyn Error>> {
        let (cols, rows) = terminal::size()?;
        execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Display {
            mapping: Self::frame_mapping(cols, rows, frame_width, frame_height),
            frame_width,
            frame_height,
            message: None,
        })
    }

    fn frame_mapping(cols: u16, rows: u16, frame_width: u32, frame_height: u32) -> ScreenMapping {
        let frame_rows = rows.saturating_sub(FRAME_TOP + FOOTER_ROWS);
        ScreenMapping::new(cols, frame_rows, frame_width, frame_height)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.mapping = Self::frame_mapping(cols, rows, self.frame_width, self.frame_height);
    }

    /// Frame position under a terminal cell; `None` outside the frame view
    pub fn cell_to_frame(&self, col: u16, row: u16) -> Option<Point> {
        frame_point(&self.mapping, col, row)
    }

    fn put(&self, out: &mut Stdout, point: Point, glyph: &str, color: Color) -> Result<(), Box<dyn Error>> {
        let (col, row) = self.mapping.to_cell(point);
        queue!(
            out,
            cursor::MoveTo(col, row + FRAME_TOP),
            SetForegroundColor(color),
            Print(glyph),
            ResetColor
        )?;
        Ok(())
    }

    /// Redraw the whole screen for the current trainer state
    pub fn render(&self, trainer: &Trainer, now: Instant) -> Result<(), Box<dyn Error>> {
        let mut out = stdout();
        queue!(out, terminal::Clear(ClearType::All))?;

        self.show_status(&mut out, trainer)?;
        match trainer.mode() {
            SessionMode::Hold => self.show_circle(&mut out, trainer)?,
            SessionMode::Follow => self.show_path(&mut out, trainer.segment_calibration())?,
        }
        if let Some(target) = trainer.current_target(now) {
            self.put(&mut out, target, "O", Color::Magenta)?;
        }

        let snapshot = trainer.snapshot();
        if let Some(position) = snapshot.position {
            self.put(&mut out, position, "+", stability_color(snapshot.stability))?;
        }

        if let Some(summary) = trainer.final_metrics() {
            self.show_results(&mut out, summary, headline_color(trainer, summary.score()))?;
        }
        self.show_help(&mut out, trainer)?;

        if let Some((message, shown_at)) = &self.message {
            if now.saturating_duration_since(*shown_at) < MESSAGE_TTL {
                queue!(
                    out,
                    cursor::MoveTo(0, FRAME_TOP),
                    SetForegroundColor(Color::Yellow),
                    Print(message),
                    ResetColor
                )?;
            }
        }

        out.flush()?;
        Ok(())
    }

    fn show_status(&self, out: &mut Stdout, trainer: &Trainer) -> Result<(), Box<dyn Error>> {
        let snapshot = trainer.snapshot();
        let state = trainer.state();

        queue!(
            out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Cyan),
            Print(format!("Steady Trainer  |  {} ", snapshot.mode.as_str())),
            ResetColor,
            Print(format!("[{}]", state.label())),
        )?;
        if let SessionState::Running { .. } = state {
            queue!(
                out,
                Print(format!(
                    "  |  {:.1}s left  |  frames {}/{}",
                    snapshot.time_remaining_s, snapshot.frames_marker_found, snapshot.frames_total
                ))
            )?;
        }

        let (label, jitter) = match snapshot.mode {
            SessionMode::Hold => ("Jitter", snapshot.jitter),
            SessionMode::Follow => ("Lateral jitter", snapshot.lateral_jitter),
        };
        queue!(
            out,
            cursor::MoveTo(0, 1),
            Print(format!("{}: ", label)),
            SetForegroundColor(stability_color(snapshot.stability)),
            Print(format!("{:.1}px ({})", jitter, snapshot.stability.as_str())),
            ResetColor,
            Print("  |  Score: "),
            SetForegroundColor(headline_color(trainer, snapshot.score)),
            Print(format!("{:.0}", snapshot.score)),
            ResetColor,
        )?;

        queue!(out, cursor::MoveTo(0, 2))?;
        match snapshot.mode {
            SessionMode::Hold => {
                let hint = match trainer.circle_calibration() {
                    CircleCalibration::Uninitialized => "click the circle center (or press space for the default circle)",
                    CircleCalibration::CenterSet(_) => "click the circle edge",
                    CircleCalibration::Complete { .. } => "calibrated",
                };
                queue!(out, SetForegroundColor(Color::DarkGrey), Print(hint), ResetColor)?;
            }
            SessionMode::Follow => {
                queue!(
                    out,
                    Print(format!(
                        "BPM {}  |  beats {}  |  speed x{:.2}",
                        trainer.bpm(),
                        snapshot.beat_count,
                        trainer.speed_multiplier()
                    ))
                )?;
                if let Some(deviation) = trainer.path_deviation() {
                    queue!(out, Print(format!("  |  off path {:.1}px", deviation)))?;
                }
                if !trainer.is_active() && trainer.marker_at_start() {
                    queue!(out, SetForegroundColor(Color::Green), Print("  |  at A"), ResetColor)?;
                }
            }
        }
        queue!(
            out,
            cursor::MoveTo(0, 3),
            SetForegroundColor(Color::Blue),
            Print("─".repeat(self.mapping.cols as usize)),
            ResetColor
        )?;
        Ok(())
    }

    fn show_circle(&self, out: &mut Stdout, trainer: &Trainer) -> Result<(), Box<dyn Error>> {
        let (center, radius) = trainer.effective_circle();
        let color = if trainer.circle_calibration().is_complete() {
            Color::White
        } else {
            Color::DarkGrey
        };
        for i in 0..CIRCLE_SAMPLES {
            let angle = TAU * i as f64 / CIRCLE_SAMPLES as f64;
            let p = center + Point::new(angle.cos(), angle.sin()) * radius;
            self.put(out, p, "·", color)?;
        }
        if let CircleCalibration::CenterSet(c) = trainer.circle_calibration() {
            self.put(out, *c, "x", Color::Yellow)?;
        }
        Ok(())
    }

    fn show_path(&self, out: &mut Stdout, segment: &SegmentCalibration) -> Result<(), Box<dyn Error>> {
        if let Some((a, b)) = segment.endpoints() {
            let steps = self.mapping.cols.max(2) as usize;
            for i in 0..=steps {
                let p = a + (b - a) * (i as f64 / steps as f64);
                self.put(out, p, ".", Color::DarkGrey)?;
            }
            self.put(out, b, "B", Color::Cyan)?;
        }
        if let Some(a) = segment.point_a() {
            self.put(out, a, "A", Color::Cyan)?;
        }
        Ok(())
    }

    fn show_results(
        &self,
        out: &mut Stdout,
        summary: &SessionSummary,
        score_color: Color,
    ) -> Result<(), Box<dyn Error>> {
        let mut lines = vec![
            format!("{} session complete", summary.mode.as_str()),
            format!("Score: {:.1}", summary.score()),
            format!(
                "Jitter avg {:.2}px  p95 {:.2}px",
                summary.avg_jitter, summary.p95_jitter
            ),
            format!("Marker found in {:.0}% of frames", summary.detection_pct()),
        ];
        if let Some(hold) = summary.hold() {
            lines.push(format!("Inside circle: {:.1}%", hold.inside_circle_pct));
        }
        if let Some(follow) = summary.follow() {
            lines.push(format!(
                "Lateral p95 {:.2}px  jerk p95 {:.0}  wobble {:.3}",
                follow.p95_lateral_jitter, follow.p95_jerk, follow.wobble_ratio
            ));
            lines.push(format!(
                "Target error avg {:.1}px  |  {} beats at {} BPM",
                follow.avg_target_error, follow.beats_total, follow.bpm
            ));
        }

        let top = FRAME_TOP + 1;
        for (i, line) in lines.iter().enumerate() {
            queue!(
                out,
                cursor::MoveTo(2, top + i as u16),
                SetForegroundColor(if i == 1 {
                    score_color
                } else {
                    Color::White
                }),
                Print(line),
                ResetColor
            )?;
        }
        Ok(())
    }

    fn show_help(&self, out: &mut Stdout, trainer: &Trainer) -> Result<(), Box<dyn Error>> {
        let action = match trainer.state() {
            SessionState::Idle => "start",
            SessionState::Running { .. } => "stop",
            SessionState::Complete { .. } => "continue",
        };
        let mut help = format!(
            "1 HOLD  2 FOLLOW  |  SPACE {}  |  r recalibrate  |  q quit",
            action
        );
        if trainer.mode() == SessionMode::Follow {
            help.push_str("  |  ↑/↓ BPM");
        }
        queue!(
            out,
            cursor::MoveTo(0, FRAME_TOP + self.mapping.rows),
            SetForegroundColor(Color::DarkGrey),
            Print(help),
            ResetColor
        )?;
        Ok(())
    }

    /// Show a one-line message below the status area for a couple of seconds
    pub fn show_message(&mut self, message: &str) {
        self.message = Some((message.to_string(), Instant::now()));
    }

    /// Leave the alternate screen and show the cursor again
    pub fn shutdown(&self) -> Result<(), Box<dyn Error>> {
        execute!(stdout(), LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_frame_skips_status_rows() {
        let mapping = Display::frame_mapping(80, 29, 640, 480);
        assert_eq!(frame_point(&mapping, 10, 0), None);
        assert_eq!(frame_point(&mapping, 0, FRAME_TOP), Some(Point::new(4.0, 10.0)));
        assert_eq!(frame_point(&mapping, 0, FRAME_TOP + 24), None);
    }

    #[test]
    fn test_score_colors() {
        assert_eq!(score_color(95.0), Color::Green);
        assert_eq!(score_color(60.0), Color::Yellow);
        assert_eq!(score_color(10.0), Color::Red);
    }
}
