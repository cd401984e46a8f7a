//! Session history persistence
//!
//! Features:
//! - Append-only JSON array of completed sessions
//! - Tolerant loading (missing or malformed file reads as empty)
//! - Malformed files are moved aside, never overwritten, on save
//! - Recent-vs-previous score trend over the stored history

use crate::error::TrainerError;
use crate::session::{SessionMode, SessionSummary};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Sessions compared on each side of the trend
const TREND_WINDOW: usize = 5;
/// Percent change needed before the trend leaves "stable"
const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Result of reading the sessions file
enum Stored {
    Missing,
    Malformed,
    Records(Vec<Value>),
}

/// JSON file holding every completed session
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records in file order; unreadable files read as empty
    pub fn load(&self) -> Vec<Value> {
        match self.read() {
            Ok(Stored::Records(records)) => records,
            Ok(Stored::Missing) | Ok(Stored::Malformed) => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read sessions file");
                Vec::new()
            }
        }
    }

    fn read(&self) -> std::io::Result<Stored> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Stored::Missing),
            Err(e) => return Err(e),
        };

        Ok(match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(records)) => Stored::Records(records),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "sessions file is not a JSON array");
                Stored::Malformed
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed sessions file");
                Stored::Malformed
            }
        })
    }

    /// Sibling path a malformed sessions file is moved to before rewriting
    fn backup_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sessions.json".to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        self.path.with_file_name(format!("{name}.corrupt-{stamp}"))
    }

    /// Append one summary and rewrite the file
    ///
    /// A malformed file is renamed aside first so its contents are never
    /// overwritten; a file that cannot be read at all is left untouched
    /// and the save fails.
    pub fn save(&self, summary: &SessionSummary) -> Result<(), TrainerError> {
        let mut records = match self.read().map_err(|e| TrainerError::io(&self.path, e))? {
            Stored::Records(records) => records,
            Stored::Missing => Vec::new(),
            Stored::Malformed => {
                let backup = self.backup_path();
                fs::rename(&self.path, &backup).map_err(|e| TrainerError::io(&self.path, e))?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "moved malformed sessions file aside"
                );
                Vec::new()
            }
        };
        records.push(serde_json::to_value(summary)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| TrainerError::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json).map_err(|e| TrainerError::io(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            mode = summary.mode.as_str(),
            total = records.len(),
            "session saved"
        );
        Ok(())
    }
}

/// Direction of the recent scores relative to the ones before them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

/// Aggregate view over the stored history
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub hold_sessions: usize,
    pub follow_sessions: usize,
    pub avg_score_recent: f64,
    pub avg_score_previous: f64,
    pub trend: Trend,
    pub trend_percent: f64,
}

fn record_type(record: &Value) -> &str {
    record.get("type").and_then(Value::as_str).unwrap_or("")
}

fn record_timestamp(record: &Value) -> &str {
    record.get("timestamp").and_then(Value::as_str).unwrap_or("")
}

/// Headline score of a record on the 0-100 higher-is-better scale
///
/// Legacy pixel scores run the other way and are left out.
fn record_score(record: &Value) -> Option<f64> {
    if record.get("scoring").and_then(Value::as_str) == Some("legacy_pixels") {
        return None;
    }
    record
        .get("tremor_score")
        .or_else(|| record.get("movement_quality_score"))
        .and_then(Value::as_f64)
}

fn average_score(records: &[&Value]) -> f64 {
    let scores: Vec<f64> = records.iter().filter_map(|r| record_score(r)).collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Records sorted most recent first, optionally restricted to one mode
pub fn recent_sessions(records: &[Value], mode: Option<SessionMode>, limit: usize) -> Vec<&Value> {
    let mut selected: Vec<&Value> = records
        .iter()
        .filter(|r| mode.map_or(true, |m| record_type(r).eq_ignore_ascii_case(m.as_str())))
        .collect();
    // RFC 3339 UTC timestamps sort lexicographically
    selected.sort_by(|a, b| record_timestamp(b).cmp(record_timestamp(a)));
    selected.truncate(limit);
    selected
}

/// Counts per mode plus the last-5 vs previous-5 score trend
pub fn history_stats(records: &[Value]) -> HistoryStats {
    let sorted = recent_sessions(records, None, usize::MAX);

    let hold_sessions = sorted
        .iter()
        .filter(|r| record_type(r) == SessionMode::Hold.as_str())
        .count();
    let follow_sessions = sorted
        .iter()
        .filter(|r| record_type(r) == SessionMode::Follow.as_str())
        .count();

    let recent = &sorted[..sorted.len().min(TREND_WINDOW)];
    let previous = if sorted.len() > TREND_WINDOW {
        &sorted[TREND_WINDOW..sorted.len().min(2 * TREND_WINDOW)]
    } else {
        &[][..]
    };

    let avg_recent = average_score(recent);
    let avg_previous = if previous.is_empty() {
        avg_recent
    } else {
        average_score(previous)
    };

    let trend_percent = if avg_previous > 0.0 {
        (avg_recent - avg_previous) / avg_previous * 100.0
    } else {
        0.0
    };
    let trend = if trend_percent > TREND_THRESHOLD_PCT {
        Trend::Improving
    } else if trend_percent < -TREND_THRESHOLD_PCT {
        Trend::Declining
    } else {
        Trend::Stable
    };

    HistoryStats {
        total_sessions: sorted.len(),
        hold_sessions,
        follow_sessions,
        avg_score_recent: round1(avg_recent),
        avg_score_previous: round1(avg_previous),
        trend,
        trend_percent: round1(trend_percent),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
