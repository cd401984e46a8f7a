//! Session history viewer for Steady Trainer
//!
//! Lists stored sessions (most recent first) and the score trend.
//! Usage: cargo run --bin history -- --limit 20 --mode follow

use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use steady_trainer::session::SessionMode;
use steady_trainer::storage::{history_stats, recent_sessions, SessionStore};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Hold,
    Follow,
}

#[derive(Parser, Debug)]
#[command(name = "Steady Trainer - History")]
#[command(about = "List completed sessions and the recent score trend")]
struct Args {
    /// Sessions file written by the trainer
    #[arg(short, long, default_value = "data/sessions.json")]
    file: PathBuf,

    /// Maximum number of sessions to list
    #[arg(short, long, default_value = "50", value_parser = clap::value_parser!(u16).range(1..=200))]
    limit: u16,

    /// Only list one mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Print stats as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn field(record: &Value, key: &str) -> Option<f64> {
    record.get(key).and_then(Value::as_f64)
}

fn format_record(record: &Value) -> String {
    let timestamp = record.get("timestamp").and_then(Value::as_str).unwrap_or("?");
    let kind = record.get("type").and_then(Value::as_str).unwrap_or("?");
    let score = field(record, "tremor_score").or_else(|| field(record, "movement_quality_score"));
    let scoring = record.get("scoring").and_then(Value::as_str).unwrap_or("");

    let mut line = format!("{:<28} {:<6}", timestamp, kind);
    match score {
        Some(score) => line.push_str(&format!(" score {:>6.1}", score)),
        None => line.push_str("  score      -"),
    }
    if let Some(p95) = field(record, "p95_jitter") {
        line.push_str(&format!("  p95 jitter {:>5.2}px", p95));
    }
    if let Some(wobble) = field(record, "wobble_ratio") {
        line.push_str(&format!("  wobble {:.3}", wobble));
    }
    if !scoring.is_empty() {
        line.push_str(&format!("  [{}]", scoring));
    }
    line
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if args.debug {
                    "steady_trainer=debug".into()
                } else {
                    "steady_trainer=warn".into()
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = SessionStore::new(&args.file);
    let records = store.load();
    let mode = args.mode.map(|m| match m {
        ModeArg::Hold => SessionMode::Hold,
        ModeArg::Follow => SessionMode::Follow,
    });
    let stats = history_stats(&records);

    if args.json {
        let listed: Vec<&Value> = recent_sessions(&records, mode, args.limit as usize);
        let output = serde_json::json!({
            "sessions": listed,
            "total": listed.len(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Sessions in {}", store.path().display());
    for record in recent_sessions(&records, mode, args.limit as usize) {
        println!("  {}", format_record(record));
    }

    println!();
    println!(
        "Total: {}  (HOLD {}, FOLLOW {})",
        stats.total_sessions, stats.hold_sessions, stats.follow_sessions
    );
    println!(
        "Recent avg {:.1} vs previous {:.1}: {} ({:+.1}%)",
        stats.avg_score_recent,
        stats.avg_score_previous,
        stats.trend.as_str(),
        stats.trend_percent
    );
    Ok(())
}
