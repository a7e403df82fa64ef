//! offset-infer
//!
//! Command-line driver for `offset-engine`.
//!
//! # Commands
//!
//! - `evaluate`: rank UTC-offset candidates for a histogram (JSON in, JSON out)
//! - `bucket`: turn RFC 3339 timestamps into a UTC half-hour histogram
//! - `landmarks`: show peak, lunch and sleep detections for one offset
//!
//! Every command reads a file path or `-` for stdin and writes JSON to stdout.
//! Logs go to stderr.

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::{DateTime, Timelike, Utc};
use clap::{Parser, Subcommand};
use offset_engine::{
    detect_lunch, detect_sleep_with_options, evaluate_offsets_with_options, ActivityHistogram,
    EvaluatorOptions, Landmarks, SleepOptions,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Infer a UTC offset from the timing of activity
#[derive(Parser)]
#[command(name = "offset-infer")]
#[command(version)]
#[command(about = "Infer UTC-offset candidates from half-hourly activity histograms")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank UTC-offset candidates for a histogram JSON file
    Evaluate {
        /// Histogram JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Only print the N best candidates
        #[arg(long)]
        top: Option<usize>,

        /// Drop candidates scoring below this
        #[arg(long, default_value_t = 10.0)]
        min_score: f64,

        /// Local hour at which the night window starts
        #[arg(long, default_value_t = 21.0)]
        night_start: f64,
    },
    /// Bucket newline-separated RFC 3339 timestamps into a histogram
    Bucket {
        /// Timestamp file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Show detected landmarks for a single offset
    Landmarks {
        /// Histogram JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// UTC offset hypothesis in whole hours
        #[arg(long, allow_hyphen_values = true)]
        offset: i32,

        /// Local hour at which the night window starts
        #[arg(long, default_value_t = 21.0)]
        night_start: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Evaluate {
            input,
            top,
            min_score,
            night_start,
        } => {
            let hist = read_histogram(&input)?;
            let options = EvaluatorOptions {
                min_score,
                sleep: SleepOptions {
                    night_start_local: night_start,
                },
                ..EvaluatorOptions::default()
            };
            let mut candidates = evaluate_offsets_with_options(&hist, &options);
            info!(count = candidates.len(), "candidates above threshold");
            if let Some(n) = top {
                candidates.truncate(n);
            }
            print_json(&candidates)
        }
        Commands::Bucket { input } => {
            let text = read_input(&input)?;
            let hist = bucket_timestamps(&text)?;
            info!(events = hist.total(), "bucketed timestamps");
            print_json(&hist)
        }
        Commands::Landmarks {
            input,
            offset,
            night_start,
        } => {
            let hist = read_histogram(&input)?;
            let options = SleepOptions {
                night_start_local: night_start,
            };
            let landmarks = Landmarks::detect(&hist);
            let report = LandmarkReport {
                offset,
                peak: landmarks.peak,
                global_lunch: landmarks.global_lunch,
                sleep: detect_sleep_with_options(&hist, offset, &options),
                lunch: detect_lunch(&hist, offset),
            };
            print_json(&report)
        }
    }
}

#[derive(Serialize)]
struct LandmarkReport {
    offset: i32,
    peak: Option<offset_engine::PeakWindow>,
    global_lunch: offset_engine::GlobalLunchPattern,
    sleep: offset_engine::SleepWindow,
    lunch: Option<offset_engine::LunchWindow>,
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
    }
}

fn read_histogram(path: &str) -> Result<ActivityHistogram> {
    let text = read_input(path)?;
    let hist: ActivityHistogram =
        serde_json::from_str(&text).context("Failed to parse histogram JSON")?;
    debug!(events = hist.total(), "loaded histogram");
    Ok(hist)
}

/// Parse one RFC 3339 timestamp per non-blank line and bucket it in UTC.
fn bucket_timestamps(text: &str) -> Result<ActivityHistogram> {
    let mut hist = ActivityHistogram::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let utc = DateTime::parse_from_rfc3339(line)
            .with_context(|| format!("Invalid timestamp on line {}: {line}", number + 1))?
            .with_timezone(&Utc);
        hist.record(f64::from(utc.hour()) + f64::from(utc.minute()) / 60.0);
    }
    Ok(hist)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
