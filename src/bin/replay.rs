use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use dead_reckoning_rs::log_file::{load_log, save_log, DeadReckoningRecord};
use dead_reckoning_rs::types::{Provenance, TrackOutput};
use dead_reckoning_rs::{Tracker, TrackerConfig};

/// Batch replay: run the dead-reckoning core over stored sensor logs and
/// write each log back with the `dead_reckoning` objects filled in.
#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Annotate sensor logs with dead-reckoned positions", long_about = None)]
struct Args {
    /// Path to a sensor_log_*.json[.gz]
    #[arg(long, conflicts_with = "log_dir")]
    log: Option<PathBuf>,

    /// Directory of logs to batch replay (processes sensor_log_*.json[.gz])
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Where to write the annotated log (single-log mode only).
    /// Defaults to <input stem>_dr.json next to the input.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Fixes with horizontal accuracy at or above this are ignored (meters)
    #[arg(long, default_value = "30.0")]
    accuracy_threshold: f64,

    /// Maximum trusted dead-reckoning duration (seconds)
    #[arg(long, default_value = "180.0")]
    horizon: f64,

    /// Velocity decay rate (1/s)
    #[arg(long, default_value = "0.05")]
    velocity_decay: f64,

    /// Dead-reckoned speed ceiling (m/s)
    #[arg(long, default_value = "10.0")]
    max_speed: f64,

    /// Timestep clamp ceiling (seconds)
    #[arg(long, default_value = "1.0")]
    max_timestep: f64,
}

impl Args {
    fn config(&self) -> TrackerConfig {
        TrackerConfig {
            accuracy_threshold: self.accuracy_threshold,
            confidence_horizon: self.horizon,
            velocity_decay_rate: self.velocity_decay,
            max_speed: self.max_speed,
            max_timestep: self.max_timestep,
            ..TrackerConfig::default()
        }
    }
}

fn output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    // sensor_log_x.json    -> sensor_log_x_dr.json
    // sensor_log_x.json.gz -> sensor_log_x_dr.json.gz
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("log.json");
    let annotated = if let Some(stem) = name.strip_suffix(".json.gz") {
        format!("{stem}_dr.json.gz")
    } else if let Some(stem) = name.strip_suffix(".json") {
        format!("{stem}_dr.json")
    } else {
        format!("{name}_dr.json")
    };
    input.with_file_name(annotated)
}

fn run_once(path: &Path, args: &Args) -> Result<serde_json::Value> {
    let mut log = load_log(path)?;
    let mut tracker = Tracker::new(args.config());

    let mut gps_estimates = 0u64;
    let mut dr_estimates = 0u64;
    let mut no_fix_records = 0u64;
    let mut dropped_records = 0u64;
    let mut min_confidence = f64::INFINITY;
    let mut quality_histogram: BTreeMap<&'static str, u64> = BTreeMap::new();

    for record in &mut log.records {
        let sample = record.motion_sample();
        let fix = record.location_fix();
        if let Some(f) = fix.as_ref() {
            *quality_histogram.entry(f.quality().label()).or_insert(0) += 1;
        }

        record.dead_reckoning = match tracker.process(sample, fix) {
            TrackOutput::Estimate(est) => {
                match est.provenance {
                    Provenance::Gps => gps_estimates += 1,
                    Provenance::DeadReckoning => dr_estimates += 1,
                }
                min_confidence = min_confidence.min(est.confidence);
                Some(DeadReckoningRecord::from(&est))
            }
            TrackOutput::NoFix { .. } => {
                no_fix_records += 1;
                None
            }
            TrackOutput::Dropped { .. } => {
                dropped_records += 1;
                None
            }
        };
    }

    let out_path = output_path(path, args.output.as_deref());
    save_log(&out_path, &log)?;

    Ok(json!({
        "log": path.display().to_string(),
        "output": out_path.display().to_string(),
        "generated_at": Utc::now().to_rfc3339(),
        "records": log.records.len(),
        "gps_estimates": gps_estimates,
        "dead_reckoned_estimates": dr_estimates,
        "no_fix_records": no_fix_records,
        "dropped_records": dropped_records,
        "min_confidence": if min_confidence.is_finite() { min_confidence } else { 0.0 },
        "fix_quality": quality_histogram,
        "diagnostics": tracker.diagnostics(),
    }))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut results = Vec::new();

    if let Some(dir) = args.log_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !(name.starts_with("sensor_log_")
                && (name.ends_with(".json") || name.ends_with(".json.gz")))
                || name.contains("_dr.")
            {
                continue;
            }
            match run_once(&path, &args) {
                Ok(res) => results.push(res),
                Err(e) => eprintln!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        results.push(run_once(log, &args)?);
    } else {
        anyhow::bail!("Provide --log or --log-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
