//! demo - end-to-end synthetic run for the sorting pipeline
//!
//! Runs the full capture-classify-signal sequence with a stub camera, a
//! canned detection list, and a log-only actuator channel. Useful for
//! exercising the pipeline without a camera, an API key, or hardware.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use medsort::{
    Camera, CameraConfig, Detection, LogOnlyChannel, Pipeline, RunSettings, SignalCode,
    SignalSequencer, StaticProvider,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Dwell between the primary and idle signals, in milliseconds.
    #[arg(long, default_value_t = 1_500)]
    dwell_ms: u64,
    /// Output directory for the captured frame.
    #[arg(long, default_value = "demo_out")]
    out: String,
    /// Canned detections as category:confidence pairs.
    #[arg(long, default_value = "gloves:0.6,paper:0.2")]
    detections: String,
    /// Zoom factor applied to the synthetic frame.
    #[arg(long, default_value_t = 2.0)]
    zoom: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let detections = parse_detections(&args.detections)?;

    stage("build synthetic collaborators");
    let camera = Camera::new(CameraConfig {
        device: "stub://demo".to_string(),
        width: 320,
        height: 240,
        warmup_frames: 2,
    })?;
    let provider = StaticProvider::new(detections);
    let sequencer = SignalSequencer::new(LogOnlyChannel, Duration::from_millis(args.dwell_ms));

    let medical_categories: HashSet<String> = ["gloves", "masks", "medicine", "syringe"]
        .iter()
        .map(|category| category.to_string())
        .collect();
    let settings = RunSettings {
        zoom_factor: args.zoom,
        save_dir: PathBuf::from(&args.out),
        jpeg_quality: 85,
        confidence_threshold: 0.35,
        medical_categories,
    };

    stage("run pipeline");
    let mut pipeline = Pipeline::new(camera, provider, sequencer, settings);
    let result = pipeline.run();
    if let Err(e) = pipeline.close() {
        log::warn!("actuator channel close: {}", e);
    }
    let report = result?;

    println!("demo summary:");
    println!("  decision: {}", report.classification.outcome.as_str());
    for hit in &report.classification.hits {
        println!("  hit: {} ({:.1}%)", hit.category, hit.confidence * 100.0);
    }
    match &report.saved_path {
        Some(path) => println!("  capture: {}", path.display()),
        None => println!("  capture: not persisted"),
    }
    println!(
        "  signals: {} then {} after {} ms",
        report.signals.primary.as_str(),
        SignalCode::Idle.as_str(),
        args.dwell_ms
    );
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

fn parse_detections(raw: &str) -> Result<Vec<Detection>> {
    raw.split(',')
        .map(|pair| pair.trim())
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (category, confidence) = pair
                .split_once(':')
                .ok_or_else(|| anyhow!("expected category:confidence, got '{}'", pair))?;
            let confidence: f32 = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("invalid confidence in '{}'", pair))?;
            Ok(Detection::new(category.trim(), confidence))
        })
        .collect()
}
