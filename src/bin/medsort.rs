//! medsort - single-shot capture, classify, and actuator signaling.
//!
//! One invocation performs one run:
//! 1. Grabs a frame from the configured camera (after a short warmup)
//! 2. Applies the digital zoom
//! 3. Saves the frame as a timestamped JPEG (best effort)
//! 4. Submits the frame to the hosted detection endpoint
//! 5. Classifies the detections as medical or non-medical
//! 6. Sends the decision code to the actuator, dwells, then sends idle

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use medsort::{
    ActuatorChannel, Camera, CameraConfig, HttpInferenceClient, InferenceConfig, LogOnlyChannel,
    Pipeline, RunSettings, SignalCode, SignalSequencer, SorterConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera index (maps to /dev/video<N>).
    #[arg(long)]
    cam: Option<u32>,
    /// Camera device path or stub://<name>; takes precedence over --cam.
    #[arg(long)]
    device: Option<String>,
    /// Serial port for the actuator (e.g. /dev/ttyUSB0). Omit to log
    /// signals only.
    #[arg(long)]
    port: Option<String>,
    /// Zoom factor; values at or below 1.0 disable the zoom.
    #[arg(long)]
    zoom: Option<f32>,
    /// Confidence threshold for the decision engine.
    #[arg(long)]
    threshold: Option<f32>,
    /// Directory for the captured JPEG.
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = SorterConfig::load()?;
    if let Some(cam) = args.cam {
        cfg.camera.device = format!("/dev/video{}", cam);
    }
    if let Some(device) = args.device {
        cfg.camera.device = device;
    }
    if let Some(port) = args.port {
        cfg.actuator.port = Some(port);
    }
    if let Some(zoom) = args.zoom {
        cfg.capture.zoom_factor = zoom;
    }
    if let Some(threshold) = args.threshold {
        cfg.decision.confidence_threshold = threshold;
    }
    if let Some(dir) = args.save_dir {
        cfg.capture.save_dir = dir;
    }
    cfg.validate()?;

    if cfg.inference.api_key.is_empty() {
        return Err(anyhow!(
            "inference api key is required; set MEDSORT_API_KEY or inference.api_key in the config file"
        ));
    }

    let camera = Camera::new(CameraConfig {
        device: cfg.camera.device.clone(),
        width: cfg.camera.width,
        height: cfg.camera.height,
        warmup_frames: cfg.camera.warmup_frames,
    })?;
    let provider = HttpInferenceClient::new(InferenceConfig {
        api_url: cfg.inference.api_url.clone(),
        api_key: cfg.inference.api_key.clone(),
        model_id: cfg.inference.model_id.clone(),
        timeout: cfg.inference.timeout,
        jpeg_quality: cfg.inference.jpeg_quality,
    });
    let channel = open_channel(&cfg);
    let sequencer = SignalSequencer::new(channel, cfg.actuator.dwell);

    let settings = RunSettings {
        zoom_factor: cfg.capture.zoom_factor,
        save_dir: cfg.capture.save_dir.clone(),
        jpeg_quality: cfg.inference.jpeg_quality,
        confidence_threshold: cfg.decision.confidence_threshold,
        medical_categories: cfg.decision.medical_categories.clone(),
    };

    let mut pipeline = Pipeline::new(camera, provider, sequencer, settings);
    let result = pipeline.run();
    if let Err(e) = pipeline.close() {
        log::warn!("actuator channel close: {}", e);
    }
    let report = result.context("pipeline run failed")?;

    println!("decision: {}", report.classification.outcome.as_str());
    for hit in &report.classification.hits {
        println!("  {} ({:.1}%)", hit.category, hit.confidence * 100.0);
    }
    if let Some(path) = &report.saved_path {
        println!("capture: {}", path.display());
    }
    println!(
        "signals: {} then {}",
        report.signals.primary.as_str(),
        SignalCode::Idle.as_str()
    );
    Ok(())
}

/// Open the configured actuator channel. A missing or unopenable serial
/// port degrades to log-only signaling rather than aborting the run.
fn open_channel(cfg: &SorterConfig) -> Box<dyn ActuatorChannel> {
    let Some(port) = cfg.actuator.port.as_deref() else {
        log::info!("no serial port configured; signals will be logged only");
        return Box::new(LogOnlyChannel);
    };
    #[cfg(feature = "serial-actuator")]
    {
        match medsort::SerialChannel::open(port, cfg.actuator.baud) {
            Ok(channel) => {
                log::info!("actuator on {} at {} baud", port, cfg.actuator.baud);
                Box::new(channel)
            }
            Err(e) => {
                log::warn!("could not open {}: {}; signals will be logged only", port, e);
                Box::new(LogOnlyChannel)
            }
        }
    }
    #[cfg(not(feature = "serial-actuator"))]
    {
        log::warn!(
            "serial port {} configured but built without the serial-actuator feature; signals will be logged only",
            port
        );
        Box::new(LogOnlyChannel)
    }
}
