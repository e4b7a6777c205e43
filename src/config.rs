//! Configuration surface.
//!
//! All pipeline constants live here and are overridable: a JSON config file
//! pointed to by `MEDSORT_CONFIG`, then `MEDSORT_*` environment variables,
//! then CLI flags applied by the binary. Nothing is a process-wide
//! singleton; the loaded struct is passed into the pipeline explicitly.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_DEVICE: &str = "/dev/video0";
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_WARMUP_FRAMES: u32 = 5;
const DEFAULT_API_URL: &str = "https://serverless.roboflow.com";
const DEFAULT_MODEL_ID: &str = "medical-waste/1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JPEG_QUALITY: u8 = 85;
const DEFAULT_BAUD: u32 = 9_600;
const DEFAULT_DWELL_MS: u64 = 1_500;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;
const DEFAULT_ZOOM_FACTOR: f32 = 2.0;
const DEFAULT_SAVE_DIR: &str = "captures";
const DEFAULT_MEDICAL_CATEGORIES: [&str; 4] = ["gloves", "masks", "medicine", "syringe"];

#[derive(Debug, Deserialize, Default)]
struct SorterConfigFile {
    camera: Option<CameraConfigFile>,
    inference: Option<InferenceConfigFile>,
    actuator: Option<ActuatorConfigFile>,
    decision: Option<DecisionConfigFile>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    warmup_frames: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct InferenceConfigFile {
    api_url: Option<String>,
    api_key: Option<String>,
    model_id: Option<String>,
    timeout_secs: Option<u64>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct ActuatorConfigFile {
    port: Option<String>,
    baud: Option<u32>,
    dwell_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DecisionConfigFile {
    confidence_threshold: Option<f32>,
    medical_categories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    zoom_factor: Option<f32>,
    save_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SorterConfig {
    pub camera: CameraSettings,
    pub inference: InferenceSettings,
    pub actuator: ActuatorSettings,
    pub decision: DecisionSettings,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub warmup_frames: u32,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub api_url: String,
    pub api_key: String,
    pub model_id: String,
    pub timeout: Duration,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone)]
pub struct ActuatorSettings {
    /// Serial port for the actuator. `None` means log-only signaling.
    pub port: Option<String>,
    pub baud: u32,
    /// Hold time between the primary signal and the idle reset.
    pub dwell: Duration,
}

#[derive(Debug, Clone)]
pub struct DecisionSettings {
    pub confidence_threshold: f32,
    pub medical_categories: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub zoom_factor: f32,
    pub save_dir: PathBuf,
}

impl SorterConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MEDSORT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SorterConfigFile) -> Self {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_HEIGHT),
            warmup_frames: file
                .camera
                .as_ref()
                .and_then(|camera| camera.warmup_frames)
                .unwrap_or(DEFAULT_WARMUP_FRAMES),
        };
        let inference = InferenceSettings {
            api_url: file
                .inference
                .as_ref()
                .and_then(|inference| inference.api_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: file
                .inference
                .as_ref()
                .and_then(|inference| inference.api_key.clone())
                .unwrap_or_default(),
            model_id: file
                .inference
                .as_ref()
                .and_then(|inference| inference.model_id.clone())
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            timeout: Duration::from_secs(
                file.inference
                    .as_ref()
                    .and_then(|inference| inference.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            jpeg_quality: file
                .inference
                .as_ref()
                .and_then(|inference| inference.jpeg_quality)
                .unwrap_or(DEFAULT_JPEG_QUALITY),
        };
        let actuator = ActuatorSettings {
            port: file.actuator.as_ref().and_then(|actuator| actuator.port.clone()),
            baud: file
                .actuator
                .as_ref()
                .and_then(|actuator| actuator.baud)
                .unwrap_or(DEFAULT_BAUD),
            dwell: Duration::from_millis(
                file.actuator
                    .as_ref()
                    .and_then(|actuator| actuator.dwell_ms)
                    .unwrap_or(DEFAULT_DWELL_MS),
            ),
        };
        let decision = DecisionSettings {
            confidence_threshold: file
                .decision
                .as_ref()
                .and_then(|decision| decision.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            medical_categories: file
                .decision
                .and_then(|decision| decision.medical_categories)
                .map(|categories| categories.into_iter().collect())
                .unwrap_or_else(default_medical_categories),
        };
        let capture = CaptureSettings {
            zoom_factor: file
                .capture
                .as_ref()
                .and_then(|capture| capture.zoom_factor)
                .unwrap_or(DEFAULT_ZOOM_FACTOR),
            save_dir: file
                .capture
                .and_then(|capture| capture.save_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
        };
        Self {
            camera,
            inference,
            actuator,
            decision,
            capture,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("MEDSORT_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(port) = std::env::var("MEDSORT_SERIAL_PORT") {
            if !port.trim().is_empty() {
                self.actuator.port = Some(port);
            }
        }
        if let Ok(url) = std::env::var("MEDSORT_API_URL") {
            if !url.trim().is_empty() {
                self.inference.api_url = url;
            }
        }
        if let Ok(key) = std::env::var("MEDSORT_API_KEY") {
            if !key.trim().is_empty() {
                self.inference.api_key = key;
            }
        }
        if let Ok(model) = std::env::var("MEDSORT_MODEL_ID") {
            if !model.trim().is_empty() {
                self.inference.model_id = model;
            }
        }
        if let Ok(zoom) = std::env::var("MEDSORT_ZOOM_FACTOR") {
            self.capture.zoom_factor = zoom
                .parse()
                .map_err(|_| anyhow!("MEDSORT_ZOOM_FACTOR must be a number"))?;
        }
        if let Ok(threshold) = std::env::var("MEDSORT_CONFIDENCE_THRESHOLD") {
            self.decision.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("MEDSORT_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        if let Ok(dwell) = std::env::var("MEDSORT_DWELL_MS") {
            let millis: u64 = dwell
                .parse()
                .map_err(|_| anyhow!("MEDSORT_DWELL_MS must be an integer number of milliseconds"))?;
            self.actuator.dwell = Duration::from_millis(millis);
        }
        if let Ok(dir) = std::env::var("MEDSORT_SAVE_DIR") {
            if !dir.trim().is_empty() {
                self.capture.save_dir = PathBuf::from(dir);
            }
        }
        if let Ok(categories) = std::env::var("MEDSORT_MEDICAL_CATEGORIES") {
            let parsed = split_csv(&categories);
            if !parsed.is_empty() {
                self.decision.medical_categories = parsed.into_iter().collect();
            }
        }
        Ok(())
    }

    /// Check invariants and normalize category case. The binary calls this
    /// again after applying CLI overrides.
    pub fn validate(&mut self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera capture size must be non-zero"));
        }
        Url::parse(&self.inference.api_url)
            .map_err(|e| anyhow!("invalid inference api_url: {}", e))?;
        if !(1..=100).contains(&self.inference.jpeg_quality) {
            return Err(anyhow!("jpeg quality must be within 1..=100"));
        }
        if !self.capture.zoom_factor.is_finite() || self.capture.zoom_factor <= 0.0 {
            return Err(anyhow!("zoom factor must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.decision.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within [0, 1]"));
        }
        if self.actuator.dwell.is_zero() {
            return Err(anyhow!("dwell must be greater than zero"));
        }
        if self.decision.medical_categories.is_empty() {
            return Err(anyhow!("medical category set must not be empty"));
        }
        self.decision.medical_categories = self
            .decision
            .medical_categories
            .iter()
            .map(|category| category.to_lowercase())
            .collect();
        Ok(())
    }
}

fn default_medical_categories() -> HashSet<String> {
    DEFAULT_MEDICAL_CATEGORIES
        .iter()
        .map(|category| category.to_string())
        .collect()
}

fn read_config_file(path: &Path) -> Result<SorterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
