//! Remote object-detection provider.
//!
//! The production provider encodes the frame as JPEG, POSTs it
//! base64-encoded to a hosted detection endpoint, and parses the returned
//! prediction list. Endpoint, key, and model id are configuration, not
//! behavior. `StaticProvider` returns a canned list for the demo binary and
//! hardware-free tests.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::frame::Frame;

/// One labeled, confidence-scored object report.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub category: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(category: impl Into<String>, confidence: f32) -> Self {
        Self {
            category: category.into(),
            confidence,
        }
    }
}

/// Returns the detections for one frame.
pub trait InferenceProvider {
    fn infer(&self, frame: &Frame) -> Result<Vec<Detection>, PipelineError>;
}

/// Configuration for the hosted detection endpoint.
#[derive(Clone, Debug)]
pub struct InferenceConfig {
    pub api_url: String,
    pub api_key: String,
    pub model_id: String,
    pub timeout: Duration,
    pub jpeg_quality: u8,
}

/// Blocking HTTP inference client.
pub struct HttpInferenceClient {
    config: InferenceConfig,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    predictions: Vec<WirePrediction>,
}

/// Wire-level prediction. A missing class label falls back to "unknown",
/// which can never match a medical category.
#[derive(Debug, Deserialize)]
struct WirePrediction {
    #[serde(default = "unknown_category")]
    class: String,
    #[serde(default)]
    confidence: f32,
}

fn unknown_category() -> String {
    "unknown".to_string()
}

impl HttpInferenceClient {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.model_id
        )
    }

    fn request(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let jpeg = frame.to_jpeg(self.config.jpeg_quality)?;
        let body = BASE64.encode(&jpeg);
        let response = ureq::post(&self.endpoint())
            .query("api_key", &self.config.api_key)
            .timeout(self.config.timeout)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(&body)
            .context("call detection endpoint")?;
        parse_response(response.into_reader())
    }
}

impl InferenceProvider for HttpInferenceClient {
    fn infer(&self, frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
        self.request(frame).map_err(|e| PipelineError::Provider {
            reason: format!("{:#}", e),
        })
    }
}

fn parse_response(reader: impl Read) -> Result<Vec<Detection>> {
    let parsed: InferenceResponse =
        serde_json::from_reader(reader).context("parse detection response")?;
    Ok(parsed
        .predictions
        .into_iter()
        .map(|p| Detection {
            category: p.class,
            confidence: p.confidence,
        })
        .collect())
}

/// Provider returning a fixed detection list.
pub struct StaticProvider {
    detections: Vec<Detection>,
}

impl StaticProvider {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl InferenceProvider for StaticProvider {
    fn infer(&self, _frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
        Ok(self.detections.clone())
    }
}
