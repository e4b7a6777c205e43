//! In-memory frame representation.
//!
//! One captured RGB8 raster, owned by the orchestrator for the duration of a
//! single run. Frames carry no capture-time state and nothing outlives the
//! run.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::PipelineError;

/// A width x height x 3 raster of 8-bit channels.
#[derive(Clone, Debug)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wrap packed RGB bytes. Fails when the byte count does not match the
    /// stated geometry.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PipelineError> {
        let image = RgbImage::from_raw(width, height, data)
            .ok_or(PipelineError::InvalidFrame { width, height })?;
        Ok(Self { image })
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as JPEG at the given quality.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder.encode_image(&self.image).context("encode jpeg")?;
        Ok(bytes)
    }
}
