//! Center-crop digital zoom.
//!
//! `zoom_frame` crops the middle `(height/z, width/z)` region and scales it
//! back to the original geometry. Bilinear (`Triangle`) interpolation is the
//! fixed resize algorithm for this crate; with it the transform is fully
//! deterministic for a given input frame and factor.

use image::imageops::{self, FilterType};

use crate::error::PipelineError;
use crate::frame::Frame;

/// Apply a digital zoom. Factors at or below 1.0 disable the transform and
/// return the input unchanged; a frame with zero width or height is invalid
/// input.
pub fn zoom_frame(frame: &Frame, factor: f32) -> Result<Frame, PipelineError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidFrame { width, height });
    }
    if factor <= 1.0 {
        return Ok(frame.clone());
    }

    // Integer-truncated crop size, clamped so an oversized factor still
    // leaves a one-pixel source region.
    let crop_w = ((width as f32 / factor) as u32).max(1);
    let crop_h = ((height as f32 / factor) as u32).max(1);
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;

    let cropped = imageops::crop_imm(frame.as_rgb(), x, y, crop_w, crop_h).to_image();
    let scaled = imageops::resize(&cropped, width, height, FilterType::Triangle);
    Ok(Frame::from_image(scaled))
}
