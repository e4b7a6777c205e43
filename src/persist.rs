//! Best-effort frame persistence.
//!
//! One timestamped JPEG per run. Callers treat failure here as non-fatal;
//! the pipeline logs it and keeps going.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::PersistenceError;
use crate::frame::Frame;

/// Write the frame as `captured_<timestamp>.jpg` under `dir`, creating the
/// directory first.
pub fn save_frame(frame: &Frame, dir: &Path, quality: u8) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir)
        .map_err(|e| PersistenceError::new(format!("create {}: {}", dir.display(), e)))?;
    let filename = format!("captured_{}.jpg", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    let jpeg = frame
        .to_jpeg(quality)
        .map_err(|e| PersistenceError::new(format!("{:#}", e)))?;
    fs::write(&path, jpeg)
        .map_err(|e| PersistenceError::new(format!("write {}: {}", path.display(), e)))?;
    Ok(path)
}
