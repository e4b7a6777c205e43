//! Error taxonomy for the sorting pipeline.
//!
//! Fatal errors (`PipelineError`) terminate the run before the actuator is
//! signaled. `PersistenceError` and `ChannelError` are non-fatal: the
//! orchestrator logs them and keeps going. Nothing is retried.

use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Camera could not be opened or read.
    #[error("camera '{device}' unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// Frame with degenerate geometry.
    #[error("invalid frame geometry {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    /// The remote inference call failed.
    #[error("inference provider: {reason}")]
    Provider { reason: String },
}

/// Actuator transmit or close failure.
///
/// Non-fatal: the signal sequence continues past it, and the caller chooses
/// to log or ignore the result.
#[derive(Clone, Debug, Error)]
#[error("actuator channel: {reason}")]
pub struct ChannelError {
    pub reason: String,
}

impl ChannelError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Frame persistence failure. Non-fatal, logged by the orchestrator.
#[derive(Debug, Error)]
#[error("save frame: {reason}")]
pub struct PersistenceError {
    pub reason: String,
}

impl PersistenceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
