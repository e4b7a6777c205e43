//! Medical-waste sorting station.
//!
//! This crate implements a single-shot workflow: acquire one frame from a
//! camera, apply a center-crop digital zoom, persist the frame, submit it to
//! a remote object-detection service, classify the detections against a
//! medical category set, and drive an actuator over a serial link with a
//! dwell-then-idle signal sequence.
//!
//! # Module structure
//!
//! - `camera`: frame acquisition (V4L2 device or `stub://` synthetic)
//! - `zoom`: center-crop digital zoom transform
//! - `persist`: best-effort timestamped JPEG write
//! - `infer`: remote object-detection provider
//! - `decide`: confidence-thresholded medical/non-medical decision
//! - `signal`: actuator codes and the dwell-then-idle sequencer
//! - `pipeline`: single-shot orchestration and its failure policy
//! - `config`: file + environment + CLI configuration surface

pub mod camera;
pub mod config;
pub mod decide;
pub mod error;
pub mod frame;
pub mod infer;
pub mod persist;
pub mod pipeline;
pub mod signal;
pub mod zoom;

pub use camera::{Camera, CameraConfig, FrameSource};
pub use config::SorterConfig;
pub use decide::{classify, Classification, Outcome};
pub use error::{ChannelError, PersistenceError, PipelineError};
pub use frame::Frame;
pub use infer::{
    Detection, HttpInferenceClient, InferenceConfig, InferenceProvider, StaticProvider,
};
pub use pipeline::{Pipeline, RunReport, RunSettings};
#[cfg(feature = "serial-actuator")]
pub use signal::SerialChannel;
pub use signal::{
    signal_for, ActuatorChannel, LogOnlyChannel, SequenceReport, SignalCode, SignalSequencer,
};
pub use zoom::zoom_frame;
