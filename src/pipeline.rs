//! Single-shot pipeline orchestration.
//!
//! One run: capture a frame, zoom, persist, infer, classify, signal. The
//! run is strictly sequential with one frame in flight. Capture and
//! inference failures are fatal and return before anything is signaled;
//! persistence and channel failures are logged and the run continues.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::camera::FrameSource;
use crate::decide::{classify, Classification};
use crate::error::{ChannelError, PipelineError};
use crate::infer::InferenceProvider;
use crate::persist;
use crate::signal::{ActuatorChannel, SequenceReport, SignalSequencer};
use crate::zoom::zoom_frame;

/// Per-run knobs the orchestrator needs beyond its collaborators.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub zoom_factor: f32,
    pub save_dir: PathBuf,
    pub jpeg_quality: u8,
    pub confidence_threshold: f32,
    pub medical_categories: HashSet<String>,
}

/// What one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub classification: Classification,
    pub saved_path: Option<PathBuf>,
    pub signals: SequenceReport,
}

/// Orchestrates one capture-classify-signal run over injected collaborators.
pub struct Pipeline<S, P, C> {
    source: S,
    provider: P,
    sequencer: SignalSequencer<C>,
    settings: RunSettings,
}

impl<S, P, C> Pipeline<S, P, C>
where
    S: FrameSource,
    P: InferenceProvider,
    C: ActuatorChannel,
{
    pub fn new(
        source: S,
        provider: P,
        sequencer: SignalSequencer<C>,
        settings: RunSettings,
    ) -> Self {
        Self {
            source,
            provider,
            sequencer,
            settings,
        }
    }

    /// Run the single-shot sequence to completion or fatal failure.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        let frame = self.source.capture()?;
        let frame = zoom_frame(&frame, self.settings.zoom_factor)?;

        let saved_path = match persist::save_frame(
            &frame,
            &self.settings.save_dir,
            self.settings.jpeg_quality,
        ) {
            Ok(path) => {
                log::info!("saved captured frame to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("frame not persisted: {}", e);
                None
            }
        };

        let detections = self.provider.infer(&frame)?;
        let classification = classify(
            &detections,
            self.settings.confidence_threshold,
            &self.settings.medical_categories,
        );

        if classification.hits.is_empty() {
            log::info!(
                "no detections at or above threshold {}",
                self.settings.confidence_threshold
            );
        }
        for hit in &classification.hits {
            log::info!("detected: {} ({:.1}%)", hit.category, hit.confidence * 100.0);
        }
        log::info!("decision: {}", classification.outcome.as_str());

        let signals = self.sequencer.run(classification.outcome);
        if let Err(e) = &signals.primary_result {
            log::warn!("primary signal not delivered: {}", e);
        }
        if let Err(e) = &signals.idle_result {
            log::warn!("idle signal not delivered: {}", e);
        }

        Ok(RunReport {
            classification,
            saved_path,
            signals,
        })
    }

    /// Release the actuator channel. Called on every exit path by the
    /// binaries, including after fatal errors.
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.sequencer.close()
    }
}
