//! End-to-end pipeline runs over synthetic collaborators.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use medsort::{
    ActuatorChannel, Camera, CameraConfig, ChannelError, Detection, Frame, InferenceProvider,
    Outcome, Pipeline, PipelineError, RunSettings, SignalCode, SignalSequencer, StaticProvider,
};

const DWELL: Duration = Duration::from_millis(10);

/// Shared transmission log so tests can inspect the channel after the
/// pipeline has consumed it.
#[derive(Clone, Default)]
struct SignalLog(Arc<Mutex<Vec<(SignalCode, Instant)>>>);

impl SignalLog {
    fn sent(&self) -> Vec<SignalCode> {
        self.0.lock().unwrap().iter().map(|(code, _)| *code).collect()
    }

    fn gap(&self) -> Duration {
        let sent = self.0.lock().unwrap();
        assert!(sent.len() >= 2, "expected at least two transmissions");
        sent[1].1.duration_since(sent[0].1)
    }
}

struct RecordingChannel {
    log: SignalLog,
    fail_first: bool,
}

impl RecordingChannel {
    fn new(log: SignalLog) -> Self {
        Self {
            log,
            fail_first: false,
        }
    }

    fn failing_first(log: SignalLog) -> Self {
        Self {
            log,
            fail_first: true,
        }
    }
}

impl ActuatorChannel for RecordingChannel {
    fn transmit(&mut self, code: SignalCode) -> Result<(), ChannelError> {
        let mut sent = self.log.0.lock().unwrap();
        sent.push((code, Instant::now()));
        if self.fail_first && sent.len() == 1 {
            return Err(ChannelError::new("injected write failure"));
        }
        Ok(())
    }
}

struct FailingProvider;

impl InferenceProvider for FailingProvider {
    fn infer(&self, _frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
        Err(PipelineError::Provider {
            reason: "endpoint unreachable".to_string(),
        })
    }
}

fn stub_camera() -> Camera {
    Camera::new(CameraConfig {
        device: "stub://bench".to_string(),
        width: 64,
        height: 48,
        warmup_frames: 2,
    })
    .unwrap()
}

fn settings(save_dir: PathBuf) -> RunSettings {
    RunSettings {
        zoom_factor: 2.0,
        save_dir,
        jpeg_quality: 85,
        confidence_threshold: 0.35,
        medical_categories: ["gloves", "masks", "medicine", "syringe"]
            .iter()
            .map(|category| category.to_string())
            .collect::<HashSet<String>>(),
    }
}

#[test]
fn medical_detection_drives_medical_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let provider = StaticProvider::new(vec![
        Detection::new("gloves", 0.6),
        Detection::new("paper", 0.2),
    ]);
    let sequencer = SignalSequencer::new(RecordingChannel::new(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        provider,
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let report = pipeline.run().unwrap();

    assert_eq!(report.classification.outcome, Outcome::Medical);
    assert_eq!(
        report.classification.hits,
        vec![Detection::new("gloves", 0.6)]
    );
    assert_eq!(log.sent(), vec![SignalCode::Medical, SignalCode::Idle]);
    assert!(log.gap() >= DWELL);
}

#[test]
fn non_medical_detection_drives_non_medical_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let provider = StaticProvider::new(vec![Detection::new("paper", 0.9)]);
    let sequencer = SignalSequencer::new(RecordingChannel::new(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        provider,
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let report = pipeline.run().unwrap();

    assert_eq!(report.classification.outcome, Outcome::NonMedical);
    assert_eq!(
        report.classification.hits,
        vec![Detection::new("paper", 0.9)]
    );
    assert_eq!(log.sent(), vec![SignalCode::NonMedical, SignalCode::Idle]);
}

#[test]
fn empty_detections_drive_non_medical_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let sequencer = SignalSequencer::new(RecordingChannel::new(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        StaticProvider::new(Vec::new()),
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let report = pipeline.run().unwrap();

    assert_eq!(report.classification.outcome, Outcome::NonMedical);
    assert!(report.classification.hits.is_empty());
    assert_eq!(log.sent(), vec![SignalCode::NonMedical, SignalCode::Idle]);
}

#[test]
fn idle_still_sent_when_primary_transmit_fails() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let provider = StaticProvider::new(vec![Detection::new("syringe", 0.8)]);
    let sequencer = SignalSequencer::new(RecordingChannel::failing_first(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        provider,
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let report = pipeline.run().unwrap();

    assert!(report.signals.primary_result.is_err());
    assert!(report.signals.idle_result.is_ok());
    assert_eq!(log.sent(), vec![SignalCode::Medical, SignalCode::Idle]);
}

#[test]
fn provider_failure_aborts_before_any_signaling() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let sequencer = SignalSequencer::new(RecordingChannel::new(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        FailingProvider,
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let result = pipeline.run();

    assert!(matches!(result, Err(PipelineError::Provider { .. })));
    assert!(log.sent().is_empty());
}

#[test]
fn persistence_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"occupied").unwrap();

    let log = SignalLog::default();
    let provider = StaticProvider::new(vec![Detection::new("paper", 0.9)]);
    let sequencer = SignalSequencer::new(RecordingChannel::new(log.clone()), DWELL);

    let mut pipeline = Pipeline::new(stub_camera(), provider, sequencer, settings(blocked));
    let report = pipeline.run().unwrap();

    assert!(report.saved_path.is_none());
    assert_eq!(log.sent(), vec![SignalCode::NonMedical, SignalCode::Idle]);
}

#[test]
fn run_persists_one_capture() {
    let dir = tempfile::tempdir().unwrap();
    let log = SignalLog::default();
    let provider = StaticProvider::new(Vec::new());
    let sequencer = SignalSequencer::new(RecordingChannel::new(log), DWELL);

    let mut pipeline = Pipeline::new(
        stub_camera(),
        provider,
        sequencer,
        settings(dir.path().to_path_buf()),
    );
    let report = pipeline.run().unwrap();

    let saved = report.saved_path.expect("capture should be persisted");
    assert!(saved.exists());
    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}
