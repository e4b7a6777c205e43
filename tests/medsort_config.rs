use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use medsort::config::SorterConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "MEDSORT_CONFIG",
        "MEDSORT_DEVICE",
        "MEDSORT_SERIAL_PORT",
        "MEDSORT_API_URL",
        "MEDSORT_API_KEY",
        "MEDSORT_MODEL_ID",
        "MEDSORT_ZOOM_FACTOR",
        "MEDSORT_CONFIDENCE_THRESHOLD",
        "MEDSORT_DWELL_MS",
        "MEDSORT_SAVE_DIR",
        "MEDSORT_MEDICAL_CATEGORIES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_the_documented_surface() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SorterConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "/dev/video0");
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert_eq!(cfg.camera.warmup_frames, 5);
    assert_eq!(cfg.inference.model_id, "medical-waste/1");
    assert_eq!(cfg.inference.jpeg_quality, 85);
    assert!(cfg.actuator.port.is_none());
    assert_eq!(cfg.actuator.baud, 9_600);
    assert_eq!(cfg.actuator.dwell, Duration::from_millis(1_500));
    assert_eq!(cfg.decision.confidence_threshold, 0.35);
    assert_eq!(cfg.capture.zoom_factor, 2.0);
    for category in ["gloves", "masks", "medicine", "syringe"] {
        assert!(cfg.decision.medical_categories.contains(category));
    }

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "/dev/video2",
            "width": 800,
            "height": 600,
            "warmup_frames": 3
        },
        "inference": {
            "api_url": "https://detect.example.com",
            "api_key": "k-123",
            "model_id": "waste/7",
            "timeout_secs": 10,
            "jpeg_quality": 70
        },
        "actuator": {
            "port": "/dev/ttyUSB0",
            "baud": 115200,
            "dwell_ms": 2000
        },
        "decision": {
            "confidence_threshold": 0.5,
            "medical_categories": ["Gloves", "vials"]
        },
        "capture": {
            "zoom_factor": 1.5,
            "save_dir": "/tmp/medsort"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("MEDSORT_CONFIG", file.path());
    std::env::set_var("MEDSORT_DEVICE", "stub://bench");
    std::env::set_var("MEDSORT_CONFIDENCE_THRESHOLD", "0.6");
    std::env::set_var("MEDSORT_DWELL_MS", "250");

    let cfg = SorterConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.camera.warmup_frames, 3);
    assert_eq!(cfg.inference.api_url, "https://detect.example.com");
    assert_eq!(cfg.inference.api_key, "k-123");
    assert_eq!(cfg.inference.model_id, "waste/7");
    assert_eq!(cfg.inference.timeout, Duration::from_secs(10));
    assert_eq!(cfg.inference.jpeg_quality, 70);
    assert_eq!(cfg.actuator.port.as_deref(), Some("/dev/ttyUSB0"));
    assert_eq!(cfg.actuator.baud, 115_200);
    assert_eq!(cfg.actuator.dwell, Duration::from_millis(250));
    assert_eq!(cfg.decision.confidence_threshold, 0.6);
    assert_eq!(cfg.capture.zoom_factor, 1.5);
    assert_eq!(cfg.capture.save_dir.to_str(), Some("/tmp/medsort"));
    // Categories are normalized to lower case on load.
    assert!(cfg.decision.medical_categories.contains("gloves"));
    assert!(cfg.decision.medical_categories.contains("vials"));
    assert!(!cfg.decision.medical_categories.contains("Gloves"));

    clear_env();
}

#[test]
fn medical_categories_env_override_is_csv() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("MEDSORT_MEDICAL_CATEGORIES", "Bandages, scalpel ,syringe");
    let cfg = SorterConfig::load().expect("load config");

    assert_eq!(cfg.decision.medical_categories.len(), 3);
    assert!(cfg.decision.medical_categories.contains("bandages"));
    assert!(cfg.decision.medical_categories.contains("scalpel"));
    assert!(cfg.decision.medical_categories.contains("syringe"));

    clear_env();
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("MEDSORT_CONFIDENCE_THRESHOLD", "1.5");
    let result = SorterConfig::load();
    assert!(result.is_err());

    clear_env();
}

#[test]
fn non_positive_zoom_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("MEDSORT_ZOOM_FACTOR", "0");
    let result = SorterConfig::load();
    assert!(result.is_err());

    clear_env();
}
