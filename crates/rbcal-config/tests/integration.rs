//! Integration tests for rbcal-config.
//!
//! These tests verify end-to-end functionality across modules.

use rbcal_config::{
    BandRun, ConfigError, FileOp, RunConfig, ValidationError, factory_sensors, load_sensor_profile,
    validate_run_config,
};
use rbcal_core::CalibrationSettings;
use std::path::PathBuf;
use tempfile::TempDir;

fn config() -> RunConfig {
    RunConfig {
        station: "ANMO".to_string(),
        network: "IU".to_string(),
        location: "00".to_string(),
        channel_prefix: "BH".to_string(),
        instrument_type: None,
        sensor: "T-120".to_string(),
        nominal_response: PathBuf::from("t120.paz"),
        input_channel: "BC?".to_string(),
        output_dir: PathBuf::from("out"),
        low_frequency: BandRun {
            waveforms: PathBuf::from("lf"),
            log: PathBuf::from("lf/qcal.log"),
        },
        high_frequency: BandRun {
            waveforms: PathBuf::from("hf"),
            log: PathBuf::from("hf/qcal.log"),
        },
        settings: CalibrationSettings::default(),
        sensors: vec![],
    }
}

/// Save then load resolves relative paths against the file's directory.
#[test]
fn test_save_load_resolves_paths() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("run.toml");

    config().save(&path).unwrap();
    let loaded = RunConfig::load(&path).unwrap();

    let base = temp_dir.path().join("nested");
    assert_eq!(loaded.nominal_response, base.join("t120.paz"));
    assert_eq!(loaded.low_frequency.waveforms, base.join("lf"));
    assert_eq!(loaded.high_frequency.log, base.join("hf/qcal.log"));
    assert_eq!(loaded.output_dir, base.join("out"));
    assert_eq!(loaded.settings, config().settings);
}

#[test]
fn test_load_missing_file() {
    let err = RunConfig::load("/nonexistent/run-12345.toml").unwrap_err();
    assert!(matches!(err, ConfigError::File { op: FileOp::Read, .. }));
}

#[test]
fn test_load_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("run.toml");
    std::fs::write(&path, "station = [unterminated").unwrap();
    assert!(matches!(RunConfig::load(&path), Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_validation_of_run_config() {
    assert_eq!(validate_run_config(&config()), Ok(()));

    let mut bad = config();
    bad.sensor = "no-such-sensor-12345".to_string();
    bad.settings.amplitude_tolerance_pct = 0.0;
    match validate_run_config(&bad) {
        Err(ValidationError::Multiple(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.contains(&ValidationError::UnknownSensor(bad.sensor.clone())));
        }
        other => panic!("expected two errors, got {other:?}"),
    }
}

/// A factory profile saved as a user file loads back identically.
#[test]
fn test_factory_profile_as_user_file() {
    let temp_dir = TempDir::new().unwrap();
    for profile in factory_sensors() {
        let path = temp_dir.path().join(format!("{}.toml", profile.name));
        std::fs::write(&path, toml::to_string(&profile).unwrap()).unwrap();
        let loaded = load_sensor_profile(&path).unwrap();
        assert_eq!(loaded.name, profile.name);
        assert_eq!(loaded.hf_map, profile.hf_map);
        assert_eq!(loaded.invert, profile.invert);
    }
}
