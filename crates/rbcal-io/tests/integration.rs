//! Integration tests for rbcal-io: a calibration run written to disk as
//! traces, log and response file, loaded back, analysed and reported.

use rbcal_analysis::signal::convolve_response;
use rbcal_analysis::Calibration;
use rbcal_core::{
    Band, BandLimits, CalibrationSettings, Complex64, Component, Geometry, Mode, PazIndexMap,
    PoleZeroModel, SensorProfile, Units,
};
use rbcal_io::{
    SampleFormat, Station, load_calibration_run, read_paz, write_paz, write_report, write_trace,
};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Output scale so that rounding to integer counts is negligible.
const COUNTS_PER_UNIT: f64 = 1.0e6;

fn nominal() -> PoleZeroModel {
    let mut model = PoleZeroModel::from_parts(
        Mode::Velocity,
        Units::Radians,
        vec![
            Complex64::new(-0.037, 0.037),
            Complex64::new(-0.037, -0.037),
            Complex64::new(-50.0, 50.0),
            Complex64::new(-50.0, -50.0),
        ],
        vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
    );
    model.normalize_at(1.0);
    model
}

fn profile() -> SensorProfile {
    SensorProfile {
        name: "test-broadband".to_string(),
        description: None,
        sensor_gain: 1500.0,
        geometry: Geometry::Orthogonal,
        invert: vec![],
        lf_map: PazIndexMap::new(vec![0, 1], vec![]),
        hf_map: PazIndexMap::new(vec![2, 3], vec![]),
    }
}

fn settings() -> CalibrationSettings {
    CalibrationSettings {
        lf_band: BandLimits {
            low_hz: 0.003,
            high_hz: 0.3,
            norm_hz: 0.05,
        },
        ..CalibrationSettings::default()
    }
}

fn station() -> Station {
    Station {
        network: "XX".to_string(),
        station: "TEST".to_string(),
        location: "00".to_string(),
        channel_prefix: "BH".to_string(),
        instrument_type: "BB".to_string(),
    }
}

fn random_binary(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            if state >> 63 == 0 { 1.0 } else { -1.0 }
        })
        .collect()
}

/// Write one band's traces and log into `dir`.
fn write_run(dir: &Path, sample_rate: u32, n: usize) {
    std::fs::create_dir_all(dir).unwrap();
    let settle = 20 * sample_rate as usize;
    let trailer = 10 * sample_rate as usize;

    let mut input = vec![0.0; settle];
    input.extend(random_binary(n, 0x9e37_79b9_7f4a_7c15 ^ n as u64));
    input.extend(std::iter::repeat_n(0.0, trailer));

    let acceleration = nominal()
        .converted(Mode::Acceleration, Units::Radians, 1.0)
        .unwrap();
    let output: Vec<f64> = convolve_response(&input, &acceleration, f64::from(sample_rate))
        .into_iter()
        .map(|v| v * COUNTS_PER_UNIT)
        .collect();

    write_trace(dir.join("XX.TEST.00.BC0.wav"), &input, sample_rate, SampleFormat::Counts)
        .unwrap();
    for code in ["BHZ", "BHN", "BHE"] {
        let path = dir.join(format!("XX.TEST.00.{code}.wav"));
        write_trace(path, &output, sample_rate, SampleFormat::Counts).unwrap();
    }
    std::fs::write(
        dir.join("qcal.log"),
        "Q330 calibration\nsettling time = 20 s\ntrailer time = 10 s\n\
         start time = 2024-06-01 08:00:00\n",
    )
    .unwrap();
}

// ===========================================================================
// Loading
// ===========================================================================

#[test]
fn calibration_run_loads_with_timing() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("lf");
    write_run(&dir, 1, 512);

    let data = load_calibration_run(&dir, dir.join("qcal.log"), Band::Low, "BC?").unwrap();
    assert_eq!(data.band, Band::Low);
    assert_eq!(data.sample_rate, 1.0);
    assert_eq!(data.len(), 512 + 30);
    assert_eq!(data.settling_secs, 20.0);
    assert_eq!(data.trailer_secs, 10.0);
    assert_eq!(data.start.unwrap().to_rfc3339(), "2024-06-01T08:00:00+00:00");
    assert_eq!(data.output(Component::North), data.output(Component::Vertical));
}

#[test]
fn missing_log_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    write_run(tmp.path(), 1, 64);
    let err = load_calibration_run(tmp.path(), tmp.path().join("nope.log"), Band::Low, "BC?")
        .unwrap_err();
    assert!(matches!(err, rbcal_io::Error::Io(_)), "got: {err}");
}

#[test]
fn paz_file_roundtrip_on_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nominal.paz");
    write_paz(&path, &nominal()).unwrap();
    assert_eq!(read_paz(&path).unwrap(), nominal());
}

// ===========================================================================
// End-to-end report
// ===========================================================================

#[test]
fn report_from_files_on_disk() {
    let tmp = TempDir::new().unwrap();
    write_run(&tmp.path().join("lf"), 1, 8192);
    write_run(&tmp.path().join("hf"), 40, 16384);
    let paz_path = tmp.path().join("nominal.paz");
    write_paz(&paz_path, &nominal()).unwrap();

    let lf_dir = tmp.path().join("lf");
    let hf_dir = tmp.path().join("hf");
    let lf = load_calibration_run(&lf_dir, lf_dir.join("qcal.log"), Band::Low, "BC?").unwrap();
    let hf = load_calibration_run(&hf_dir, hf_dir.join("qcal.log"), Band::High, "BC?").unwrap();

    let calibration = Calibration::new(read_paz(&paz_path).unwrap(), profile(), settings()).unwrap();
    let outcome = calibration.run(lf, hf).unwrap();
    assert!(outcome.in_spec());

    let out = tmp.path().join("report");
    let artifacts = write_report(&out, &outcome, &station()).unwrap();

    for path in [
        &artifacts.amplitude_plot,
        &artifacts.phase_plot,
        &artifacts.calibrate_result,
        &artifacts.response,
        &artifacts.summary,
    ] {
        assert!(path.is_file(), "missing {}", path.display());
    }
    assert_eq!(artifacts.paz_files.len(), 3);
    let north = read_paz(out.join("north.paz")).unwrap();
    assert_eq!(north.num_poles(), 4);

    // Analysis starts after 20 s settling and a 409 s taper cut
    let result = std::fs::read_to_string(&artifacts.calibrate_result).unwrap();
    assert!(result.contains("MSG_ID TEST_20240601080709 XX"), "{result}");
    assert_eq!(result.lines().filter(|l| l.starts_with("TEST  BHZ 00   yes")).count(), 1);

    let response = std::fs::read_to_string(&artifacts.response).unwrap();
    assert_eq!(response.lines().filter(|l| l.starts_with("CAL2 TEST  BH")).count(), 3);
    assert_eq!(response.lines().filter(|l| l.starts_with("PAZ2  1 V")).count(), 3);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifacts.summary).unwrap()).unwrap();
    assert_eq!(summary["in_spec"], true);
    assert_eq!(summary["components"].as_array().unwrap().len(), 3);
}
