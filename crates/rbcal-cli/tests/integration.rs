//! Integration tests for rbcal-cli.
//!
//! Tests invoke the `rbcal` binary on fixtures written to temporary
//! directories.

use rbcal_analysis::signal::convolve_response;
use rbcal_core::{Complex64, Mode, PoleZeroModel, Units};
use rbcal_io::{SampleFormat, read_paz, write_paz, write_trace};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the `rbcal` binary built by cargo.
fn rbcal_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rbcal"))
}

fn broadband() -> PoleZeroModel {
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

/// Excitation and the broadband sensor's response to it, in counts.
fn excitation(sample_rate: u32, n: usize) -> (Vec<f64>, Vec<f64>) {
    let input = random_binary(n, 0xdead_beef_cafe_f00d ^ n as u64);
    let acceleration = broadband()
        .converted(Mode::Acceleration, Units::Radians, 1.0)
        .unwrap();
    let output = convolve_response(&input, &acceleration, f64::from(sample_rate))
        .into_iter()
        .map(|v| v * 1.0e6)
        .collect();
    (input, output)
}

fn write_run(dir: &Path, sample_rate: u32, n: usize) {
    std::fs::create_dir_all(dir).unwrap();
    let (input, output) = excitation(sample_rate, n);
    write_trace(dir.join("BC0.wav"), &input, sample_rate, SampleFormat::Counts).unwrap();
    for code in ["BHZ", "BHN", "BHE"] {
        write_trace(dir.join(format!("{code}.wav")), &output, sample_rate, SampleFormat::Counts)
            .unwrap();
    }
    std::fs::write(dir.join("qcal.log"), "settling time = 0\ntrailer time = 0\n").unwrap();
}

// ---------------------------------------------------------------------------
// rbcal sensors
// ---------------------------------------------------------------------------

#[test]
fn cli_sensors_lists_factory_profiles() {
    let output = rbcal_bin().arg("sensors").output().expect("failed to run rbcal sensors");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["STS-2.5", "T-120", "STS-2", "orthogonal"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn cli_sensors_prints_one_profile_as_toml() {
    let output = rbcal_bin().args(["sensors", "t-120"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name = \"T-120\""), "got: {stdout}");
    assert!(stdout.contains("sensor_gain"));

    let output = rbcal_bin().args(["sensors", "CMG-3T-unknown"]).output().unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// rbcal paz / compare
// ---------------------------------------------------------------------------

#[test]
fn cli_paz_converts_and_writes() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("bb.paz");
    let converted = temp.path().join("bb_disp.paz");
    write_paz(&input, &broadband()).unwrap();

    let output = rbcal_bin()
        .args(["paz", input.to_str().unwrap(), "--mode", "disp", "--units", "hz", "-o"])
        .arg(&converted)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("displacement, hz"), "got: {stdout}");

    let model = read_paz(&converted).unwrap();
    assert_eq!(model.mode(), Mode::Displacement);
    assert_eq!(model.units(), Units::Hertz);
    assert_eq!(model.num_zeros(), 3);
}

#[test]
fn cli_paz_rejects_unknown_mode() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("bb.paz");
    write_paz(&input, &broadband()).unwrap();

    let output = rbcal_bin()
        .args(["paz", input.to_str().unwrap(), "--mode", "jerk"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("jerk"));
}

#[test]
fn cli_compare_self_is_in_spec() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bb.paz");
    write_paz(&path, &broadband()).unwrap();

    let output = rbcal_bin()
        .args(["compare", path.to_str().unwrap(), path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Max amplitude deviation: 0.0000%"), "got: {stdout}");
    assert!(stdout.contains("IN SPEC"));
}

// ---------------------------------------------------------------------------
// rbcal cross
// ---------------------------------------------------------------------------

#[test]
fn cli_cross_writes_json() {
    let temp = TempDir::new().unwrap();
    let (input, _) = excitation(20, 2048);
    let a = temp.path().join("a.wav");
    let b = temp.path().join("b.wav");
    let json = temp.path().join("cross.json");
    write_trace(&a, &input, 20, SampleFormat::Counts).unwrap();
    write_trace(&b, &input, 20, SampleFormat::Counts).unwrap();

    let output = rbcal_bin()
        .arg("cross")
        .args([&a, &b])
        .arg("-o")
        .arg(&json)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let spectrum: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    let gain = spectrum["gain"].as_array().unwrap();
    assert_eq!(gain.len(), 1024);
    assert!((gain[100].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn cli_cross_rejects_rate_mismatch() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.wav");
    let b = temp.path().join("b.wav");
    write_trace(&a, &[1.0; 64], 20, SampleFormat::Counts).unwrap();
    write_trace(&b, &[1.0; 64], 40, SampleFormat::Counts).unwrap();

    let output = rbcal_bin().arg("cross").args([&a, &b]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Sample rate mismatch"));
}

// ---------------------------------------------------------------------------
// rbcal calibrate
// ---------------------------------------------------------------------------

#[test]
fn cli_calibrate_unknown_sensor_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("run.toml");
    std::fs::write(
        &config,
        r#"
station = "TEST"
network = "XX"
sensor = "no-such-sensor-12345"
nominal_response = "bb.paz"

[low_frequency]
waveforms = "lf"
log = "lf/qcal.log"

[high_frequency]
waveforms = "hf"
log = "hf/qcal.log"
"#,
    )
    .unwrap();

    let output = rbcal_bin().arg("calibrate").arg(&config).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown sensor profile"), "got: {stderr}");
}

#[test]
fn cli_calibrate_end_to_end() {
    let temp = TempDir::new().unwrap();
    write_run(&temp.path().join("lf"), 1, 8192);
    write_run(&temp.path().join("hf"), 40, 16384);
    write_paz(temp.path().join("bb.paz"), &broadband()).unwrap();
    let config = temp.path().join("run.toml");
    std::fs::write(
        &config,
        r#"
station = "TEST"
network = "XX"
location = "00"
sensor = "orthogonal"
nominal_response = "bb.paz"
output_dir = "report"

[low_frequency]
waveforms = "lf"
log = "lf/qcal.log"

[high_frequency]
waveforms = "hf"
log = "hf/qcal.log"

[settings.lf_band]
low_hz = 0.003
high_hz = 0.3
norm_hz = 0.05
"#,
    )
    .unwrap();

    let output = rbcal_bin()
        .args(["calibrate", "--parallel"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Overall: IN SPEC"), "got: {stdout}");
    for file in [
        "amplitude.png",
        "phase.png",
        "calibrate_result.msg",
        "response.msg",
        "north.paz",
        "east.paz",
        "vertical.paz",
        "summary.json",
    ] {
        assert!(temp.path().join("report").join(file).is_file(), "missing {file}");
    }
}
