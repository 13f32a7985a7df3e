//! Waveform directories: one mono trace per channel.
//!
//! A calibration run is stored as a directory of WAV files named
//! `<anything>.<CHANNEL>.wav` (or just `<CHANNEL>.wav`). The excitation
//! input is the single trace whose channel code matches the input pattern;
//! the remaining traces are classified onto the north, east and vertical
//! slots by their orientation character.

use crate::calib_log::read_log;
use crate::wav::read_trace;
use crate::{Error, Result};
use rbcal_core::{Band, CalibrationDataSet, Component};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum number of traces in a waveform directory.
const MIN_TRACES: usize = 4;

/// Traces of one calibration run, aligned and truncated to equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveforms {
    /// Common sample rate in Hz.
    pub sample_rate: f64,
    /// Channel code of the excitation trace.
    pub input_channel: String,
    /// Excitation samples.
    pub input: Vec<f64>,
    /// Channel codes of the output traces, `[north, east, vertical]`.
    pub output_channels: [String; 3],
    /// Output samples, `[north, east, vertical]`.
    pub outputs: [Vec<f64>; 3],
}

impl Waveforms {
    /// Number of samples per trace.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// True when the traces hold no samples.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Wrap the traces in a data set for `band`.
    pub fn into_dataset(self, band: Band) -> Result<CalibrationDataSet> {
        Ok(CalibrationDataSet::new(band, self.sample_rate, self.input, self.outputs)?)
    }
}

/// Channel code of a trace file: the last dot-separated component of the
/// file stem.
pub fn channel_code(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let code = stem.rsplit('.').next()?;
    (!code.is_empty()).then(|| code.to_string())
}

/// SEED-style wildcard match: `?` matches one character, a trailing `*`
/// matches any remainder. Comparison ignores ASCII case.
pub fn matches_pattern(code: &str, pattern: &str) -> bool {
    let (pattern, open_ended) = match pattern.strip_suffix('*') {
        Some(prefix) => (prefix, true),
        None => (pattern, false),
    };
    let code: Vec<char> = code.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    if code.len() < pattern.len() || (!open_ended && code.len() != pattern.len()) {
        return false;
    }
    pattern
        .iter()
        .zip(&code)
        .all(|(p, c)| *p == '?' || p.eq_ignore_ascii_case(c))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn waveform_error(dir: &Path, reason: impl Into<String>) -> Error {
    Error::Waveform {
        dir: dir.to_path_buf(),
        reason: reason.into(),
    }
}

/// Load the input and three output traces from `dir`.
///
/// `input_pattern` selects the excitation trace (for example `BC?`).
/// Traces whose orientation cannot be classified are skipped with a
/// warning. Traces of unequal length are truncated to the shortest.
pub fn load_waveforms<P: AsRef<Path>>(dir: P, input_pattern: &str) -> Result<Waveforms> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_wav(path))
        .collect();
    paths.sort();

    if paths.len() < MIN_TRACES {
        return Err(waveform_error(
            dir,
            format!("need at least {MIN_TRACES} traces, found {}", paths.len()),
        ));
    }

    let mut input: Option<(String, PathBuf)> = None;
    let mut outputs: [Option<(String, PathBuf)>; 3] = [None, None, None];

    for path in paths {
        let Some(code) = channel_code(&path) else {
            warn!(path = %path.display(), "trace has no channel code, skipped");
            continue;
        };
        if matches_pattern(&code, input_pattern) {
            if let Some((first, _)) = &input {
                return Err(waveform_error(
                    dir,
                    format!("input pattern '{input_pattern}' matches both {first} and {code}"),
                ));
            }
            input = Some((code, path));
            continue;
        }
        let Some(component) = Component::from_channel_code(&code) else {
            warn!(channel = %code, "unrecognised orientation, skipped");
            continue;
        };
        let slot = &mut outputs[component.index()];
        if let Some((first, _)) = slot {
            return Err(waveform_error(
                dir,
                format!("channels {first} and {code} both map to the {component} component"),
            ));
        }
        *slot = Some((code, path));
    }

    let (input_channel, input_path) = input.ok_or_else(|| {
        waveform_error(dir, format!("no trace matches input pattern '{input_pattern}'"))
    })?;

    let mut output_channels: [String; 3] = Default::default();
    let mut output_paths: [PathBuf; 3] = Default::default();
    for component in Component::ALL {
        let (code, path) = outputs[component.index()]
            .take()
            .ok_or_else(|| waveform_error(dir, format!("no {component} output trace")))?;
        output_channels[component.index()] = code;
        output_paths[component.index()] = path;
    }

    let (mut input, input_info) = read_trace(&input_path)?;
    let sample_rate = input_info.sample_rate;
    let mut series: [Vec<f64>; 3] = Default::default();
    for (slot, path) in series.iter_mut().zip(&output_paths) {
        let (samples, trace_info) = read_trace(path)?;
        if trace_info.sample_rate != sample_rate {
            return Err(waveform_error(
                dir,
                format!(
                    "sample rates differ: {} has {} sps, {} has {sample_rate} sps",
                    path.display(),
                    trace_info.sample_rate,
                    input_path.display()
                ),
            ));
        }
        *slot = samples;
    }

    let shortest = series
        .iter()
        .map(Vec::len)
        .fold(input.len(), usize::min);
    let longest = series.iter().map(Vec::len).fold(input.len(), usize::max);
    if shortest != longest {
        warn!(
            dir = %dir.display(),
            shortest,
            longest,
            "trace lengths differ, truncating to the shortest"
        );
        input.truncate(shortest);
        for s in &mut series {
            s.truncate(shortest);
        }
    }

    debug!(
        input = %input_channel,
        north = %output_channels[0],
        east = %output_channels[1],
        vertical = %output_channels[2],
        "assigned channels"
    );

    Ok(Waveforms {
        sample_rate: f64::from(sample_rate),
        input_channel,
        input,
        output_channels,
        outputs: series,
    })
}

/// Load one band's calibration run: traces from `dir`, timing from `log`.
pub fn load_calibration_run<P: AsRef<Path>, Q: AsRef<Path>>(
    dir: P,
    log: Q,
    band: Band,
    input_pattern: &str,
) -> Result<CalibrationDataSet> {
    let dir = dir.as_ref();
    let log = read_log(log)?;
    let waveforms = load_waveforms(dir, input_pattern)?;
    info!(
        band = band.label(),
        samples = waveforms.len(),
        sample_rate = waveforms.sample_rate,
        "loaded calibration run from {}",
        dir.display()
    );

    let mut data = waveforms
        .into_dataset(band)?
        .with_trim(log.settling_secs, log.trailer_secs);
    if let Some(start) = log.start {
        data = data.with_start(start);
    }
    Ok(data)
}
