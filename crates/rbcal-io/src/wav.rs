//! Mono WAV traces holding raw digitizer counts.

use crate::Result;
use hound::{WavReader, WavWriter};
use rbcal_core::Error as CoreError;
use std::path::Path;

/// Sample encoding of a trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 32-bit integer counts, read without scaling.
    Counts,
    /// 32-bit IEEE 754 floating-point samples.
    Float,
}

/// Trace metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct TraceInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of samples.
    pub num_samples: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Sample encoding.
    pub format: SampleFormat,
}

impl TraceInfo {
    fn from_spec(spec: hound::WavSpec, num_samples: u64) -> Self {
        let format = match spec.sample_format {
            hound::SampleFormat::Float => SampleFormat::Float,
            hound::SampleFormat::Int => SampleFormat::Counts,
        };
        Self {
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            num_samples,
            duration_secs: num_samples as f64 / spec.sample_rate as f64,
            format,
        }
    }
}

fn check_mono(path: &Path, spec: hound::WavSpec) -> Result<()> {
    if spec.channels != 1 {
        return Err(CoreError::InvalidInput(format!(
            "{}: traces must be mono, found {} channels",
            path.display(),
            spec.channels
        ))
        .into());
    }
    Ok(())
}

/// Read trace metadata without loading sample data.
pub fn read_trace_info<P: AsRef<Path>>(path: P) -> Result<TraceInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    check_mono(path, spec)?;
    Ok(TraceInfo::from_spec(spec, u64::from(reader.len())))
}

/// Read a mono trace.
///
/// Integer files come back as raw counts (no full-scale normalisation);
/// float files are widened to `f64`.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, TraceInfo)> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    check_mono(path, spec)?;
    let info = TraceInfo::from_spec(spec, u64::from(reader.len()));

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => reader
            .into_samples::<i32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok((samples, info))
}

/// Write a mono trace.
///
/// [`SampleFormat::Counts`] rounds each sample to the nearest integer and
/// saturates at the `i32` range.
///
/// # Example
/// ```ignore
/// let counts = vec![0.0; 3600]; // one hour at 1 sps
/// write_trace("BCN.wav", &counts, 1, SampleFormat::Counts)?;
/// ```
pub fn write_trace<P: AsRef<Path>>(
    path: P,
    samples: &[f64],
    sample_rate: u32,
    format: SampleFormat,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: match format {
            SampleFormat::Counts => hound::SampleFormat::Int,
            SampleFormat::Float => hound::SampleFormat::Float,
        },
    };
    let mut writer = WavWriter::create(path, spec)?;

    match format {
        SampleFormat::Counts => {
            for &sample in samples {
                let count = sample.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
                writer.write_sample(count)?;
            }
        }
        SampleFormat::Float => {
            for &sample in samples {
                writer.write_sample(sample as f32)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}
