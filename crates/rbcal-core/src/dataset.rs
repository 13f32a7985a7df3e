//! One excitation run: the excitation input and three sensor outputs.

use crate::component::{Band, Component};
use crate::error::{Error, Result};
use crate::sensor::Geometry;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Samples and timing of one random-binary calibration run.
///
/// Preparation (`trim`, `invert_polarity`, `apply_geometry`) mutates the
/// series in place; after that the data set is treated as read-only input
/// to spectral analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDataSet {
    /// Which excitation band this run belongs to.
    pub band: Band,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Start of the recording, when the log provides it.
    pub start: Option<DateTime<Utc>>,
    /// Seconds of settling to discard from the start.
    pub settling_secs: f64,
    /// Seconds of trailer to discard from the end.
    pub trailer_secs: f64,
    /// Excitation signal.
    pub input: Vec<f64>,
    /// Sensor outputs in `[north, east, vertical]` order.
    pub outputs: [Vec<f64>; 3],
}

impl CalibrationDataSet {
    /// Build a data set, checking that all four series are time aligned.
    pub fn new(
        band: Band,
        sample_rate: f64,
        input: Vec<f64>,
        outputs: [Vec<f64>; 3],
    ) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sampling rate must be positive, got {sample_rate}"
            )));
        }
        if outputs.iter().any(|o| o.len() != input.len()) {
            return Err(Error::InvalidInput(format!(
                "channel lengths differ: input {}, outputs {}/{}/{}",
                input.len(),
                outputs[0].len(),
                outputs[1].len(),
                outputs[2].len()
            )));
        }
        Ok(Self {
            band,
            sample_rate,
            start: None,
            settling_secs: 0.0,
            trailer_secs: 0.0,
            input,
            outputs,
        })
    }

    /// Set the settling and trailer durations.
    pub fn with_trim(mut self, settling_secs: f64, trailer_secs: f64) -> Self {
        self.settling_secs = settling_secs;
        self.trailer_secs = trailer_secs;
        self
    }

    /// Set the start timestamp.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// True when the channels hold no samples.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Duration covered by the samples, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    /// Output series of one component.
    pub fn output(&self, component: Component) -> &[f64] {
        &self.outputs[component.index()]
    }

    /// Drop the settling and trailer windows from every channel.
    ///
    /// The durations are zeroed afterwards, so trimming twice is harmless.
    pub fn trim(&mut self) -> Result<()> {
        if !(self.settling_secs.is_finite() && self.trailer_secs.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "settling/trailer durations must be finite, got {} / {}",
                self.settling_secs, self.trailer_secs
            )));
        }
        let len = self.len();
        // Sample counts stay in f64 until they are known to fit
        let samples = |secs: f64| (secs * self.sample_rate).round().max(0.0);
        let (head_f, tail_f) = (samples(self.settling_secs), samples(self.trailer_secs));
        if head_f + tail_f + 4.0 > len as f64 {
            return Err(Error::InsufficientData {
                needed: (head_f + tail_f + 4.0) as usize,
                got: len,
            });
        }
        let head = head_f as usize;
        let tail = tail_f as usize;
        let remaining = len - head.saturating_add(tail);

        let millis = (self.settling_secs * 1000.0).round();
        let start = match self.start {
            Some(start) => Some(
                (millis.abs() < i64::MAX as f64)
                    .then(|| chrono::TimeDelta::try_milliseconds(millis as i64))
                    .flatten()
                    .and_then(|offset| start.checked_add_signed(offset))
                    .ok_or_else(|| {
                        Error::InvalidParameter(format!(
                            "settling time {} s moves the start time out of range",
                            self.settling_secs
                        ))
                    })?,
            ),
            None => None,
        };

        let range = head..head + remaining;
        self.input = self.input[range.clone()].to_vec();
        for output in &mut self.outputs {
            *output = output[range.clone()].to_vec();
        }
        self.start = start;
        debug!(band = %self.band, head, tail, remaining, "trimmed calibration data");
        self.settling_secs = 0.0;
        self.trailer_secs = 0.0;
        Ok(())
    }

    /// Negate one recorded output slot.
    pub fn invert_polarity(&mut self, component: Component) {
        for sample in &mut self.outputs[component.index()] {
            *sample = -*sample;
        }
    }

    /// Rotate the recorded sensor axes into North/East/Vertical.
    pub fn apply_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        geometry.apply(&mut self.outputs)
    }
}
