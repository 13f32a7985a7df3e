//! Complex transfer function over a frequency axis

use crate::cross::CrossSpectrum;
use rbcal_core::{BandLimits, Complex64, Error, Result};

/// Transfer function measurement result
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    /// Frequency bins (Hz)
    pub frequencies: Vec<f64>,
    /// Complex response at each bin
    pub values: Vec<Complex64>,
}

impl TransferFunction {
    /// Build from parallel frequency and value arrays
    pub fn new(frequencies: Vec<f64>, values: Vec<Complex64>) -> Result<Self> {
        if frequencies.len() != values.len() {
            return Err(Error::InvalidInput(format!(
                "{} frequencies for {} transfer function values",
                frequencies.len(),
                values.len()
            )));
        }
        Ok(Self {
            frequencies,
            values,
        })
    }

    /// Polar gain/phase of a cross spectrum as complex values
    pub fn from_cross(spectrum: &CrossSpectrum) -> Self {
        Self {
            frequencies: spectrum.frequencies.clone(),
            values: spectrum.transfer_function(),
        }
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True when no bins are held
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Bins with `low < f <= high`
    pub fn band(&self, low_hz: f64, high_hz: f64) -> Self {
        let (frequencies, values) = self
            .frequencies
            .iter()
            .zip(&self.values)
            .filter(|(f, _)| **f > low_hz && **f <= high_hz)
            .map(|(f, v)| (*f, *v))
            .unzip();
        Self {
            frequencies,
            values,
        }
    }

    /// Bins inside a band's limits
    pub fn select(&self, limits: &BandLimits) -> Self {
        self.band(limits.low_hz, limits.high_hz)
    }

    /// Magnitude at every bin
    pub fn magnitude(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.norm()).collect()
    }

    /// Phase at every bin (degrees)
    pub fn phase_deg(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.arg().to_degrees()).collect()
    }

    /// Get magnitude at a specific frequency (interpolated)
    ///
    /// Returns `None` outside the covered frequency range.
    pub fn magnitude_at(&self, freq_hz: f64) -> Option<f64> {
        let first = *self.frequencies.first()?;
        let last = *self.frequencies.last()?;
        if !(first..=last).contains(&freq_hz) {
            return None;
        }
        Some(interpolate(&self.frequencies, &self.magnitude(), freq_hz))
    }

    /// Divide every value by the interpolated magnitude at `freq_hz`
    pub fn normalized_at(&self, freq_hz: f64) -> Result<Self> {
        let Some(magnitude) = self.magnitude_at(freq_hz) else {
            return Err(Error::InvalidParameter(format!(
                "normalisation frequency {freq_hz} Hz outside {:?} Hz",
                self.frequencies.first().zip(self.frequencies.last())
            )));
        };
        Ok(Self {
            frequencies: self.frequencies.clone(),
            values: self.values.iter().map(|v| v / magnitude).collect(),
        })
    }
}

/// Linear interpolation helper
fn interpolate(x: &[f64], y: &[f64], target_x: f64) -> f64 {
    let Some(&last) = y.last() else {
        return 0.0;
    };

    if target_x <= x[0] {
        return y[0];
    }

    for i in 1..x.len() {
        if target_x <= x[i] {
            let t = (target_x - x[i - 1]) / (x[i] - x[i - 1]);
            return y[i - 1] + t * (y[i] - y[i - 1]);
        }
    }

    last
}
