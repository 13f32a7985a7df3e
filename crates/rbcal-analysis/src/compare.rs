//! Fitted-versus-nominal response comparison

use rbcal_core::{Error, PoleZeroModel, Result};
use serde::Serialize;

/// Amplitude and phase deviation of one response from another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDeviation {
    /// Frequencies compared (Hz), bin 0 excluded
    pub frequencies: Vec<f64>,
    /// `100·(|H_test| − |H_ref|)/|H_ref|` per frequency
    pub amplitude_pct: Vec<f64>,
    /// `arg H_test − arg H_ref` wrapped into (−180, 180] degrees
    pub phase_deg: Vec<f64>,
    /// Largest absolute amplitude deviation (percent)
    pub max_amplitude_pct: f64,
    /// Largest absolute phase deviation (degrees)
    pub max_phase_deg: f64,
}

impl ResponseDeviation {
    /// True when both maxima are within their tolerances
    ///
    /// Non-finite deviations are never within tolerance.
    pub fn within(&self, amplitude_tolerance_pct: f64, phase_tolerance_deg: f64) -> bool {
        self.max_amplitude_pct.is_finite()
            && self.max_phase_deg.is_finite()
            && self.max_amplitude_pct <= amplitude_tolerance_pct
            && self.max_phase_deg <= phase_tolerance_deg
    }
}

/// Frequencies `i·step` for `i = 0..=round(max/step)`
pub fn comparison_axis(step_hz: f64, max_hz: f64) -> Result<Vec<f64>> {
    if !(step_hz > 0.0 && step_hz.is_finite()) || !(max_hz > 0.0 && max_hz.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "comparison axis needs positive step and maximum, got {step_hz} / {max_hz}"
        )));
    }
    let count = (max_hz / step_hz).round() as usize;
    Ok((0..=count).map(|i| i as f64 * step_hz).collect())
}

/// Wrap an angle in degrees into (−180, 180]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

/// Compare `test` against `reference` over `frequencies`
///
/// Both responses are normalised to unit magnitude at `norm_freq`. The
/// first frequency (0 Hz on a comparison axis) is skipped.
pub fn compare_responses(
    test: &PoleZeroModel,
    reference: &PoleZeroModel,
    frequencies: &[f64],
    norm_freq: f64,
) -> ResponseDeviation {
    let freqs = frequencies.get(1..).unwrap_or_default();
    let h_test = test.normalized_response(freqs, norm_freq);
    let h_ref = reference.normalized_response(freqs, norm_freq);

    let amplitude_pct: Vec<f64> = h_test
        .iter()
        .zip(&h_ref)
        .map(|(t, r)| 100.0 * (t.norm() - r.norm()) / r.norm())
        .collect();
    let phase_deg: Vec<f64> = h_test
        .iter()
        .zip(&h_ref)
        .map(|(t, r)| wrap_degrees(t.arg().to_degrees() - r.arg().to_degrees()))
        .collect();

    // A NaN deviation must survive into the maximum, so `within` rejects it
    let max_abs = |values: &[f64]| {
        values.iter().fold(0.0_f64, |m, v| {
            if v.is_nan() || v.abs() > m { v.abs() } else { m }
        })
    };
    ResponseDeviation {
        frequencies: freqs.to_vec(),
        max_amplitude_pct: max_abs(&amplitude_pct),
        max_phase_deg: max_abs(&phase_deg),
        amplitude_pct,
        phase_deg,
    }
}
