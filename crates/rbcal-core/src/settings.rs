//! Tunable analysis settings.
//!
//! Every field has a default, so a TOML `[settings]` table may name only the
//! values it overrides.

use serde::{Deserialize, Serialize};

/// Frequency window and normalisation frequency of one excitation band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandLimits {
    /// Exclusive lower edge (Hz).
    pub low_hz: f64,
    /// Inclusive upper edge (Hz).
    pub high_hz: f64,
    /// Frequency where the band's transfer function is normalised (Hz).
    pub norm_hz: f64,
}

impl BandLimits {
    /// True when `freq` lies inside `(low_hz, high_hz]`.
    pub fn contains(&self, freq: f64) -> bool {
        freq > self.low_hz && freq <= self.high_hz
    }
}

/// Options of the bounded least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Half-width of each parameter's box, as a fraction of its magnitude.
    pub bound_fraction: f64,
    /// Relative step tolerance.
    pub xtol: f64,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Gradient tolerance.
    pub gtol: f64,
    /// Residual evaluation budget, Jacobian columns included.
    pub max_evaluations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            bound_fraction: 0.5,
            xtol: 1e-6,
            ftol: 1e-4,
            gtol: 1e-10,
            max_evaluations: 300,
        }
    }
}

/// Settings of one calibration analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Long-period band.
    pub lf_band: BandLimits,
    /// Short-period band.
    pub hf_band: BandLimits,
    /// Fraction of each prepared series tapered and then discarded at each end.
    pub taper_fraction: f64,
    /// Spacing of the comparison frequency axis (Hz).
    pub comparison_step_hz: f64,
    /// Upper end of the comparison frequency axis (Hz).
    pub comparison_max_hz: f64,
    /// Largest acceptable amplitude deviation (percent).
    pub amplitude_tolerance_pct: f64,
    /// Largest acceptable phase deviation (degrees).
    pub phase_tolerance_deg: f64,
    /// Frequency where system sensitivity is reported (Hz).
    pub sensitivity_hz: f64,
    /// Digitizer gain in counts per volt.
    pub digitizer_gain: f64,
    /// Fit options shared by both bands.
    pub fit: FitOptions,
    /// Analyse the three components on scoped worker threads.
    pub parallel: bool,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            lf_band: BandLimits {
                low_hz: 0.0,
                high_hz: 0.3,
                norm_hz: 0.05,
            },
            hf_band: BandLimits {
                low_hz: 0.3,
                high_hz: 18.0,
                norm_hz: 1.0,
            },
            taper_fraction: 0.05,
            comparison_step_hz: 0.01,
            comparison_max_hz: 18.0,
            amplitude_tolerance_pct: 5.0,
            phase_tolerance_deg: 5.0,
            sensitivity_hz: 1.0,
            digitizer_gain: 419_430.0,
            fit: FitOptions::default(),
            parallel: false,
        }
    }
}
