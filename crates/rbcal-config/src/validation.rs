//! Run configuration validation.
//!
//! Checks that do not need any file: band ordering, normalisation
//! frequencies inside their bands, positive tolerances, steps and gains,
//! and a resolvable sensor profile. Every problem is reported, not just the
//! first.
//!
//! # Example
//!
//! ```rust
//! use rbcal_config::validate_settings;
//! use rbcal_core::CalibrationSettings;
//!
//! validate_settings(&CalibrationSettings::default()).expect("defaults are valid");
//! ```

use crate::RunConfig;
use rbcal_core::{BandLimits, CalibrationSettings};
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Band edges out of order.
    #[error("{band} band: low edge {low} Hz must be non-negative and below high edge {high} Hz")]
    BandOrder {
        /// Band label.
        band: &'static str,
        /// Low edge (Hz).
        low: f64,
        /// High edge (Hz).
        high: f64,
    },

    /// Normalisation frequency outside its band.
    #[error("{band} band: normalisation frequency {norm} Hz outside ({low}, {high}] Hz")]
    NormOutsideBand {
        /// Band label.
        band: &'static str,
        /// Normalisation frequency (Hz).
        norm: f64,
        /// Low edge (Hz).
        low: f64,
        /// High edge (Hz).
        high: f64,
    },

    /// A value that must be strictly positive is not.
    #[error("'{param}' must be positive, got {value}")]
    NotPositive {
        /// Name of the setting.
        param: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Parameter value out of range.
    #[error("'{param}' value {value} out of range [{min}, {max})")]
    OutOfRange {
        /// Name of the setting.
        param: &'static str,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Exclusive maximum.
        max: f64,
    },

    /// Sensor profile name not found.
    #[error("unknown sensor profile: {0}")]
    UnknownSensor(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collapse(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_band(band: &'static str, limits: &BandLimits, errors: &mut Vec<ValidationError>) {
    let BandLimits {
        low_hz,
        high_hz,
        norm_hz,
    } = *limits;
    if !(low_hz >= 0.0 && low_hz < high_hz && high_hz.is_finite()) {
        errors.push(ValidationError::BandOrder {
            band,
            low: low_hz,
            high: high_hz,
        });
    } else if !limits.contains(norm_hz) {
        errors.push(ValidationError::NormOutsideBand {
            band,
            norm: norm_hz,
            low: low_hz,
            high: high_hz,
        });
    }
}

fn check_positive(param: &'static str, value: f64, errors: &mut Vec<ValidationError>) {
    if !(value > 0.0 && value.is_finite()) {
        errors.push(ValidationError::NotPositive { param, value });
    }
}

fn collect_settings(settings: &CalibrationSettings, errors: &mut Vec<ValidationError>) {
    check_band("long-period", &settings.lf_band, errors);
    check_band("short-period", &settings.hf_band, errors);

    if !(0.0..0.5).contains(&settings.taper_fraction) {
        errors.push(ValidationError::OutOfRange {
            param: "taper_fraction",
            value: settings.taper_fraction,
            min: 0.0,
            max: 0.5,
        });
    }
    if !(0.0..1.0).contains(&settings.fit.bound_fraction) {
        errors.push(ValidationError::OutOfRange {
            param: "fit.bound_fraction",
            value: settings.fit.bound_fraction,
            min: 0.0,
            max: 1.0,
        });
    }

    check_positive("comparison_step_hz", settings.comparison_step_hz, errors);
    check_positive("comparison_max_hz", settings.comparison_max_hz, errors);
    check_positive("amplitude_tolerance_pct", settings.amplitude_tolerance_pct, errors);
    check_positive("phase_tolerance_deg", settings.phase_tolerance_deg, errors);
    check_positive("sensitivity_hz", settings.sensitivity_hz, errors);
    check_positive("digitizer_gain", settings.digitizer_gain, errors);
    check_positive("fit.max_evaluations", settings.fit.max_evaluations as f64, errors);
}

/// Validate analysis settings.
pub fn validate_settings(settings: &CalibrationSettings) -> ValidationResult<()> {
    let mut errors = Vec::new();
    collect_settings(settings, &mut errors);
    collapse(errors)
}

/// Validate a run configuration: its settings and its sensor profile name.
///
/// The profile must be defined inline, in the user sensor directory or
/// among the factory profiles.
pub fn validate_run_config(config: &RunConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    collect_settings(&config.settings, &mut errors);
    for profile in &config.sensors {
        check_positive("sensors.sensor_gain", profile.sensor_gain, &mut errors);
    }
    if config.sensor_profile().is_err() {
        errors.push(ValidationError::UnknownSensor(config.sensor.clone()));
    }
    collapse(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_settings(&CalibrationSettings::default()), Ok(()));
    }

    #[test]
    fn test_band_order() {
        let mut settings = CalibrationSettings::default();
        settings.hf_band.low_hz = 20.0;
        assert!(matches!(
            validate_settings(&settings),
            Err(ValidationError::BandOrder { band: "short-period", .. })
        ));
    }

    #[test]
    fn test_norm_outside_band() {
        let mut settings = CalibrationSettings::default();
        settings.lf_band.norm_hz = 1.0;
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("normalisation frequency 1 Hz"), "got: {err}");
    }

    #[test]
    fn test_taper_fraction_range() {
        let mut settings = CalibrationSettings::default();
        settings.taper_fraction = 0.5;
        assert!(matches!(
            validate_settings(&settings),
            Err(ValidationError::OutOfRange { param: "taper_fraction", .. })
        ));
        settings.taper_fraction = 0.0;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_all_problems_reported() {
        let mut settings = CalibrationSettings::default();
        settings.comparison_step_hz = 0.0;
        settings.digitizer_gain = -1.0;
        settings.phase_tolerance_deg = f64::NAN;
        match validate_settings(&settings) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
