//! rbcal Core - data model for random-binary seismometer calibration
//!
//! This crate holds the types shared by the analysis, I/O and configuration
//! crates. It performs no file I/O and no spectral estimation.
//!
//! # Response Models
//!
//! - [`PoleZeroModel`] - analog pole-zero response with mode/unit conversion
//! - [`PazIndexMap`] - ordered pole/zero selection for partial models
//! - [`Mode`] / [`Units`] - response domain and frequency units
//!
//! # Calibration Data
//!
//! - [`CalibrationDataSet`] - excitation input plus three sensor outputs
//! - [`Component`] / [`Band`] - output component and excitation band tags
//!
//! # Sensors and Settings
//!
//! - [`SensorProfile`] - geometry, polarity and perturbable subsets per model
//! - [`Geometry`] - orthogonal or triaxial (UVW) axis layout
//! - [`CalibrationSettings`] - band limits, tolerances and fit options
//!
//! # Errors
//!
//! All fallible operations return [`Result`] with the shared [`Error`] enum.

pub mod component;
pub mod dataset;
pub mod error;
pub mod paz;
pub mod sensor;
pub mod settings;

pub use component::{Band, Component};
pub use dataset::CalibrationDataSet;
pub use error::{Error, Result};
pub use paz::{Mode, PazIndexMap, PoleZeroModel, Units};
pub use sensor::{Geometry, SensorProfile, find_profile};
pub use settings::{BandLimits, CalibrationSettings, FitOptions};

/// Complex sample type used throughout rbcal.
pub use num_complex::Complex64;
