//! rbcal Analysis - numeric core of random-binary seismometer calibration
//!
//! This crate turns prepared calibration recordings into fitted pole-zero
//! models:
//!
//! - [`fft`] - rustfft wrapper in double precision
//! - [`signal`] - statistics, tapers and analog-response filtering
//! - [`cross`] - multitaper cross spectrum (gain, phase, coherence²)
//! - [`transfer_fn`] - complex transfer function with band selection
//! - [`lsq`] - bounded Levenberg–Marquardt least squares
//! - [`fit`] - partial pole-zero model fitting
//! - [`compare`] - amplitude/phase deviation between two responses
//! - [`pipeline`] - the end-to-end [`Calibration`] run
//!
//! No function in this crate touches the filesystem.
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use rbcal_analysis::Calibration;
//!
//! // 1. Load nominal response and both data sets (rbcal-io)
//!
//! // 2. Run the analysis
//! let calibration = Calibration::new(nominal, profile, settings)?;
//! let outcome = calibration.run(lf, hf)?;
//!
//! // 3. Inspect the deviation from nominal
//! for result in &outcome.components {
//!     println!("{}: {:.2}%", result.component, result.deviation.max_amplitude_pct);
//! }
//! ```

pub mod compare;
pub mod cross;
pub mod fft;
pub mod fit;
pub mod lsq;
pub mod pipeline;
pub mod signal;
pub mod transfer_fn;

pub use compare::{ResponseDeviation, compare_responses, comparison_axis};
pub use cross::{CrossSpectrum, cross_spectrum};
pub use fit::{FitOutcome, ParamRole, ResponseFitter};
pub use lsq::{Termination, TrustRegion};
pub use pipeline::{
    BandFit, Calibration, CalibrationOutcome, ComponentFitResult, PreparedSeries, Sensitivity,
};
pub use transfer_fn::TransferFunction;
