//! File formats and report output for rbcal calibration runs.
//!
//! This crate provides:
//!
//! - **Traces**: [`read_trace`] and [`write_trace`] for mono WAV recordings
//! - **Waveform directories**: [`load_waveforms`] assembles one band's input
//!   and three outputs from a directory of traces
//! - **Calibration logs**: [`read_log`] extracts settling/trailer durations
//! - **Response files**: [`read_paz`] and [`write_paz`] for IDA PAZ listings
//! - **Reports**: [`write_report`] emits plots, IMS2.0 messages, fitted
//!   models and a JSON summary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rbcal_core::Band;
//! use rbcal_io::{load_calibration_run, read_paz};
//!
//! let nominal = read_paz("sts25.paz")?;
//! let lf = load_calibration_run("run/lf", "run/lf/qcal.log", Band::Low, "BC?")?;
//! println!("{} samples at {} sps", lf.len(), lf.sample_rate);
//! ```

mod calib_log;
pub mod ims;
mod paz_file;
pub mod plot;
mod report;
mod wav;
mod waveform;

pub use calib_log::{CalibrationLog, parse_log, read_log};
pub use paz_file::{format_paz, parse_paz, read_paz, write_paz};
pub use ims::Station;
pub use report::{ReportArtifacts, write_report};
pub use wav::{SampleFormat, TraceInfo, read_trace, read_trace_info, write_trace};
pub use waveform::{
    Waveforms, channel_code, load_calibration_run, load_waveforms, matches_pattern,
};

use std::path::PathBuf;

/// Error types for calibration file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Data model or analysis error.
    #[error(transparent)]
    Core(#[from] rbcal_core::Error),

    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// A waveform directory does not hold a usable calibration run.
    #[error("waveform directory {}: {reason}", dir.display())]
    Waveform {
        /// Directory that was scanned.
        dir: PathBuf,
        /// What is wrong with its contents.
        reason: String,
    },

    /// Plot rendering failed.
    #[error("plot error: {0}")]
    Plot(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for calibration file I/O.
pub type Result<T> = std::result::Result<T, Error>;
