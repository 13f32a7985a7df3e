//! Error taxonomy shared by every rbcal crate.

use crate::paz::Mode;
use thiserror::Error;

/// Errors raised by the calibration data model and the analysis core.
///
/// Numerical degeneracies (zero coherent power at a bin, zero-width fit
/// bounds) are deliberately absent: they propagate as NaN/Inf or are
/// accepted as valid input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A configuration value or argument is outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input series or traces have the wrong shape or count.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A mode conversion would have to remove zeros that do not exist.
    #[error("cannot convert {from} response to {to}: needs {needed} zero(s) at the origin, found {available}")]
    IncompatibleMode {
        /// Mode of the source model.
        from: Mode,
        /// Requested mode.
        to: Mode,
        /// Number of zero-valued zeros the conversion must remove.
        needed: usize,
        /// Number of zero-valued zeros present.
        available: usize,
    },

    /// Not enough samples to run an estimator.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData {
        /// Minimum sample count.
        needed: usize,
        /// Actual sample count.
        got: usize,
    },

    /// Malformed response file or calibration log.
    #[error("parse error in {context}{}: {reason}", line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        /// What was being parsed (usually a file name).
        context: String,
        /// One-based line number, when known.
        line: Option<usize>,
        /// Description of the problem.
        reason: String,
    },

    /// The sensor model has no profile.
    #[error("unsupported sensor model: {0}")]
    UnsupportedSensor(String),
}

impl Error {
    /// Create a parse error without a line number.
    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            context: context.into(),
            line: None,
            reason: reason.into(),
        }
    }

    /// Create a parse error pointing at a one-based line.
    pub fn parse_at(context: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            context: context.into(),
            line: Some(line),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for the calibration core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_display_with_line() {
        let err = Error::parse_at("sts25.paz", 7, "expected 5 poles, read 4");
        assert_eq!(
            err.to_string(),
            "parse error in sts25.paz (line 7): expected 5 poles, read 4"
        );
    }

    #[test]
    fn parse_display_without_line() {
        let err = Error::parse("qcal.log", "missing 'settling time'");
        assert_eq!(err.to_string(), "parse error in qcal.log: missing 'settling time'");
    }

    #[test]
    fn incompatible_mode_display() {
        let err = Error::IncompatibleMode {
            from: Mode::Velocity,
            to: Mode::Acceleration,
            needed: 1,
            available: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("velocity"), "got: {msg}");
        assert!(msg.contains("acceleration"), "got: {msg}");
    }

    #[test]
    fn insufficient_data_display() {
        let err = Error::InsufficientData { needed: 4, got: 2 };
        assert_eq!(err.to_string(), "insufficient data: need at least 4 samples, got 2");
    }
}
