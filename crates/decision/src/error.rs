//! Error types produced by the `decision` crate.
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecisionError {
    #[error("calibration set is empty")]
    EmptyCalibrationSet,

    #[error("calibration set too small: {found} pairs (minimum required: {minimum})")]
    CalibrationSetTooSmall { found: usize, minimum: usize },

    #[error("alpha must be in (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("delta must be in (0, 1), got {0}")]
    InvalidDelta(f64),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed calibration data at line {line}: {message}")]
    MalformedCalibrationData { line: usize, message: String },

    #[error("malformed pair score data: {message}")]
    MalformedPairScore { message: String },
}
