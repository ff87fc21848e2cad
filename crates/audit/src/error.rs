//! Error types produced by the `audit` crate.
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AuditError {
    #[error("failed to access {path}: {message}")]
    Io { path: String, message: String },

    #[error("stage not found: {stage}")]
    StageNotFound { stage: String },

    #[error("stage not started: {stage}")]
    StageNotStarted { stage: String },
}
