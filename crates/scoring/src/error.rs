//! Error types produced by the `scoring` crate.
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("failed to read model config {path}: {message}")]
    ModelRead { path: String, message: String },

    #[error("failed to parse model config {path}: {message}")]
    ModelParse { path: String, message: String },

    #[error("model is missing weight for field {field:?} level {level:?}")]
    MissingWeight { field: String, level: String },

    #[error("failed to read candidates from {path}: {message}")]
    CandidatesRead { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Io { path: String, message: String },
}
