//! Error types produced by the `clustering` crate.
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClusteringError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed pair decision at line {line}: {message}")]
    MalformedDecision { line: usize, message: String },
}
