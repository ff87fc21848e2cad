//! Error types produced by the `blocking` crate.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlockingError {
    #[error("unknown blocker type {0:?}, valid types: {1}")]
    UnknownBlockerType(String, String),
    #[error("failed to write candidates to {path}: {message}")]
    Io { path: String, message: String },
}
