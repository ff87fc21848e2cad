//! Error types produced by the `ingest` crate.
//!
//! Per-record parse problems are carried as data on [`crate::ParseResult`]
//! (warnings/errors strings), never as a propagated `Result::Err` — a
//! malformed record should not abort a whole file. [`IngestError`] is
//! reserved for failures that make a *file* unreadable.
use thiserror::Error;

/// File-level failures that prevent any record in a file from being parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("failed to read file {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to decode {path} with encoding {encoding}: {message}")]
    Decode {
        path: String,
        encoding: String,
        message: String,
    },
    #[error("no parser available for format: {0}")]
    UnsupportedFormat(String),
}
