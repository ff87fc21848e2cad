//! Error types produced by the `merge` crate.
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MergeError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed cluster at line {line}: {message}")]
    MalformedCluster { line: usize, message: String },

    #[error("cannot select survivor from an empty record list")]
    EmptySurvivorSet,

    #[error("multiple distinct {field} values in an AUTO cluster: {values:?}")]
    ConflictingStrongId { field: String, values: Vec<String> },
}
