//! Canonical merge: deterministic survivor selection, field merge rules, and
//! RIS/JSONL output for AUTO clusters produced by the clustering stage.
//!
//! [`survivor::select_survivor`] ranks cluster members by identifier and
//! metadata strength. [`field_merge::merge_canon_fields`] applies per-field
//! merge rules and records provenance. [`ris_writer`] formats merged and
//! canonical records as RIS. [`processor::process_canonical_merge`] ties
//! these together into the full merge stage.

pub mod error;
pub mod field_merge;
pub mod models;
pub mod processor;
pub mod ris_writer;
pub mod survivor;

pub use error::MergeError;
pub use field_merge::merge_canon_fields;
pub use models::{
    compute_merged_id, FromRid, MergePolicy, MergeProvenance, MergeProvenanceField, MergeSummary,
    MergedRecord,
};
pub use processor::{load_clusters, process_canonical_merge};
pub use ris_writer::{format_canon_as_ris, format_ris_record, write_ris_file, write_ris_from_records};
pub use survivor::select_survivor;
