//! Canonical record data model shared across every stage of the pipeline.

pub mod canon;
pub mod jsonl;
pub mod provenance;
pub mod raw;
pub mod record;

pub use canon::{AuthorParsed, Canon, Flags, Keys};
pub use provenance::{snippet, Confidence, Provenance, ProvenanceEntry, ProvenanceSource, Transform};
pub use raw::{Meta, Raw, RawTag};
pub use record::CanonicalRecord;
