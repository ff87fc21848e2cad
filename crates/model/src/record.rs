use serde::{Deserialize, Serialize};

use crate::canon::{Canon, Flags, Keys};
use crate::provenance::Provenance;
use crate::raw::{Meta, Raw};

pub const SCHEMA_VERSION: &str = "1.0.0";

/// The atomic unit flowing between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub schema_version: String,
    pub rid: String,
    pub record_digest: String,
    pub source_digest: String,
    pub meta: Meta,
    pub raw: Raw,
    pub canon: Canon,
    pub keys: Keys,
    pub flags: Flags,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    /// Builds a record immediately after ingestion, before normalization:
    /// identity fields and raw capture are fixed, canon/keys start empty,
    /// and flags reflect the "nothing known yet" state.
    pub fn from_ingested(
        rid: String,
        record_digest: String,
        source_digest: String,
        meta: Meta,
        raw: Raw,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            rid,
            record_digest,
            source_digest,
            meta,
            raw,
            canon: Canon::empty(),
            keys: Keys::empty(),
            flags: Flags::pre_normalization(),
            provenance: Provenance::new(),
        }
    }
}
