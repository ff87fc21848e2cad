use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const NORMALIZATION_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One source reference back into `raw.tags` with a capped value snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceSource {
    pub path: String,
    pub tag: String,
    pub value_snippet: String,
    pub source_format: String,
}

/// One transform applied en route to a canonical field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub name: String,
    pub version: String,
    pub notes: String,
}

impl Transform {
    pub fn new(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: NORMALIZATION_VERSION.to_string(),
            notes: notes.into(),
        }
    }
}

/// Provenance for a single canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub sources: Vec<ProvenanceSource>,
    pub transforms: Vec<Transform>,
    pub confidence: Confidence,
}

/// Mapping from canonical-field path (e.g. `"canon.doi_norm"`) to its
/// provenance. A `BTreeMap` so iteration — and therefore JSON encoding — is
/// already key-sorted without relying on the `jsonl` round-trip trick.
pub type Provenance = BTreeMap<String, ProvenanceEntry>;

const SNIPPET_CAP: usize = 120;

/// Caps a raw value to `SNIPPET_CAP` characters (not bytes) for embedding
/// in a provenance source entry.
pub fn snippet(value: &str) -> String {
    value.chars().take(SNIPPET_CAP).collect()
}
