//! Builds a single provenance map entry from the raw tags a canonical
//! field was derived from.

use srdedupe_model::{snippet, Confidence, ProvenanceEntry, ProvenanceSource, Transform};
use srdedupe_model::RawTag;

pub fn transform(name: impl Into<String>, notes: impl Into<String>) -> Transform {
    Transform::new(name, notes)
}

/// Builds a `(field_path, entry)` pair ready for insertion into a record's
/// provenance map. `tag_indices` are positions into `raw_tags`.
pub fn build_provenance_entry(
    field_path: impl Into<String>,
    raw_tags: &[RawTag],
    tag_indices: &[usize],
    source_format: &str,
    transforms: Vec<Transform>,
    confidence: Confidence,
) -> (String, ProvenanceEntry) {
    let sources = tag_indices
        .iter()
        .map(|&idx| {
            let tag = &raw_tags[idx];
            ProvenanceSource {
                path: format!("raw.tags[{idx}]"),
                tag: tag.tag.clone(),
                value_snippet: snippet(&tag.value_raw_joined),
                source_format: source_format.to_string(),
            }
        })
        .collect();

    (
        field_path.into(),
        ProvenanceEntry {
            sources,
            transforms,
            confidence,
        },
    )
}
