//! Field comparators for pairwise scoring: pure, deterministic functions
//! mapping a pair of records' fields to an agreement level, an optional
//! similarity score, and a list of warning codes.
mod authors;
mod doi;
mod journal;
mod pages;
mod pmid;
mod title;
mod year;

use srdedupe_model::CanonicalRecord;

/// Result of comparing one field between two records.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareResult {
    pub level: String,
    pub sim: Option<f64>,
    pub warnings: Vec<String>,
}

impl CompareResult {
    fn new(level: &str, sim: Option<f64>, warnings: Vec<String>) -> Self {
        Self {
            level: level.to_string(),
            sim,
            warnings,
        }
    }
}

/// Jaccard similarity between two string sets. Both-empty is treated as
/// agreement (1.0), not as undefined or disagreement.
pub fn jaccard_similarity(set_a: &std::collections::BTreeSet<&str>, set_b: &std::collections::BTreeSet<&str>) -> f64 {
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(set_b).count();
    let union = set_a.union(set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// A named field comparator: extracts its inputs from a record pair and
/// runs its comparison function. Order in [`FIELD_CONFIGS`] is the
/// deterministic iteration order used throughout scoring.
pub struct FieldConfig {
    pub name: &'static str,
    compare_fn: fn(&CanonicalRecord, &CanonicalRecord) -> CompareResult,
}

impl FieldConfig {
    pub fn compare(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
        (self.compare_fn)(a, b)
    }
}

pub const FIELD_CONFIGS: &[FieldConfig] = &[
    FieldConfig { name: "doi", compare_fn: doi::compare },
    FieldConfig { name: "pmid", compare_fn: pmid::compare },
    FieldConfig { name: "title", compare_fn: title::compare },
    FieldConfig { name: "authors", compare_fn: authors::compare },
    FieldConfig { name: "year", compare_fn: year::compare },
    FieldConfig { name: "journal", compare_fn: journal::compare },
    FieldConfig { name: "pages", compare_fn: pages::compare },
];
