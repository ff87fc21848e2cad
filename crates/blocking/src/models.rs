//! Candidate pair data model.
use serde::{Deserialize, Serialize};

/// Provenance of a single candidate pair within one blocker's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSource {
    pub blocker: String,
    pub block_key: String,
    pub match_key: String,
}

/// A candidate duplicate pair with the union of blocker provenance that
/// surfaced it. `rid_a`/`rid_b` are always lexicographically ordered, so
/// `pair_id` is stable regardless of which blocker found the pair first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub pair_id: String,
    pub rid_a: String,
    pub rid_b: String,
    pub sources: Vec<CandidateSource>,
}

impl CandidatePair {
    pub fn new(rid_a: String, rid_b: String, sources: Vec<CandidateSource>) -> Self {
        let pair_id = format!("{rid_a}|{rid_b}");
        Self {
            pair_id,
            rid_a,
            rid_b,
            sources,
        }
    }
}
