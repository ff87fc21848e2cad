//! Output data model for pairwise scoring.
use serde::{Deserialize, Serialize};

use srdedupe_blocking::CandidateSource;

use crate::fs_model::Contribution;

/// Comparison result for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub level: String,
    pub sim: Option<f64>,
    pub weight: f64,
}

/// Model metadata attached to every pair score for reproducibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explain {
    pub top_contributions: Vec<Contribution>,
}

/// Pairwise match score with full explainability, one line of
/// `pair_scores.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairScore {
    pub pair_id: String,
    pub rid_a: String,
    pub rid_b: String,
    pub candidate_sources: Vec<CandidateSource>,
    pub comparison: std::collections::BTreeMap<String, FieldComparison>,
    pub llr: f64,
    pub p_match: f64,
    pub explain: Explain,
    pub warnings: Vec<String>,
    pub model: ModelInfo,
}
