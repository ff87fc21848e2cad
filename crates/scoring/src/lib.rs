//! Fellegi-Sunter pairwise scoring: compares candidate pairs field-by-field
//! and produces explainable posterior match probabilities.
//!
//! [`comparators::FIELD_CONFIGS`] holds the seven field comparators (doi,
//! pmid, title, authors, year, journal, pages) in deterministic order.
//! [`fs_model::FSModel`] loads a frozen model config and turns a set of
//! per-field levels into a log-likelihood ratio and posterior probability.
//! [`score_pairs::score_all_pairs`] ties both together into the
//! `pair_scores.jsonl` stage.

pub mod comparators;
pub mod error;
pub mod fs_model;
pub mod models;
pub mod score_pairs;

pub use error::ScoringError;
pub use fs_model::{load_model, logit, sigmoid, Contribution, FSModel, FSModelConfig};
pub use models::{Explain, FieldComparison, ModelInfo, PairScore};
pub use score_pairs::{get_p_match_bucket, score_all_pairs, score_pair, ScoringStats};
