//! Per-blocker and run-level observability counters.
use serde::{Deserialize, Serialize};

/// Counters for a single blocker's pass over the corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerStats {
    pub records_seen: u64,
    pub records_keyed: u64,
    pub unique_keys: u64,
    pub blocks_gt1: u64,
    pub pairs_raw: u64,
    pub pairs_unique: u64,
    pub max_block: u64,
}

/// Counters shared across all blockers for one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub pairs_total_unique: u64,
    pub pairs_with_multiple_sources: u64,
}

/// Full result of a `generate_candidates` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub blockers: std::collections::BTreeMap<String, BlockerStats>,
    pub global: GlobalStats,
}
