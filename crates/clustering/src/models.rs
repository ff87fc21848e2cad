//! Data model for clustering and consistency checks.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use srdedupe_ids::sha256_hex;

/// Reason codes that mark an edge as strong regardless of `p_match`.
pub const STRONG_REASON_CODES: &[&str] = &["doi_exact", "pmid_exact"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(rename = "REVIEW")]
    Review,
}

impl ClusterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Auto => "AUTO",
            ClusterStatus::Review => "REVIEW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictType {
    #[serde(rename = "doi_conflict")]
    DoiConflict,
    #[serde(rename = "pmid_conflict")]
    PmidConflict,
    #[serde(rename = "linked_citation_risk")]
    LinkedCitationRisk,
    #[serde(rename = "internal_auto_keep_contradiction")]
    InternalAutoKeepContradiction,
    #[serde(rename = "year_far")]
    YearFar,
    #[serde(rename = "title_key_divergent")]
    TitleKeyDivergent,
    #[serde(rename = "bridged_by_weak_edges")]
    BridgedByWeakEdges,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::DoiConflict => "doi_conflict",
            ConflictType::PmidConflict => "pmid_conflict",
            ConflictType::LinkedCitationRisk => "linked_citation_risk",
            ConflictType::InternalAutoKeepContradiction => "internal_auto_keep_contradiction",
            ConflictType::YearFar => "year_far",
            ConflictType::TitleKeyDivergent => "title_key_divergent",
            ConflictType::BridgedByWeakEdges => "bridged_by_weak_edges",
        }
    }
}

/// A pairwise AUTO-DUP decision edge, as consumed for clustering.
#[derive(Debug, Clone)]
pub struct Edge {
    pub pair_id: String,
    pub rid_a: String,
    pub rid_b: String,
    pub decision: String,
    pub p_match: f64,
    pub reasons: Vec<String>,
}

impl Edge {
    /// An edge is strong if it carries a strong reason code (`doi_exact`,
    /// `pmid_exact`) or its `p_match` clears `threshold`.
    pub fn is_strong(&self, threshold: f64, use_reason_codes: bool) -> bool {
        if use_reason_codes && self.reasons.iter().any(|r| STRONG_REASON_CODES.contains(&r.as_str())) {
            return true;
        }
        self.p_match >= threshold
    }

    pub fn involves(&self, rid_set: &std::collections::BTreeSet<String>) -> bool {
        rid_set.contains(&self.rid_a) && rid_set.contains(&self.rid_b)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSupport {
    pub edges_auto_dup: u64,
    pub strong_edge_count: u64,
    pub sources: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConsistency {
    pub hard_conflicts: Vec<String>,
    pub soft_conflicts: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: String,
    pub status: ClusterStatus,
    pub rids: Vec<String>,
    pub support: ClusterSupport,
    pub consistency: ClusterConsistency,
}

/// Clustering and consistency-check tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub strong_edge_use_reason_codes: bool,
    pub strong_edge_t_strong: f64,
    pub soft_conflicts_year_max_spread: i32,
    pub soft_conflicts_title_divergence_tolerance: usize,
    pub oversized_cluster_max_size_auto: usize,
    pub split_policy_enable_id_split: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            strong_edge_use_reason_codes: true,
            strong_edge_t_strong: 0.999,
            soft_conflicts_year_max_spread: 2,
            soft_conflicts_title_divergence_tolerance: 0,
            oversized_cluster_max_size_auto: 25,
            split_policy_enable_id_split: true,
        }
    }
}

/// Deterministic cluster ID: `c:` followed by the first 12 hex digits of the
/// SHA-256 digest of the sorted rids joined by newlines.
pub fn compute_cluster_id(rids: &[String]) -> String {
    let mut sorted_rids = rids.to_vec();
    sorted_rids.sort();
    let content = sorted_rids.join("\n");
    let digest = sha256_hex(content.as_bytes());
    let hex_only = digest.trim_start_matches("sha256:");
    format!("c:{}", &hex_only[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_id_is_order_independent() {
        let a = compute_cluster_id(&["r2".to_string(), "r1".to_string()]);
        let b = compute_cluster_id(&["r1".to_string(), "r2".to_string()]);
        assert_eq!(a, b);
        assert!(a.starts_with("c:"));
        assert_eq!(a.len(), 14);
    }

    #[test]
    fn edge_is_strong_via_reason_code_below_threshold() {
        let edge = Edge {
            pair_id: "p1".to_string(),
            rid_a: "a".to_string(),
            rid_b: "b".to_string(),
            decision: "AUTO_DUP".to_string(),
            p_match: 0.5,
            reasons: vec!["doi_exact".to_string()],
        };
        assert!(edge.is_strong(0.999, true));
    }

    #[test]
    fn edge_is_strong_via_score_without_reason_codes() {
        let edge = Edge {
            pair_id: "p1".to_string(),
            rid_a: "a".to_string(),
            rid_b: "b".to_string(),
            decision: "AUTO_DUP".to_string(),
            p_match: 0.9995,
            reasons: vec![],
        };
        assert!(edge.is_strong(0.999, true));
    }
}
