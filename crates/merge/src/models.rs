//! Data model for canonical merge: merged records, provenance, and summary
//! statistics.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use srdedupe_ids::sha256_hex;
use srdedupe_model::Canon;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePolicy {
    pub name: String,
    pub version: String,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy { name: "merge_v1".to_string(), version: "1.0.0".to_string() }
    }
}

/// A field's source RID(s): a single value for a unique winner, several
/// when a multi-value merge (e.g. `language`/`publication_type`) drew from
/// more than one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FromRid {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeProvenanceField {
    pub from_rid: FromRid,
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

impl MergeProvenanceField {
    pub fn single(from_rid: impl Into<String>, rule: impl Into<String>) -> Self {
        MergeProvenanceField { from_rid: FromRid::Single(from_rid.into()), rule: rule.into(), candidates: None }
    }

    pub fn multiple(from_rids: Vec<String>, rule: impl Into<String>) -> Self {
        MergeProvenanceField { from_rid: FromRid::Multiple(from_rids), rule: rule.into(), candidates: None }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeProvenance {
    pub fields: BTreeMap<String, MergeProvenanceField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    pub merged_id: String,
    pub cluster_id: Option<String>,
    pub status: String,
    pub survivor_rid: String,
    pub member_rids: Vec<String>,
    pub canon: Canon,
    pub merge_provenance: MergeProvenance,
    pub merge_policy: MergePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeSummary {
    pub records_in_total: u64,
    pub clusters_auto_in: u64,
    pub clusters_review_in: u64,
    pub auto_clusters_merged: u64,
    pub max_cluster_size_merged: u64,
    pub records_not_found: u64,
    pub singletons_count: u64,
    pub records_out_deduped_auto: u64,
    pub records_out_review_pending: u64,
    pub records_out_unique_total: u64,
    pub dedup_rate: f64,
    pub timestamp: String,
    pub execution_time_seconds: f64,
}

/// Deterministic merged ID: `m:` followed by the first 12 hex digits of the
/// SHA-256 digest of the sorted member rids joined by newlines.
pub fn compute_merged_id(rids: &[String]) -> String {
    let mut sorted_rids = rids.to_vec();
    sorted_rids.sort();
    let content = sorted_rids.join("\n");
    let digest = sha256_hex(content.as_bytes());
    let hex_only = digest.trim_start_matches("sha256:");
    format!("m:{}", &hex_only[..12])
}
