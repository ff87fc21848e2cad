//! Builds clusters from pairwise AUTO-DUP decisions via transitive closure,
//! then runs consistency gates and deterministic ID-based splitting.
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::instrument;

use srdedupe_model::CanonicalRecord;

use crate::consistency::{check_cluster_consistency, split_cluster_by_id};
use crate::error::ClusteringError;
use crate::models::{Cluster, ClusterConsistency, ClusterStatus, ClusterSupport, ClusteringConfig, ConflictType, Edge, compute_cluster_id};
use crate::union_find::UnionFind;

/// Builds clusters from `pair_decisions.jsonl`, sorted by `cluster_id`.
#[instrument(skip(records, config), fields(records = records.len()))]
pub fn build_clusters(
    pair_decisions_path: &Path,
    records: &[CanonicalRecord],
    config: &ClusteringConfig,
) -> Result<Vec<Cluster>, ClusteringError> {
    let records_map: BTreeMap<&str, &CanonicalRecord> =
        records.iter().map(|r| (r.rid.as_str(), r)).collect();

    let (auto_dup_edges, auto_keep_index) = load_decisions(pair_decisions_path)?;
    let component_edges = compute_component_edges(&auto_dup_edges);

    let mut clusters = Vec::new();
    for (rids, edges) in component_edges {
        let cluster_list = process_component(&rids, &records_map, &edges, &auto_keep_index, config);
        clusters.extend(cluster_list);
    }

    clusters.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    Ok(clusters)
}

fn load_decisions(
    pair_decisions_path: &Path,
) -> Result<(Vec<Edge>, BTreeMap<String, BTreeSet<String>>), ClusteringError> {
    let file = fs::File::open(pair_decisions_path).map_err(|e| ClusteringError::Io {
        path: pair_decisions_path.display().to_string(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut auto_dup_edges = Vec::new();
    let mut auto_keep_index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ClusteringError::Io {
            path: pair_decisions_path.display().to_string(),
            message: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let data: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| ClusteringError::MalformedDecision {
                line: line_num + 1,
                message: e.to_string(),
            })?;

        let decision = data["decision"].as_str().unwrap_or_default();
        let rid_a = data["rid_a"].as_str().unwrap_or_default().to_string();
        let rid_b = data["rid_b"].as_str().unwrap_or_default().to_string();

        if decision == "AUTO_DUP" {
            let reasons = data["reasons"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|r| r.get("code").and_then(|c| c.as_str()).map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            auto_dup_edges.push(Edge {
                pair_id: data["pair_id"].as_str().unwrap_or_default().to_string(),
                rid_a,
                rid_b,
                decision: decision.to_string(),
                p_match: data["p_match"].as_f64().unwrap_or(0.0),
                reasons,
            });
        } else if decision == "AUTO_KEEP" {
            auto_keep_index.entry(rid_a.clone()).or_default().insert(rid_b.clone());
            auto_keep_index.entry(rid_b).or_default().insert(rid_a);
        }
    }

    Ok((auto_dup_edges, auto_keep_index))
}

fn compute_component_edges(edges: &[Edge]) -> Vec<(Vec<String>, Vec<Edge>)> {
    let mut uf = UnionFind::new();
    for edge in edges {
        uf.union(&edge.rid_a, &edge.rid_b);
    }

    let mut root_edges: BTreeMap<String, Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        let root = uf.find(&edge.rid_a);
        root_edges.entry(root).or_default().push(edge.clone());
    }

    let mut result = Vec::new();
    for component in uf.components() {
        let mut sorted_rids = component;
        sorted_rids.sort();
        let root = uf.find(&sorted_rids[0]);
        let edges = root_edges.get(&root).cloned().unwrap_or_default();
        result.push((sorted_rids, edges));
    }
    result
}

fn process_component(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    cluster_edges: &[Edge],
    auto_keep_index: &BTreeMap<String, BTreeSet<String>>,
    config: &ClusteringConfig,
) -> Vec<Cluster> {
    let consistency = check_cluster_consistency(rids, records_map, cluster_edges, auto_keep_index, config);

    let should_split = config.split_policy_enable_id_split
        && (consistency.hard_conflicts.contains(&ConflictType::DoiConflict.as_str().to_string())
            || consistency.hard_conflicts.contains(&ConflictType::PmidConflict.as_str().to_string()));

    if should_split {
        return split_and_create_clusters(rids, records_map, cluster_edges, auto_keep_index, config, &consistency);
    }

    vec![create_cluster(rids, cluster_edges, consistency, config)]
}

fn split_and_create_clusters(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    cluster_edges: &[Edge],
    auto_keep_index: &BTreeMap<String, BTreeSet<String>>,
    config: &ClusteringConfig,
    original_consistency: &ClusterConsistency,
) -> Vec<Cluster> {
    let conflict_type = if original_consistency
        .hard_conflicts
        .contains(&ConflictType::DoiConflict.as_str().to_string())
    {
        ConflictType::DoiConflict
    } else {
        ConflictType::PmidConflict
    };

    let subclusters_rids = split_cluster_by_id(rids, records_map, conflict_type);

    let mut clusters = Vec::new();
    for sub_rids in subclusters_rids {
        let rid_set: BTreeSet<String> = sub_rids.iter().cloned().collect();
        let sub_edges: Vec<Edge> = cluster_edges.iter().filter(|e| e.involves(&rid_set)).cloned().collect();

        let consistency = check_cluster_consistency(&sub_rids, records_map, &sub_edges, auto_keep_index, config);
        clusters.push(create_cluster(&sub_rids, &sub_edges, consistency, config));
    }

    clusters
}

fn create_cluster(rids: &[String], cluster_edges: &[Edge], consistency: ClusterConsistency, config: &ClusteringConfig) -> Cluster {
    let cluster_id = compute_cluster_id(rids);
    let support = compute_support(cluster_edges, config);
    let status = if !consistency.hard_conflicts.is_empty() || !consistency.soft_conflicts.is_empty() {
        ClusterStatus::Review
    } else {
        ClusterStatus::Auto
    };

    Cluster {
        cluster_id,
        status,
        rids: rids.to_vec(),
        support,
        consistency,
    }
}

fn compute_support(cluster_edges: &[Edge], config: &ClusteringConfig) -> ClusterSupport {
    let mut strong_count = 0u64;
    let mut source_counts: BTreeMap<String, u64> = BTreeMap::new();

    for edge in cluster_edges {
        if edge.is_strong(config.strong_edge_t_strong, config.strong_edge_use_reason_codes) {
            strong_count += 1;
        }
        for code in &edge.reasons {
            if !code.is_empty() {
                *source_counts.entry(code.clone()).or_insert(0) += 1;
            }
        }
    }

    ClusterSupport {
        edges_auto_dup: cluster_edges.len() as u64,
        strong_edge_count: strong_count,
        sources: source_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use srdedupe_model::{Flags, Meta, Raw};

    fn record(rid: &str, doi: Option<&str>) -> CanonicalRecord {
        let mut r = CanonicalRecord::from_ingested(
            rid.to_string(),
            "sha256:0".to_string(),
            "sha256:0".to_string(),
            Meta {
                source_file: "f.ris".to_string(),
                source_format: "ris".to_string(),
                source_db: None,
                source_record_index: 0,
                ingested_at: "2026-01-01T00:00:00Z".to_string(),
                source_file_mtime: None,
                source_file_size_bytes: None,
                parser_version: None,
            },
            Raw::default(),
        );
        r.canon.doi_norm = doi.map(String::from);
        r.flags = Flags::pre_normalization();
        r
    }

    #[test]
    fn three_records_form_one_cluster_via_transitive_closure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair_decisions.jsonl");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"pair_id":"p1","rid_a":"a","rid_b":"b","decision":"AUTO_DUP","p_match":0.99,"reasons":[{{"code":"doi_exact"}}]}}"#).unwrap();
        writeln!(file, r#"{{"pair_id":"p2","rid_a":"b","rid_b":"c","decision":"AUTO_DUP","p_match":0.97,"reasons":[{{"code":"doi_exact"}}]}}"#).unwrap();
        drop(file);

        let records = vec![record("a", Some("10.1/x")), record("b", Some("10.1/x")), record("c", Some("10.1/x"))];
        let clusters = build_clusters(&path, &records, &ClusteringConfig::default()).unwrap();

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].rids, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(clusters[0].status, ClusterStatus::Auto);
    }

    #[test]
    fn conflicting_doi_splits_the_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair_decisions.jsonl");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"pair_id":"p1","rid_a":"a","rid_b":"b","decision":"AUTO_DUP","p_match":0.99,"reasons":[]}}"#).unwrap();
        writeln!(file, r#"{{"pair_id":"p2","rid_a":"b","rid_b":"c","decision":"AUTO_DUP","p_match":0.97,"reasons":[]}}"#).unwrap();
        drop(file);

        let records = vec![record("a", Some("10.1/x")), record("b", Some("10.1/x")), record("c", Some("10.1/y"))];
        let clusters = build_clusters(&path, &records, &ClusteringConfig::default()).unwrap();

        assert_eq!(clusters.len(), 2);
    }
}
