//! Merge workflow: clusters to deduplicated outputs.
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::instrument;

use srdedupe_clustering::{Cluster, ClusterStatus};
use srdedupe_model::CanonicalRecord;

use crate::error::MergeError;
use crate::field_merge::merge_canon_fields;
use crate::models::{compute_merged_id, MergePolicy, MergeSummary, MergedRecord};
use crate::ris_writer::{write_ris_file, write_ris_from_records};
use crate::survivor::select_survivor;

const RIS_LINE_ENDING: &str = "\r\n";

pub fn load_clusters(clusters_path: &Path) -> Result<Vec<Cluster>, MergeError> {
    let file = fs::File::open(clusters_path)
        .map_err(|e| MergeError::Io { path: clusters_path.display().to_string(), message: e.to_string() })?;
    let reader = BufReader::new(file);

    let mut clusters = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MergeError::Io { path: clusters_path.display().to_string(), message: e.to_string() })?;
        if line.trim().is_empty() {
            continue;
        }
        let cluster: Cluster = serde_json::from_str(&line)
            .map_err(|e| MergeError::MalformedCluster { line: line_num + 1, message: e.to_string() })?;
        clusters.push(cluster);
    }
    Ok(clusters)
}

/// Runs the canonical merge stage: AUTO clusters are merged into one
/// survivor-based record each, REVIEW clusters are left as individual
/// records for manual review, and records that matched no one at all are
/// written out as singletons. Writes `merged_records.jsonl`,
/// `deduped_auto.ris`, `review_pending.ris`, `singletons.ris`,
/// `clusters_enriched.jsonl`, and `merge_summary.json`.
#[instrument(skip(records), fields(records = records.len()))]
pub fn process_canonical_merge(
    clusters_path: &Path,
    records: &[CanonicalRecord],
    output_dir: &Path,
    reports_dir: &Path,
) -> Result<MergeSummary, MergeError> {
    let started_at = Instant::now();
    let records_map: BTreeMap<&str, &CanonicalRecord> = records.iter().map(|r| (r.rid.as_str(), r)).collect();

    let mut clusters = load_clusters(clusters_path)?;
    clusters.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));

    let auto_clusters: Vec<&Cluster> = clusters.iter().filter(|c| c.status == ClusterStatus::Auto).collect();
    let review_clusters: Vec<&Cluster> = clusters.iter().filter(|c| c.status == ClusterStatus::Review).collect();

    let mut summary = MergeSummary {
        records_in_total: records.len() as u64,
        clusters_auto_in: auto_clusters.len() as u64,
        clusters_review_in: review_clusters.len() as u64,
        timestamp: Utc::now().to_rfc3339(),
        ..MergeSummary::default()
    };

    let merge_policy = MergePolicy::default();
    let mut merged_records: Vec<MergedRecord> = Vec::new();
    let mut enriched_clusters: Vec<serde_json::Value> = Vec::new();
    let mut clustered_rids: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();

    for cluster in &auto_clusters {
        let mut cluster_rids_sorted = cluster.rids.clone();
        cluster_rids_sorted.sort();
        clustered_rids.extend(cluster_rids_sorted.iter().cloned());

        let cluster_records: Vec<CanonicalRecord> = cluster_rids_sorted
            .iter()
            .filter_map(|rid| records_map.get(rid.as_str()).map(|r| (*r).clone()))
            .collect();

        summary.records_not_found += (cluster_rids_sorted.len() - cluster_records.len()) as u64;

        if cluster_records.is_empty() {
            continue;
        }

        let survivor_rid = select_survivor(&cluster_records)?;
        let (merged_canon, merge_provenance) = merge_canon_fields(&cluster_records, &survivor_rid)?;

        let merged_id = compute_merged_id(&cluster.rids);
        let merged_record = MergedRecord {
            merged_id: merged_id.clone(),
            cluster_id: Some(cluster.cluster_id.clone()),
            status: "AUTO".to_string(),
            survivor_rid: survivor_rid.clone(),
            member_rids: cluster_rids_sorted.clone(),
            canon: merged_canon,
            merge_provenance,
            merge_policy: merge_policy.clone(),
        };

        let mut enriched = serde_json::to_value(cluster_to_dict(cluster)).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(map) = &mut enriched {
            map.insert("survivor_rid".to_string(), serde_json::Value::String(survivor_rid));
            map.insert("merged_id".to_string(), serde_json::Value::String(merged_id));
        }
        enriched_clusters.push(enriched);

        summary.auto_clusters_merged += 1;
        summary.max_cluster_size_merged = summary.max_cluster_size_merged.max(cluster.rids.len() as u64);

        merged_records.push(merged_record);
    }

    for cluster in &review_clusters {
        clustered_rids.extend(cluster.rids.iter().cloned());
        enriched_clusters.push(serde_json::to_value(cluster_to_dict(cluster)).unwrap_or(serde_json::Value::Null));
    }

    enriched_clusters.sort_by(|a, b| {
        let a_id = a.get("cluster_id").and_then(|v| v.as_str()).unwrap_or("");
        let b_id = b.get("cluster_id").and_then(|v| v.as_str()).unwrap_or("");
        a_id.cmp(b_id)
    });
    merged_records.sort_by(|a, b| a.merged_id.cmp(&b.merged_id));

    summary.records_out_deduped_auto = merged_records.len() as u64;

    fs::create_dir_all(output_dir).map_err(|e| MergeError::Io { path: output_dir.display().to_string(), message: e.to_string() })?;

    let merged_records_path = output_dir.join("merged_records.jsonl");
    write_jsonl(&merged_records_path, &merged_records)?;

    let deduped_ris_path = output_dir.join("deduped_auto.ris");
    write_ris_file(&merged_records, &deduped_ris_path, RIS_LINE_ENDING)?;

    let mut review_records: Vec<CanonicalRecord> = Vec::new();
    for cluster in &review_clusters {
        let mut sorted_rids = cluster.rids.clone();
        sorted_rids.sort();
        for rid in sorted_rids {
            if let Some(record) = records_map.get(rid.as_str()) {
                review_records.push((*record).clone());
            }
        }
    }
    summary.records_out_review_pending = review_records.len() as u64;

    if !review_records.is_empty() {
        let review_ris_path = output_dir.join("review_pending.ris");
        write_ris_from_records(&review_records, &review_ris_path, RIS_LINE_ENDING)?;
    }

    let mut singleton_records: Vec<CanonicalRecord> =
        records.iter().filter(|r| !clustered_rids.contains(&r.rid)).cloned().collect();
    singleton_records.sort_by(|a, b| a.rid.cmp(&b.rid));
    summary.singletons_count = singleton_records.len() as u64;

    if !singleton_records.is_empty() {
        let singletons_ris_path = output_dir.join("singletons.ris");
        write_ris_from_records(&singleton_records, &singletons_ris_path, RIS_LINE_ENDING)?;
    }

    summary.records_out_unique_total = summary.singletons_count + summary.auto_clusters_merged;
    if summary.records_in_total > 0 {
        let records_removed = summary.records_in_total.saturating_sub(
            summary.records_out_unique_total + summary.records_out_review_pending,
        );
        let raw_rate = records_removed as f64 / summary.records_in_total as f64;
        summary.dedup_rate = (raw_rate * 10_000.0).round() / 10_000.0;
    }

    let clusters_enriched_path = output_dir.join("clusters_enriched.jsonl");
    write_jsonl(&clusters_enriched_path, &enriched_clusters)?;

    summary.execution_time_seconds = started_at.elapsed().as_secs_f64();

    fs::create_dir_all(reports_dir).map_err(|e| MergeError::Io { path: reports_dir.display().to_string(), message: e.to_string() })?;
    let summary_path = reports_dir.join("merge_summary.json");
    let pretty = serde_json::to_string_pretty(&serde_json::to_value(&summary).map_err(|e| MergeError::Io {
        path: summary_path.display().to_string(),
        message: e.to_string(),
    })?)
    .map_err(|e| MergeError::Io { path: summary_path.display().to_string(), message: e.to_string() })?;
    fs::write(&summary_path, pretty).map_err(|e| MergeError::Io { path: summary_path.display().to_string(), message: e.to_string() })?;

    Ok(summary)
}

fn cluster_to_dict(cluster: &Cluster) -> serde_json::Value {
    serde_json::to_value(cluster).unwrap_or(serde_json::Value::Null)
}

fn write_jsonl<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<(), MergeError> {
    let mut out = String::new();
    for item in items {
        let line = srdedupe_model::jsonl::to_sorted_line(item)
            .map_err(|e| MergeError::Io { path: path.display().to_string(), message: e.to_string() })?;
        out.push_str(&line);
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| MergeError::Io { path: path.display().to_string(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use srdedupe_model::{Flags, Meta, Raw};

    fn record(rid: &str, doi: Option<&str>, title: &str) -> CanonicalRecord {
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
        r.canon.title_raw = Some(title.to_string());
        r.flags = Flags::pre_normalization();
        r
    }

    #[test]
    fn auto_cluster_merges_and_singleton_is_separated() {
        let dir = tempfile::tempdir().unwrap();
        let clusters_path = dir.path().join("clusters.jsonl");
        let mut file = fs::File::create(&clusters_path).unwrap();
        writeln!(
            file,
            r#"{{"cluster_id":"c:aaa","status":"AUTO","rids":["a","b"],"support":{{"edges_auto_dup":1,"strong_edge_count":1,"sources":{{}}}},"consistency":{{"hard_conflicts":[],"soft_conflicts":[],"notes":[]}}}}"#
        )
        .unwrap();
        drop(file);

        let records = vec![
            record("a", Some("10.1/x"), "Short"),
            record("b", Some("10.1/x"), "A Much Longer Title"),
            record("s1", None, "Solo Record"),
        ];

        let output_dir = dir.path().join("dedup");
        let reports_dir = dir.path().join("reports");
        let summary = process_canonical_merge(&clusters_path, &records, &output_dir, &reports_dir).unwrap();

        assert_eq!(summary.auto_clusters_merged, 1);
        assert_eq!(summary.singletons_count, 1);
        assert!(output_dir.join("deduped_auto.ris").exists());
        assert!(output_dir.join("singletons.ris").exists());
        assert!(!output_dir.join("review_pending.ris").exists());
    }
}
