//! Consistency checks for clusters: catch the transitive-closure errors a
//! pairwise AUTO-DUP decision can't see on its own.
use std::collections::{BTreeMap, BTreeSet};

use srdedupe_model::CanonicalRecord;

use crate::models::{ClusterConsistency, ClusteringConfig, ConflictType, Edge};

pub fn check_cluster_consistency(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    cluster_edges: &[Edge],
    auto_keep_index: &BTreeMap<String, BTreeSet<String>>,
    config: &ClusteringConfig,
) -> ClusterConsistency {
    let hard = collect_hard_conflicts(rids, records_map, auto_keep_index);
    let soft = collect_soft_conflicts(rids, records_map, cluster_edges, config);
    let notes = collect_notes(rids, config);

    ClusterConsistency { hard_conflicts: hard, soft_conflicts: soft, notes }
}

fn collect_hard_conflicts(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    auto_keep_index: &BTreeMap<String, BTreeSet<String>>,
) -> Vec<String> {
    let mut conflicts = Vec::new();
    let mut doi_values: BTreeSet<&str> = BTreeSet::new();
    let mut pmid_values: BTreeSet<&str> = BTreeSet::new();
    let mut has_special_record = false;

    for rid in rids {
        let Some(record) = records_map.get(rid.as_str()) else { continue };

        if let Some(doi) = &record.canon.doi_norm {
            doi_values.insert(doi.as_str());
        }
        if let Some(pmid) = &record.canon.pmid_norm {
            pmid_values.insert(pmid.as_str());
        }
        if record.flags.is_erratum_notice
            || record.flags.is_retraction_notice
            || record.flags.is_corrected_republished
            || record.flags.has_linked_citation
        {
            has_special_record = true;
        }
    }

    if doi_values.len() >= 2 {
        conflicts.push(ConflictType::DoiConflict.as_str().to_string());
    }
    if pmid_values.len() >= 2 {
        conflicts.push(ConflictType::PmidConflict.as_str().to_string());
    }
    if has_special_record {
        conflicts.push(ConflictType::LinkedCitationRisk.as_str().to_string());
    }
    if has_internal_auto_keep(rids, auto_keep_index) {
        conflicts.push(ConflictType::InternalAutoKeepContradiction.as_str().to_string());
    }

    conflicts
}

fn has_internal_auto_keep(rids: &[String], auto_keep_index: &BTreeMap<String, BTreeSet<String>>) -> bool {
    let rid_set: BTreeSet<&str> = rids.iter().map(String::as_str).collect();
    for rid in rids {
        if let Some(partners) = auto_keep_index.get(rid) {
            if partners.iter().any(|p| rid_set.contains(p.as_str())) {
                return true;
            }
        }
    }
    false
}

fn collect_soft_conflicts(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    cluster_edges: &[Edge],
    config: &ClusteringConfig,
) -> Vec<String> {
    let mut conflicts = Vec::new();
    let mut years: Vec<i32> = Vec::new();
    let mut title_keys: BTreeSet<&str> = BTreeSet::new();

    for rid in rids {
        let Some(record) = records_map.get(rid.as_str()) else { continue };
        if let Some(year) = record.canon.year_norm {
            years.push(year);
        }
        if let Some(key) = &record.keys.title_key_strict {
            title_keys.insert(key.as_str());
        }
    }

    if years.len() >= 2 {
        let spread = years.iter().max().unwrap() - years.iter().min().unwrap();
        if spread > config.soft_conflicts_year_max_spread {
            conflicts.push(ConflictType::YearFar.as_str().to_string());
        }
    }

    if title_keys.len() > config.soft_conflicts_title_divergence_tolerance + 1 {
        conflicts.push(ConflictType::TitleKeyDivergent.as_str().to_string());
    }

    if is_bridged_by_weak_edges(rids, cluster_edges, config) {
        conflicts.push(ConflictType::BridgedByWeakEdges.as_str().to_string());
    }

    conflicts
}

fn is_bridged_by_weak_edges(rids: &[String], cluster_edges: &[Edge], config: &ClusteringConfig) -> bool {
    if rids.len() < 3 {
        return false;
    }

    let has_any_strong = cluster_edges
        .iter()
        .any(|e| e.is_strong(config.strong_edge_t_strong, config.strong_edge_use_reason_codes));
    if !has_any_strong {
        return true;
    }

    let mut degree: BTreeMap<&str, u32> = BTreeMap::new();
    for edge in cluster_edges {
        *degree.entry(edge.rid_a.as_str()).or_insert(0) += 1;
        *degree.entry(edge.rid_b.as_str()).or_insert(0) += 1;
    }

    for rid in rids {
        if degree.get(rid.as_str()).copied().unwrap_or(0) != 1 {
            continue;
        }
        let incident = cluster_edges.iter().find(|e| e.rid_a == *rid || e.rid_b == *rid);
        if let Some(edge) = incident {
            if !edge.is_strong(config.strong_edge_t_strong, config.strong_edge_use_reason_codes) {
                return true;
            }
        }
    }

    false
}

fn collect_notes(rids: &[String], config: &ClusteringConfig) -> Vec<String> {
    let mut notes = Vec::new();
    if rids.len() > config.oversized_cluster_max_size_auto {
        notes.push(format!(
            "oversized_cluster_size_{}_exceeds_{}",
            rids.len(),
            config.oversized_cluster_max_size_auto
        ));
    }
    notes
}

/// Splits a cluster by DOI or PMID identity when that identifier conflicts
/// within the component: records sharing the same value stay together,
/// records with no value at all form their own group.
pub fn split_cluster_by_id(
    rids: &[String],
    records_map: &BTreeMap<&str, &CanonicalRecord>,
    conflict_type: ConflictType,
) -> Vec<Vec<String>> {
    let mut id_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut no_id_group: Vec<String> = Vec::new();

    for rid in rids {
        let Some(record) = records_map.get(rid.as_str()) else {
            no_id_group.push(rid.clone());
            continue;
        };

        let id_value = match conflict_type {
            ConflictType::DoiConflict => &record.canon.doi_norm,
            ConflictType::PmidConflict => &record.canon.pmid_norm,
            _ => {
                no_id_group.push(rid.clone());
                continue;
            }
        };

        match id_value {
            Some(value) => id_groups.entry(value.clone()).or_default().push(rid.clone()),
            None => no_id_group.push(rid.clone()),
        }
    }

    let mut subclusters: Vec<Vec<String>> = id_groups
        .into_values()
        .map(|mut group| {
            group.sort();
            group
        })
        .collect();

    if !no_id_group.is_empty() {
        no_id_group.sort();
        subclusters.push(no_id_group);
    }

    subclusters
}
