//! Candidate pair generation orchestrator: coordinates multiple blocker
//! plug-ins into a single, deterministic, deduplicated stream of candidate
//! pairs written as JSON-Lines.
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{instrument, warn};

use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;
use crate::error::BlockingError;
use crate::models::{CandidatePair, CandidateSource};
use crate::stats::{BlockerStats, GenerationStats, GlobalStats};

pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1000;

/// Runs every blocker over `records`, merges their candidate pairs, and
/// writes the deduplicated result to `output_path` as sorted JSON-Lines.
/// Blockers are consumed (their `initialize` needs `&mut self`); callers
/// that need the blockers afterward should not rely on this function.
#[instrument(skip_all, fields(blockers = blockers.len(), records = records.len()))]
pub fn generate_candidates(
    mut blockers: Vec<Box<dyn Blocker>>,
    records: &[CanonicalRecord],
    output_path: &Path,
    max_block_size: usize,
) -> Result<GenerationStats, BlockingError> {
    blockers.sort_by(|a, b| a.name().cmp(b.name()));

    for blocker in blockers.iter_mut() {
        blocker.initialize(records);
    }

    let mut stats: BTreeMap<String, BlockerStats> = BTreeMap::new();
    let mut pair_sources: BTreeMap<String, Vec<CandidateSource>> = BTreeMap::new();

    for blocker in blockers.iter() {
        let (blocker_stats, blocker_pairs) = run_blocker(blocker.as_ref(), records, max_block_size);
        stats.insert(blocker.name().to_string(), blocker_stats);
        for (pair_id, source) in blocker_pairs {
            pair_sources.entry(pair_id).or_default().push(source);
        }
    }

    write_jsonl(&pair_sources, output_path)?;

    let global = GlobalStats {
        pairs_total_unique: pair_sources.len() as u64,
        pairs_with_multiple_sources: pair_sources.values().filter(|s| s.len() > 1).count() as u64,
    };

    Ok(GenerationStats {
        blockers: stats,
        global,
    })
}

fn run_blocker(
    blocker: &dyn Blocker,
    records: &[CanonicalRecord],
    max_block_size: usize,
) -> (BlockerStats, BTreeMap<String, CandidateSource>) {
    let mut stats = BlockerStats::default();

    let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        stats.records_seen += 1;
        let keys = blocker.block_keys(record);
        if keys.is_empty() {
            continue;
        }
        stats.records_keyed += 1;
        for key in keys {
            index.entry(key).or_default().push(record.rid.clone());
        }
    }
    stats.unique_keys = index.len() as u64;

    let mut unique_pairs: BTreeMap<String, CandidateSource> = BTreeMap::new();

    for (block_key, rids) in &index {
        let mut rids: Vec<&String> = rids.iter().collect();
        rids.sort();
        rids.dedup();
        let block_size = rids.len();

        if block_size < 2 {
            continue;
        }

        stats.blocks_gt1 += 1;
        stats.max_block = stats.max_block.max(block_size as u64);

        if block_size > max_block_size {
            warn!(
                blocker = blocker.name(),
                block_key = %truncate(block_key, 100),
                block_size,
                max_block_size,
                "oversized block"
            );
        }

        let source = CandidateSource {
            blocker: blocker.name().to_string(),
            block_key: block_key.clone(),
            match_key: blocker.match_key().to_string(),
        };

        for i in 0..rids.len() {
            for j in (i + 1)..rids.len() {
                let pair_id = format!("{}|{}", rids[i], rids[j]);
                stats.pairs_raw += 1;
                unique_pairs.entry(pair_id).or_insert_with(|| source.clone());
            }
        }
    }

    stats.pairs_unique = unique_pairs.len() as u64;
    (stats, unique_pairs)
}

fn write_jsonl(
    pair_sources: &BTreeMap<String, Vec<CandidateSource>>,
    output_path: &Path,
) -> Result<(), BlockingError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| BlockingError::Io {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }

    let mut file = fs::File::create(output_path).map_err(|e| BlockingError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;

    for pair_id in pair_sources.keys() {
        let Some((rid_a, rid_b)) = pair_id.split_once('|') else {
            continue;
        };
        let pair = CandidatePair::new(
            rid_a.to_string(),
            rid_b.to_string(),
            pair_sources[pair_id].clone(),
        );
        let line = serde_json::to_string(&pair).map_err(|e| BlockingError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
        writeln!(file, "{line}").map_err(|e| BlockingError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockers::DoiExactBlocker;
    use crate::test_support::record_with;

    #[test]
    fn pairs_records_sharing_a_doi() {
        let records = vec![
            record_with(|r| r.canon.doi_norm = Some("10.1/x".to_string())),
            record_with(|r| r.canon.doi_norm = Some("10.1/x".to_string())),
            record_with(|r| r.canon.doi_norm = Some("10.1/y".to_string())),
        ];
        let blockers: Vec<Box<dyn Blocker>> = vec![Box::new(DoiExactBlocker)];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("candidates.jsonl");

        let stats = generate_candidates(blockers, &records, &out, DEFAULT_MAX_BLOCK_SIZE).unwrap();

        assert_eq!(stats.global.pairs_total_unique, 1);
        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn pair_found_by_two_blockers_has_two_sources() {
        let records = vec![
            record_with(|r| {
                r.canon.doi_norm = Some("10.1/x".to_string());
                r.canon.pmid_norm = Some("1".to_string());
            }),
            record_with(|r| {
                r.canon.doi_norm = Some("10.1/x".to_string());
                r.canon.pmid_norm = Some("1".to_string());
            }),
        ];
        let blockers: Vec<Box<dyn Blocker>> = vec![
            Box::new(DoiExactBlocker),
            Box::new(crate::blockers::PmidExactBlocker),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("candidates.jsonl");

        let stats = generate_candidates(blockers, &records, &out, DEFAULT_MAX_BLOCK_SIZE).unwrap();
        assert_eq!(stats.global.pairs_total_unique, 1);
        assert_eq!(stats.global.pairs_with_multiple_sources, 1);
    }

    #[test]
    fn pair_ids_are_lexicographically_ordered() {
        let records = vec![
            record_with(|r| r.canon.doi_norm = Some("10.1/x".to_string())),
            record_with(|r| r.canon.doi_norm = Some("10.1/x".to_string())),
        ];
        let blockers: Vec<Box<dyn Blocker>> = vec![Box::new(DoiExactBlocker)];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("candidates.jsonl");
        generate_candidates(blockers, &records, &out, DEFAULT_MAX_BLOCK_SIZE).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let pair: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        let rid_a = pair["rid_a"].as_str().unwrap();
        let rid_b = pair["rid_b"].as_str().unwrap();
        assert!(rid_a < rid_b);
    }

    #[test]
    fn singleton_blocks_produce_no_pairs() {
        let records = vec![record_with(|r| r.canon.doi_norm = Some("10.1/x".to_string()))];
        let blockers: Vec<Box<dyn Blocker>> = vec![Box::new(DoiExactBlocker)];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("candidates.jsonl");
        let stats = generate_candidates(blockers, &records, &out, DEFAULT_MAX_BLOCK_SIZE).unwrap();
        assert_eq!(stats.global.pairs_total_unique, 0);
    }
}
