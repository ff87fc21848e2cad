//! Pairwise scoring pipeline: reads candidate pairs, looks up the records
//! they reference, runs every field comparator, and writes explainable
//! Fellegi-Sunter scores as deterministic JSON-Lines.
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use srdedupe_blocking::CandidatePair;
use srdedupe_model::{jsonl::to_sorted_line, CanonicalRecord};

use crate::comparators::FIELD_CONFIGS;
use crate::error::ScoringError;
use crate::fs_model::FSModel;
use crate::models::{Explain, FieldComparison, ModelInfo, PairScore};

const BUCKET_THRESHOLDS: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const BUCKET_LABELS: [&str; 10] = [
    "0.0-0.1", "0.1-0.2", "0.2-0.3", "0.3-0.4", "0.4-0.5", "0.5-0.6", "0.6-0.7", "0.7-0.8",
    "0.8-0.9", "0.9-1.0",
];

const TOP_K: usize = 5;

/// Maps a warning code to the stats counter it feeds, mirroring the small
/// fixed set of warnings comparators can emit.
fn warning_counter(warning: &str) -> Option<&'static str> {
    match warning {
        "title_truncated" => Some("title_truncated_pairs"),
        "pages_unreliable" => Some("pages_unreliable_pairs"),
        "both_present_id_conflicts" => Some("both_present_id_conflicts"),
        _ => None,
    }
}

/// Bucket label for a `p_match` value, e.g. `"0.5-0.6"`.
pub fn get_p_match_bucket(p_match: f64) -> &'static str {
    for (i, threshold) in BUCKET_THRESHOLDS.iter().enumerate() {
        if p_match < *threshold {
            return BUCKET_LABELS[i];
        }
    }
    BUCKET_LABELS[BUCKET_LABELS.len() - 1]
}

/// Scores a single candidate pair against `model`.
pub fn score_pair(
    record_a: &CanonicalRecord,
    record_b: &CanonicalRecord,
    model: &FSModel,
    candidate_sources: Vec<srdedupe_blocking::CandidateSource>,
) -> Result<PairScore, ScoringError> {
    let mut warnings: Vec<String> = Vec::new();
    let mut field_levels: Vec<(String, String)> = Vec::new();
    let mut field_weights: Vec<(String, String, f64)> = Vec::new();
    let mut comparison: BTreeMap<String, FieldComparison> = BTreeMap::new();

    for config in FIELD_CONFIGS {
        let result = config.compare(record_a, record_b);
        warnings.extend(result.warnings);

        let weight = model.get_weight(config.name, &result.level)?;
        field_levels.push((config.name.to_string(), result.level.clone()));
        field_weights.push((config.name.to_string(), result.level.clone(), weight));

        comparison.insert(
            config.name.to_string(),
            FieldComparison {
                level: result.level,
                sim: result.sim.map(|s| model.round_value(s)),
                weight: model.round_value(weight),
            },
        );
    }

    let llr = model.compute_llr(&field_levels)?;
    let p_match = model.compute_p_match(llr);

    let mut deduped_warnings = Vec::new();
    for w in warnings {
        if !deduped_warnings.contains(&w) {
            deduped_warnings.push(w);
        }
    }

    Ok(PairScore {
        pair_id: format!("{}|{}", record_a.rid, record_b.rid),
        rid_a: record_a.rid.clone(),
        rid_b: record_b.rid.clone(),
        candidate_sources,
        comparison,
        llr: model.round_value(llr),
        p_match: model.round_value(p_match),
        explain: Explain {
            top_contributions: model.top_contributions(&field_weights, TOP_K),
        },
        warnings: deduped_warnings,
        model: ModelInfo {
            name: model.name.clone(),
            version: model.version.clone(),
        },
    })
}

fn load_candidates(path: &Path) -> Result<Vec<CandidatePair>, ScoringError> {
    let file = fs::File::open(path).map_err(|e| ScoringError::CandidatesRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);
    let mut pairs = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| ScoringError::CandidatesRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let pair: CandidatePair =
            serde_json::from_str(&line).map_err(|e| ScoringError::CandidatesRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        pairs.push(pair);
    }
    Ok(pairs)
}

fn build_record_index(records: &[CanonicalRecord]) -> BTreeMap<&str, &CanonicalRecord> {
    records.iter().map(|r| (r.rid.as_str(), r)).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringStats {
    pub pairs_in: u64,
    pub pairs_scored: u64,
    pub pairs_skipped_missing_records: u64,
    pub p_match_buckets: BTreeMap<String, u64>,
    pub warnings: BTreeMap<String, u64>,
}

impl ScoringStats {
    fn new() -> Self {
        let mut p_match_buckets = BTreeMap::new();
        for label in BUCKET_LABELS {
            p_match_buckets.insert(label.to_string(), 0);
        }
        let mut warnings = BTreeMap::new();
        for counter in ["title_truncated_pairs", "pages_unreliable_pairs", "both_present_id_conflicts"] {
            warnings.insert(counter.to_string(), 0);
        }
        Self {
            p_match_buckets,
            warnings,
            ..Default::default()
        }
    }
}

/// Scores every candidate pair in `candidates_path` against `records`,
/// writing sorted, deterministic JSON-Lines to `output_path`.
#[instrument(skip(records, model), fields(records = records.len()))]
pub fn score_all_pairs(
    candidates_path: &Path,
    records: &[CanonicalRecord],
    output_path: &Path,
    model: &FSModel,
) -> Result<ScoringStats, ScoringError> {
    let mut stats = ScoringStats::new();

    let record_index = build_record_index(records);
    let candidates = load_candidates(candidates_path)?;
    stats.pairs_in = candidates.len() as u64;

    let mut pair_scores = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let (Some(record_a), Some(record_b)) = (
            record_index.get(candidate.rid_a.as_str()),
            record_index.get(candidate.rid_b.as_str()),
        ) else {
            stats.pairs_skipped_missing_records += 1;
            warn!(pair_id = %candidate.pair_id, "candidate pair references a missing record");
            continue;
        };

        let pair_score = score_pair(record_a, record_b, model, candidate.sources)?;
        stats.pairs_scored += 1;

        for warning in &pair_score.warnings {
            if let Some(counter) = warning_counter(warning) {
                *stats.warnings.entry(counter.to_string()).or_insert(0) += 1;
            }
        }

        let bucket = get_p_match_bucket(pair_score.p_match);
        *stats.p_match_buckets.entry(bucket.to_string()).or_insert(0) += 1;

        pair_scores.push(pair_score);
    }

    pair_scores.sort_by(|a, b| a.pair_id.cmp(&b.pair_id));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| ScoringError::Io {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }
    let mut file = fs::File::create(output_path).map_err(|e| ScoringError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;
    for pair_score in &pair_scores {
        let line = to_sorted_line(pair_score).map_err(|e| ScoringError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
        writeln!(file, "{line}").map_err(|e| ScoringError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    use srdedupe_blocking::CandidateSource;
    use srdedupe_model::{CanonicalRecord, Flags, Meta, Raw};

    fn model() -> FSModel {
        use crate::fs_model::{FSModelConfig, FieldModelConfig, LevelWeight, ModelMeta};
        let mut fields: Map<String, FieldModelConfig> = Map::new();
        for (name, levels) in [
            ("doi", vec![("exact", 8.0), ("both_present_mismatch", -10.0), ("missing", 0.0)]),
            ("pmid", vec![("exact", 6.0), ("both_present_mismatch", -8.0), ("missing", 0.0)]),
            ("title", vec![("exact", 6.0), ("high", 4.0), ("medium", 1.0), ("low", -1.0), ("missing", 0.0)]),
            ("authors", vec![("strong", 3.0), ("weak", 0.5), ("mismatch", -3.0), ("missing", 0.0)]),
            ("year", vec![("exact", 1.0), ("pm1", 0.2), ("pm2", -0.2), ("far", -2.0), ("missing", 0.0)]),
            ("journal", vec![("high", 1.0), ("low", -1.0), ("missing", 0.0)]),
            ("pages", vec![("unreliable", 0.0), ("exact", 1.0), ("compatible", 0.5), ("mismatch", -1.0), ("missing", 0.0)]),
        ] {
            fields.insert(
                name.to_string(),
                FieldModelConfig {
                    levels: levels
                        .into_iter()
                        .map(|(n, w)| LevelWeight { name: n.to_string(), weight: w })
                        .collect(),
                },
            );
        }
        FSModel::new(FSModelConfig {
            model: ModelMeta { name: "fs_test".to_string(), version: "1.0.0".to_string() },
            lambda_prior: 0.01,
            round_decimals: 4,
            fields,
        })
    }

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
    fn scores_a_matching_doi_pair_high() {
        let model = model();
        let a = record("rid-a", Some("10.1/x"));
        let b = record("rid-b", Some("10.1/x"));
        let score = score_pair(&a, &b, &model, Vec::new()).unwrap();
        assert!(score.p_match > 0.9);
        assert_eq!(score.comparison["doi"].level, "exact");
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(get_p_match_bucket(0.0), "0.0-0.1");
        assert_eq!(get_p_match_bucket(0.95), "0.9-1.0");
        assert_eq!(get_p_match_bucket(1.0), "0.9-1.0");
    }

    #[test]
    fn score_all_pairs_skips_missing_records_and_sorts_output() {
        let model = model();
        let records = vec![record("rid-a", Some("10.1/x")), record("rid-b", Some("10.1/x"))];
        let dir = tempfile::tempdir().unwrap();
        let candidates_path = dir.path().join("candidates.jsonl");
        let source = CandidateSource {
            blocker: "doi_exact".to_string(),
            block_key: "10.1/x".to_string(),
            match_key: "doi_norm".to_string(),
        };
        let line1 = serde_json::to_string(&CandidatePair::new(
            "rid-a".to_string(),
            "rid-b".to_string(),
            vec![source.clone()],
        ))
        .unwrap();
        let line2 = serde_json::to_string(&CandidatePair::new(
            "rid-a".to_string(),
            "rid-missing".to_string(),
            vec![source],
        ))
        .unwrap();
        fs::write(&candidates_path, format!("{line1}\n{line2}\n")).unwrap();

        let output_path = dir.path().join("pair_scores.jsonl");
        let stats = score_all_pairs(&candidates_path, &records, &output_path, &model).unwrap();

        assert_eq!(stats.pairs_in, 2);
        assert_eq!(stats.pairs_scored, 1);
        assert_eq!(stats.pairs_skipped_missing_records, 1);

        let content = fs::read_to_string(&output_path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
