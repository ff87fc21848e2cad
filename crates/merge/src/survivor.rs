//! Survivor selection for canonical merge.
use srdedupe_model::CanonicalRecord;

use crate::error::MergeError;

/// Selects the survivor RID from a cluster's records.
///
/// Ranking, most to least preferred: has DOI, has PMID, has a title, has an
/// abstract, more parsed authors, higher metadata completeness, and finally
/// the lexicographically smallest rid as a deterministic tie-break.
pub fn select_survivor(records: &[CanonicalRecord]) -> Result<String, MergeError> {
    if records.is_empty() {
        return Err(MergeError::EmptySurvivorSet);
    }

    fn ranking_key(record: &CanonicalRecord) -> (bool, bool, bool, bool, i64, i64, &str) {
        let has_doi = record.canon.doi_norm.is_some();
        let has_pmid = record.canon.pmid_norm.is_some();
        let has_title = record.canon.title_raw.is_some();
        let has_abstract = record.canon.abstract_raw.is_some();
        let author_count = record.canon.authors_parsed.as_ref().map(|a| a.len()).unwrap_or(0);
        let completeness = record.canon.completeness_score();

        (
            !has_doi,
            !has_pmid,
            !has_title,
            !has_abstract,
            -(author_count as i64),
            -(completeness as i64),
            record.rid.as_str(),
        )
    }

    let survivor = records
        .iter()
        .min_by(|a, b| ranking_key(a).cmp(&ranking_key(b)))
        .expect("non-empty records checked above");
    Ok(survivor.rid.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn record_with_doi_wins() {
        let a = record("z", None);
        let b = record("a", Some("10.1/x"));
        let survivor = select_survivor(&[a, b]).unwrap();
        assert_eq!(survivor, "a");
    }

    #[test]
    fn ties_break_on_smallest_rid() {
        let a = record("b", None);
        let b = record("a", None);
        let survivor = select_survivor(&[a, b]).unwrap();
        assert_eq!(survivor, "a");
    }

    #[test]
    fn empty_records_is_an_error() {
        let err = select_survivor(&[]).unwrap_err();
        assert!(matches!(err, MergeError::EmptySurvivorSet));
    }
}
