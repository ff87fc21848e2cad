//! Safety gates: force REVIEW even when `p_match >= t_high`, to keep
//! automatic decisions from discarding conflicting IDs or special records.
use srdedupe_model::CanonicalRecord;

use crate::models::ReasonCode;

fn has_strong_id_match(a: &CanonicalRecord, b: &CanonicalRecord) -> bool {
    if let (Some(a_doi), Some(b_doi)) = (&a.canon.doi_norm, &b.canon.doi_norm) {
        if a_doi == b_doi {
            return true;
        }
    }
    if let (Some(a_pmid), Some(b_pmid)) = (&a.canon.pmid_norm, &b.canon.pmid_norm) {
        if a_pmid == b_pmid {
            return true;
        }
    }
    false
}

/// Checks every safety gate, returning the reasons that force REVIEW
/// (empty if none triggered).
pub fn check_safety_gates(
    record_a: &CanonicalRecord,
    record_b: &CanonicalRecord,
    warnings: &[String],
) -> Vec<ReasonCode> {
    let mut forced = Vec::new();

    if let (Some(a_doi), Some(b_doi)) = (&record_a.canon.doi_norm, &record_b.canon.doi_norm) {
        if a_doi != b_doi {
            forced.push(ReasonCode::ForcedReviewConflictingDoi);
        }
    }
    if let (Some(a_pmid), Some(b_pmid)) = (&record_a.canon.pmid_norm, &record_b.canon.pmid_norm) {
        if a_pmid != b_pmid {
            forced.push(ReasonCode::ForcedReviewConflictingPmid);
        }
    }

    if !has_strong_id_match(record_a, record_b) {
        if warnings.iter().any(|w| w == "title_truncated") {
            forced.push(ReasonCode::ForcedReviewTitleTruncated);
        }
        if warnings.iter().any(|w| w == "pages_unreliable") {
            forced.push(ReasonCode::ForcedReviewPagesUnreliable);
        }
    }

    if record_a.flags.is_erratum_notice || record_b.flags.is_erratum_notice {
        forced.push(ReasonCode::ForcedReviewErratumNotice);
    }
    if record_a.flags.is_retraction_notice || record_b.flags.is_retraction_notice {
        forced.push(ReasonCode::ForcedReviewRetractionNotice);
    }
    if record_a.flags.is_corrected_republished || record_b.flags.is_corrected_republished {
        forced.push(ReasonCode::ForcedReviewCorrectedRepublished);
    }
    if record_a.flags.has_linked_citation || record_b.flags.has_linked_citation {
        forced.push(ReasonCode::ForcedReviewLinkedCitation);
    }

    forced
}

#[cfg(test)]
mod tests {
    use super::*;
    use srdedupe_model::{Flags, Meta, Raw};

    fn record(doi: Option<&str>, pmid: Option<&str>) -> CanonicalRecord {
        let mut r = CanonicalRecord::from_ingested(
            "r".to_string(),
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
        r.canon.pmid_norm = pmid.map(String::from);
        r.flags = Flags::pre_normalization();
        r
    }

    #[test]
    fn conflicting_doi_forces_review() {
        let a = record(Some("10.1/x"), None);
        let b = record(Some("10.1/y"), None);
        let reasons = check_safety_gates(&a, &b, &[]);
        assert!(reasons.contains(&ReasonCode::ForcedReviewConflictingDoi));
    }

    #[test]
    fn data_quality_warnings_ignored_when_strong_id_matches() {
        let a = record(Some("10.1/x"), None);
        let b = record(Some("10.1/x"), None);
        let reasons = check_safety_gates(&a, &b, &["title_truncated".to_string()]);
        assert!(!reasons.contains(&ReasonCode::ForcedReviewTitleTruncated));
    }

    #[test]
    fn data_quality_warnings_force_review_without_strong_id_match() {
        let a = record(None, None);
        let b = record(None, None);
        let reasons = check_safety_gates(&a, &b, &["pages_unreliable".to_string()]);
        assert!(reasons.contains(&ReasonCode::ForcedReviewPagesUnreliable));
    }

    #[test]
    fn special_record_flags_force_review() {
        let mut a = record(None, None);
        a.flags.is_retraction_notice = true;
        let b = record(None, None);
        let reasons = check_safety_gates(&a, &b, &[]);
        assert!(reasons.contains(&ReasonCode::ForcedReviewRetractionNotice));
    }

    #[test]
    fn no_gates_triggered_is_empty() {
        let a = record(Some("10.1/x"), None);
        let b = record(Some("10.1/x"), None);
        assert!(check_safety_gates(&a, &b, &[]).is_empty());
    }
}
