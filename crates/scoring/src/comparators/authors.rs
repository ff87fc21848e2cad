//! Author comparator: first-author signature equality plus overlap Jaccard
//! over strict author signatures.
use std::collections::BTreeSet;

use srdedupe_model::CanonicalRecord;

use super::{jaccard_similarity, CompareResult};

const STRONG_OVERLAP: f64 = 0.5;
const WEAK_OVERLAP: f64 = 0.3;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(
        a.canon.first_author_sig.as_deref(),
        b.canon.first_author_sig.as_deref(),
        a.canon.author_sig_strict.as_deref(),
        b.canon.author_sig_strict.as_deref(),
    )
}

fn compare_values(
    first_author_sig_a: Option<&str>,
    first_author_sig_b: Option<&str>,
    author_sig_strict_a: Option<&[String]>,
    author_sig_strict_b: Option<&[String]>,
) -> CompareResult {
    let (sig_a, sig_b) = match (first_author_sig_a, first_author_sig_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return CompareResult::new("missing", None, Vec::new()),
    };

    let first_author_match = sig_a == sig_b;

    let sim = match (author_sig_strict_a, author_sig_strict_b) {
        (Some(sa), Some(sb)) if !sa.is_empty() && !sb.is_empty() => {
            let sa: BTreeSet<&str> = sa.iter().map(String::as_str).collect();
            let sb: BTreeSet<&str> = sb.iter().map(String::as_str).collect();
            Some(jaccard_similarity(&sa, &sb))
        }
        _ => None,
    };

    if first_author_match && sim.is_some_and(|s| s >= STRONG_OVERLAP) {
        CompareResult::new("strong", sim, Vec::new())
    } else if first_author_match || sim.is_some_and(|s| s >= WEAK_OVERLAP) {
        CompareResult::new("weak", sim, Vec::new())
    } else {
        CompareResult::new("mismatch", sim, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_when_first_author_sig_absent() {
        assert_eq!(compare_values(None, Some("smith_j"), None, None).level, "missing");
    }

    #[test]
    fn strong_when_first_author_matches_with_high_overlap() {
        let sa = vec!["smith_j".to_string(), "doe_a".to_string()];
        let sb = vec!["smith_j".to_string(), "doe_a".to_string()];
        let r = compare_values(Some("smith_j"), Some("smith_j"), Some(&sa), Some(&sb));
        assert_eq!(r.level, "strong");
    }

    #[test]
    fn weak_when_only_first_author_matches() {
        let sa = vec!["smith_j".to_string(), "doe_a".to_string()];
        let sb = vec!["smith_j".to_string(), "lee_k".to_string()];
        let r = compare_values(Some("smith_j"), Some("smith_j"), Some(&sa), Some(&sb));
        assert_eq!(r.level, "weak");
    }

    #[test]
    fn mismatch_when_first_authors_differ_and_overlap_is_low() {
        let sa = vec!["smith_j".to_string()];
        let sb = vec!["lee_k".to_string()];
        let r = compare_values(Some("smith_j"), Some("lee_k"), Some(&sa), Some(&sb));
        assert_eq!(r.level, "mismatch");
    }
}
