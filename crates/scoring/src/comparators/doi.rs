//! DOI comparator: the strongest identity signal, compared exactly.
use srdedupe_model::CanonicalRecord;

use super::CompareResult;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(a.canon.doi_norm.as_deref(), b.canon.doi_norm.as_deref())
}

fn compare_values(doi_a: Option<&str>, doi_b: Option<&str>) -> CompareResult {
    let (doi_a, doi_b) = match (doi_a, doi_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return CompareResult::new("missing", None, Vec::new()),
    };

    if doi_a == doi_b {
        CompareResult::new("exact", None, Vec::new())
    } else {
        CompareResult::new(
            "both_present_mismatch",
            None,
            vec!["both_present_id_conflicts".to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_when_either_absent() {
        assert_eq!(compare_values(None, Some("10.1/x")).level, "missing");
        assert_eq!(compare_values(Some("10.1/x"), None).level, "missing");
    }

    #[test]
    fn exact_match() {
        let r = compare_values(Some("10.1/x"), Some("10.1/x"));
        assert_eq!(r.level, "exact");
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn mismatch_emits_conflict_warning() {
        let r = compare_values(Some("10.1/x"), Some("10.1/y"));
        assert_eq!(r.level, "both_present_mismatch");
        assert_eq!(r.warnings, vec!["both_present_id_conflicts".to_string()]);
    }
}
