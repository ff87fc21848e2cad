//! PMID comparator: same shape as the DOI comparator.
use srdedupe_model::CanonicalRecord;

use super::CompareResult;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(a.canon.pmid_norm.as_deref(), b.canon.pmid_norm.as_deref())
}

fn compare_values(pmid_a: Option<&str>, pmid_b: Option<&str>) -> CompareResult {
    let (pmid_a, pmid_b) = match (pmid_a, pmid_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return CompareResult::new("missing", None, Vec::new()),
    };

    if pmid_a == pmid_b {
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
        assert_eq!(compare_values(None, Some("1")).level, "missing");
    }

    #[test]
    fn exact_match() {
        assert_eq!(compare_values(Some("1"), Some("1")).level, "exact");
    }

    #[test]
    fn mismatch_emits_conflict_warning() {
        let r = compare_values(Some("1"), Some("2"));
        assert_eq!(r.level, "both_present_mismatch");
        assert_eq!(r.warnings, vec!["both_present_id_conflicts".to_string()]);
    }
}
