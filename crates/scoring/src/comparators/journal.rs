//! Journal comparator: string equality of the normalized journal name.
use srdedupe_model::CanonicalRecord;

use super::CompareResult;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(a.canon.journal_norm.as_deref(), b.canon.journal_norm.as_deref())
}

fn compare_values(journal_a: Option<&str>, journal_b: Option<&str>) -> CompareResult {
    let (journal_a, journal_b) = match (journal_a, journal_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return CompareResult::new("missing", None, Vec::new()),
    };

    if journal_a == journal_b {
        CompareResult::new("high", Some(1.0), Vec::new())
    } else {
        CompareResult::new("low", Some(0.0), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_when_either_absent() {
        assert_eq!(compare_values(None, Some("nature")).level, "missing");
    }

    #[test]
    fn high_on_equality() {
        assert_eq!(compare_values(Some("nature"), Some("nature")).level, "high");
    }

    #[test]
    fn low_on_difference() {
        assert_eq!(compare_values(Some("nature"), Some("science")).level, "low");
    }
}
