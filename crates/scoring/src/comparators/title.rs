//! Title comparator: Jaccard similarity over shingles (falling back to
//! whitespace-split tokens), with a truncation-aware level cap.
use std::collections::BTreeSet;

use srdedupe_model::CanonicalRecord;

use super::{jaccard_similarity, CompareResult};

const HIGH: f64 = 0.92;
const MEDIUM: f64 = 0.85;
const LOW: f64 = 0.75;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(
        a.canon.title_norm_basic.as_deref(),
        b.canon.title_norm_basic.as_deref(),
        a.keys.title_shingles.as_deref(),
        b.keys.title_shingles.as_deref(),
        a.flags.title_truncated,
        b.flags.title_truncated,
    )
}

fn compare_values(
    title_a: Option<&str>,
    title_b: Option<&str>,
    shingles_a: Option<&[String]>,
    shingles_b: Option<&[String]>,
    truncated_a: bool,
    truncated_b: bool,
) -> CompareResult {
    let mut warnings = Vec::new();
    let truncated = truncated_a || truncated_b;
    if truncated {
        warnings.push("title_truncated".to_string());
    }

    let (title_a, title_b) = match (title_a, title_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return CompareResult::new("missing", None, warnings),
    };

    if title_a == title_b {
        return CompareResult::new("exact", Some(1.0), warnings);
    }

    let sim = match (shingles_a, shingles_b) {
        (Some(sa), Some(sb)) if !sa.is_empty() && !sb.is_empty() => {
            let sa: BTreeSet<&str> = sa.iter().map(String::as_str).collect();
            let sb: BTreeSet<&str> = sb.iter().map(String::as_str).collect();
            jaccard_similarity(&sa, &sb)
        }
        _ => {
            let ta: BTreeSet<&str> = title_a.split_whitespace().collect();
            let tb: BTreeSet<&str> = title_b.split_whitespace().collect();
            jaccard_similarity(&ta, &tb)
        }
    };

    let mut level = if sim >= HIGH {
        "high"
    } else if sim >= MEDIUM {
        "medium"
    } else if sim >= LOW {
        "low"
    } else {
        return CompareResult::new("missing", Some(sim), warnings);
    };

    if truncated && level == "high" {
        level = "medium";
    }

    CompareResult::new(level, Some(sim), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_when_either_absent() {
        assert_eq!(compare_values(None, Some("a"), None, None, false, false).level, "missing");
    }

    #[test]
    fn exact_string_match_short_circuits() {
        let r = compare_values(Some("same title"), Some("same title"), None, None, false, false);
        assert_eq!(r.level, "exact");
        assert_eq!(r.sim, Some(1.0));
    }

    #[test]
    fn high_similarity_from_shingles() {
        let sa = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let sb = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let r = compare_values(Some("x"), Some("y"), Some(&sa), Some(&sb), false, false);
        assert_eq!(r.level, "high");
    }

    #[test]
    fn below_low_threshold_is_missing() {
        let sa = vec!["a".to_string()];
        let sb = vec!["z".to_string()];
        let r = compare_values(Some("x"), Some("y"), Some(&sa), Some(&sb), false, false);
        assert_eq!(r.level, "missing");
    }

    #[test]
    fn truncation_downgrades_high_to_medium() {
        let sa = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let sb = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let r = compare_values(Some("x"), Some("y"), Some(&sa), Some(&sb), true, false);
        assert_eq!(r.level, "medium");
        assert!(r.warnings.contains(&"title_truncated".to_string()));
    }

    #[test]
    fn falls_back_to_whitespace_tokens_without_shingles() {
        let r = compare_values(
            Some("one two three four five six seven eight nine ten eleven twelve thirteen"),
            Some("one two three four five six seven eight nine ten eleven twelve fourteen"),
            None,
            None,
            false,
            false,
        );
        assert_eq!(r.level, "medium");
    }
}
