//! Year comparator: discrete buckets by absolute delta.
use srdedupe_model::CanonicalRecord;

use super::CompareResult;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(a.canon.year_norm, b.canon.year_norm)
}

fn compare_values(year_a: Option<i32>, year_b: Option<i32>) -> CompareResult {
    let (year_a, year_b) = match (year_a, year_b) {
        (Some(a), Some(b)) => (a, b),
        _ => return CompareResult::new("missing", None, Vec::new()),
    };

    let delta = (year_a - year_b).abs();
    let level = match delta {
        0 => "exact",
        1 => "pm1",
        2 => "pm2",
        _ => "far",
    };
    CompareResult::new(level, None, Vec::new())
}
