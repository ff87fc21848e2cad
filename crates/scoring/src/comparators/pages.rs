//! Pagination comparator: the unreliable flag short-circuits everything
//! else, then article numbers, then full pagination, then first page, in
//! that fallback order.
use srdedupe_model::CanonicalRecord;

use super::CompareResult;

pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> CompareResult {
    compare_values(
        a.canon.pages_norm_long.as_deref(),
        b.canon.pages_norm_long.as_deref(),
        a.canon.page_first.as_deref(),
        b.canon.page_first.as_deref(),
        a.canon.article_number.as_deref(),
        b.canon.article_number.as_deref(),
        a.flags.pages_unreliable,
        b.flags.pages_unreliable,
    )
}

#[allow(clippy::too_many_arguments)]
fn compare_values(
    pages_norm_long_a: Option<&str>,
    pages_norm_long_b: Option<&str>,
    page_first_a: Option<&str>,
    page_first_b: Option<&str>,
    article_number_a: Option<&str>,
    article_number_b: Option<&str>,
    pages_unreliable_a: bool,
    pages_unreliable_b: bool,
) -> CompareResult {
    if pages_unreliable_a || pages_unreliable_b {
        return CompareResult::new("unreliable", None, vec!["pages_unreliable".to_string()]);
    }

    if let (Some(an_a), Some(an_b)) = (non_empty(article_number_a), non_empty(article_number_b)) {
        let level = if an_a == an_b { "exact" } else { "mismatch" };
        return CompareResult::new(level, None, Vec::new());
    }

    let long_pair = (non_empty(pages_norm_long_a), non_empty(pages_norm_long_b));
    if let (Some(pa), Some(pb)) = long_pair {
        if pa == pb {
            return CompareResult::new("exact", None, Vec::new());
        }
    }

    if let (Some(fa), Some(fb)) = (non_empty(page_first_a), non_empty(page_first_b)) {
        let level = if fa == fb { "compatible" } else { "mismatch" };
        return CompareResult::new(level, None, Vec::new());
    }

    if long_pair.0.is_some() && long_pair.1.is_some() {
        return CompareResult::new("mismatch", None, Vec::new());
    }

    CompareResult::new("missing", None, Vec::new())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
