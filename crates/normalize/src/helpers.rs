//! Compiled regex patterns and raw-tag lookup helpers used across field
//! normalizers.

use std::sync::OnceLock;

use regex::Regex;
use srdedupe_model::RawTag;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        pub fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            CELL.get_or_init(|| Regex::new($pattern).expect("static pattern is valid"))
        }
    };
}

static_regex!(doi_suffix_re, r"(?i)\s*\[doi\]\s*$");
static_regex!(doi_url_re, r"(?i)(?:doi\.org|dx\.doi\.org)/([^\s?#]+)");
static_regex!(year_re, r"\b(19|20)\d{2}\b");
static_regex!(elocator_re, r"(?i)^e\d+");
static_regex!(page_range_re, r"(\d+)\s*[-\u{2013}\u{2014}]\s*(\d+)");
static_regex!(dash_normalize_re, r"\s*[\u{2013}\u{2014}]\s*");
static_regex!(suffix_re, r"(?i)\s+(Jr\.?|Sr\.?|II|III|IV|V)$");
static_regex!(initials_re, r"^[A-Z]\.?(\s*[A-Z]\.?)*$");
static_regex!(pmid_aid_re, r"(?i)(\d+)\s*\[pmid\]");
static_regex!(pmcid_aid_re, r"(?i)(PMC\d+)\s*\[pmc\]");
static_regex!(
    erratum_title_re,
    r"(?i)\b(erratum|corrigendum|correction|errata|addendum)\b"
);
static_regex!(
    retraction_title_re,
    r"(?i)\b(retraction|retracted|withdrawal)\b"
);

pub const ERRATUM_PUB_TYPES: &[&str] = &[
    "erratum",
    "published erratum",
    "correction",
    "corrigendum",
    "addendum",
];
pub const RETRACTION_PUB_TYPES: &[&str] = &[
    "retraction of publication",
    "retraction",
    "retracted publication",
    "withdrawal",
];
pub const CORRECTED_REPUBLISHED_PUB_TYPES: &[&str] =
    &["corrected and republished article", "corrected and republished"];

/// First tag value (trimmed, non-empty) among `tag_names` in priority
/// order, walking raw tags in document order within each name. Returns the
/// value and its index into `raw_tags` for provenance.
pub fn find_tag_value<'a>(
    raw_tags: &'a [RawTag],
    tag_names: &[&str],
) -> Option<(&'a str, usize)> {
    find_tag_value_where(raw_tags, tag_names, |_| true)
}

/// Same as [`find_tag_value`] but only accepts values matching `predicate`.
pub fn find_tag_value_where<'a>(
    raw_tags: &'a [RawTag],
    tag_names: &[&str],
    predicate: impl Fn(&str) -> bool,
) -> Option<(&'a str, usize)> {
    for tag_name in tag_names {
        for (i, tag) in raw_tags.iter().enumerate() {
            if tag.tag == *tag_name {
                let value = tag.value_raw_joined.trim();
                if !value.is_empty() && predicate(value) {
                    return Some((value, i));
                }
            }
        }
    }
    None
}

/// Minimal percent-decoder for DOI URL extraction (`%2F` -> `/`, etc.).
/// Invalid escapes are left verbatim rather than rejected.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Every matching (value, index) pair across the given tag names, in
/// document order, ignoring name priority.
pub fn find_all_tag_values<'a>(raw_tags: &'a [RawTag], tag_names: &[&str]) -> Vec<(&'a str, usize)> {
    raw_tags
        .iter()
        .enumerate()
        .filter_map(|(i, tag)| {
            if tag_names.contains(&tag.tag.as_str()) {
                let value = tag.value_raw_joined.trim();
                (!value.is_empty()).then_some((value, i))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, value: &str) -> RawTag {
        RawTag {
            tag: name.to_string(),
            value_lines: vec![value.to_string()],
            value_raw_joined: value.to_string(),
            occurrence: 0,
            line_start: 0,
            line_end: 0,
        }
    }

    #[test]
    fn finds_first_nonempty_in_priority_order() {
        let tags = vec![tag("DI", "10.1/y"), tag("DO", "10.1/x")];
        let (value, idx) = find_tag_value(&tags, &["DO", "DI"]).unwrap();
        assert_eq!(value, "10.1/x");
        assert_eq!(idx, 1);
    }

    #[test]
    fn falls_back_to_next_priority_name() {
        let tags = vec![tag("DI", "10.1/y")];
        let (value, _) = find_tag_value(&tags, &["DO", "DI"]).unwrap();
        assert_eq!(value, "10.1/y");
    }

    #[test]
    fn skips_blank_values() {
        let tags = vec![tag("DO", "   "), tag("DI", "10.1/y")];
        let (value, _) = find_tag_value(&tags, &["DO", "DI"]).unwrap();
        assert_eq!(value, "10.1/y");
    }

    #[test]
    fn finds_all_matches_in_document_order() {
        let tags = vec![tag("AU", "Smith J"), tag("TI", "x"), tag("AU", "Doe A")];
        let matches = find_all_tag_values(&tags, &["AU"]);
        assert_eq!(matches, vec![("Smith J", 0), ("Doe A", 2)]);
    }

    #[test]
    fn year_regex_matches_first_occurrence() {
        let caught = year_re().find("Published 2019, reprinted 2021").unwrap();
        assert_eq!(caught.as_str(), "2019");
    }

    #[test]
    fn percent_decode_handles_escaped_slash() {
        assert_eq!(percent_decode("10.1002%2F%28sici%29"), "10.1002/(sici)");
    }

    #[test]
    fn percent_decode_passes_through_literal_percent() {
        assert_eq!(percent_decode("100%done"), "100%done");
    }
}
