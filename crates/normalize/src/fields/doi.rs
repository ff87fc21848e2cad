//! DOI normalization.

use srdedupe_model::{Confidence, Provenance, RawTag};

use crate::helpers::{doi_suffix_re, doi_url_re, find_tag_value_where, percent_decode};
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoiResult {
    pub raw: Option<String>,
    pub norm: Option<String>,
    pub url: Option<String>,
}

pub fn normalize_doi(raw_tags: &[RawTag], source_format: &str) -> (DoiResult, Provenance) {
    let doi_tags = tags_for(source_format, "doi");
    let direct = find_tag_value_where(raw_tags, doi_tags, |v| is_doi_candidate(v, source_format));

    let found: Option<(String, usize)> = match direct {
        Some((value, idx)) => Some((value.to_string(), idx)),
        None => {
            let url_tags = tags_for(source_format, "doi_url");
            raw_tags.iter().enumerate().find_map(|(idx, tag)| {
                if url_tags.contains(&tag.tag.as_str()) {
                    doi_url_re()
                        .captures(&tag.value_raw_joined)
                        .map(|caps| (caps.get(1).unwrap().as_str().to_string(), idx))
                } else {
                    None
                }
            })
        }
    };

    match found {
        Some((value, idx)) => finish(raw_tags, source_format, doi_tags, value, idx),
        None => (DoiResult::default(), Provenance::new()),
    }
}

fn finish(
    raw_tags: &[RawTag],
    source_format: &str,
    doi_tags: &[&str],
    doi_raw: String,
    doi_idx: usize,
) -> (DoiResult, Provenance) {
    let doi_norm = match normalize_doi_string(&doi_raw) {
        Some(n) => n,
        None => {
            return (
                DoiResult {
                    raw: Some(doi_raw),
                    norm: None,
                    url: None,
                },
                Provenance::new(),
            )
        }
    };

    let doi_url = format!("https://doi.org/{doi_norm}");
    let transforms = doi_transforms(&doi_raw);
    let confidence = if doi_tags.iter().take(2).any(|t| *t == raw_tags[doi_idx].tag.as_str()) {
        Confidence::High
    } else {
        Confidence::Medium
    };

    let mut prov = Provenance::new();
    let (k, v) = build_provenance_entry(
        "canon.doi_norm",
        raw_tags,
        &[doi_idx],
        source_format,
        transforms.clone(),
        confidence,
    );
    prov.insert(k, v);

    let mut url_transforms = transforms;
    url_transforms.push(transform(
        "generate_canonical_url",
        "Generate https://doi.org/ URL",
    ));
    let (k, v) = build_provenance_entry(
        "canon.doi_url",
        raw_tags,
        &[doi_idx],
        source_format,
        url_transforms,
        confidence,
    );
    prov.insert(k, v);

    (
        DoiResult {
            raw: Some(doi_raw),
            norm: Some(doi_norm),
            url: Some(doi_url),
        },
        prov,
    )
}

fn is_doi_candidate(value: &str, source_format: &str) -> bool {
    if matches!(source_format, "nbib" | "pubmed") {
        value.to_lowercase().contains("[doi]") || value.starts_with("10.")
    } else {
        true
    }
}

fn normalize_doi_string(doi: &str) -> Option<String> {
    if doi.is_empty() {
        return None;
    }

    let mut doi = doi.trim().to_string();
    doi = doi_suffix_re().replace(&doi, "").trim().to_string();

    if doi.starts_with("http://") || doi.starts_with("https://") {
        doi = url_path(&doi)?;
    }

    for prefix in ["doi:", "doi.org/", "dx.doi.org/"] {
        if doi.to_lowercase().starts_with(prefix) {
            doi = doi[prefix.len()..].to_string();
            break;
        }
    }

    doi = percent_decode(&doi);
    doi = doi.trim_end_matches(['.', ',', ';']).trim().to_string();
    doi = doi.to_lowercase();

    if !doi.starts_with("10.") {
        return None;
    }

    Some(doi)
}

/// Path component of a `scheme://host/path` URL, leading slash stripped.
fn url_path(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://")?.1;
    let path = after_scheme.find('/').map(|i| &after_scheme[i + 1..]).unwrap_or("");
    let path = path.split(['?', '#']).next().unwrap_or("");
    Some(path.to_string())
}

fn doi_transforms(doi_raw: &str) -> Vec<srdedupe_model::Transform> {
    let mut transforms = Vec::new();

    if doi_suffix_re().is_match(doi_raw) {
        transforms.push(transform("strip_doi_suffix", "Remove [doi] suffix from AID tag"));
    }
    if doi_raw.starts_with("http://") || doi_raw.starts_with("https://") {
        transforms.push(transform("extract_from_url", "Extract DOI from URL"));
    }
    if doi_raw.to_lowercase().starts_with("doi:") {
        transforms.push(transform("strip_prefix", "Remove 'doi:' prefix"));
    }
    if doi_raw.contains('%') {
        transforms.push(transform("url_decode", "Decode URL-encoded characters"));
    }
    if doi_raw.trim_end_matches(['.', ',', ';']) != doi_raw {
        transforms.push(transform("trim_punct", "Remove trailing punctuation"));
    }
    transforms.push(transform("casefold", "Apply Unicode case folding"));

    transforms
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
    fn normalizes_plain_doi() {
        let tags = vec![tag("DO", "10.1234/Test.ABC")];
        let (result, prov) = normalize_doi(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("10.1234/test.abc"));
        assert_eq!(result.url.as_deref(), Some("https://doi.org/10.1234/test.abc"));
        assert!(prov.contains_key("canon.doi_norm"));
        assert!(prov.contains_key("canon.doi_url"));
    }

    #[test]
    fn strips_nbib_doi_suffix() {
        let tags = vec![tag("AID", "10.1234/test [doi]")];
        let (result, _) = normalize_doi(&tags, "nbib");
        assert_eq!(result.norm.as_deref(), Some("10.1234/test"));
    }

    #[test]
    fn extracts_doi_from_url_fallback() {
        let tags = vec![tag("UR", "https://doi.org/10.1234/test")];
        let (result, _) = normalize_doi(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("10.1234/test"));
    }

    #[test]
    fn rejects_non_doi_value() {
        let tags = vec![tag("DO", "not-a-doi")];
        let (result, prov) = normalize_doi(&tags, "ris");
        assert_eq!(result.norm, None);
        assert!(prov.is_empty());
    }

    #[test]
    fn preserves_parentheses_in_sici_doi() {
        let tags = vec![tag("DO", "10.1002/(SICI)1234")];
        let (result, _) = normalize_doi(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("10.1002/(sici)1234"));
    }
}
