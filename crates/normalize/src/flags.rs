//! Quality and safety flag derivation.

use srdedupe_model::{AuthorParsed, Flags};

use crate::helpers::{erratum_title_re, retraction_title_re, CORRECTED_REPUBLISHED_PUB_TYPES, ERRATUM_PUB_TYPES, RETRACTION_PUB_TYPES};

#[allow(clippy::too_many_arguments)]
pub fn generate_flags(
    doi_norm: Option<&str>,
    pmid_norm: Option<&str>,
    title_raw: Option<&str>,
    authors_parsed: Option<&[AuthorParsed]>,
    year_norm: Option<i32>,
    pages_unreliable: bool,
    publication_type: Option<&[String]>,
) -> Flags {
    let doi_present = doi_norm.is_some();
    let pmid_present = pmid_norm.is_some();

    let title_missing = title_raw.map(|t| t.trim().is_empty()).unwrap_or(true);
    let title_truncated = title_raw.map(is_title_truncated).unwrap_or(false);

    let authors_missing = authors_parsed.map(|a| a.is_empty()).unwrap_or(true);
    let authors_incomplete = authors_parsed.map(are_authors_incomplete).unwrap_or(false);

    let year_missing = year_norm.is_none();

    let (is_erratum, is_retraction, is_corrected) =
        detect_special_record_type(title_raw, publication_type);

    Flags {
        doi_present,
        pmid_present,
        title_missing,
        title_truncated,
        authors_missing,
        authors_incomplete,
        year_missing,
        pages_unreliable,
        is_erratum_notice: is_erratum,
        is_retraction_notice: is_retraction,
        is_corrected_republished: is_corrected,
        has_linked_citation: false,
    }
}

fn is_title_truncated(title: &str) -> bool {
    title.contains("...")
        || title.ends_with('\u{2026}')
        || title.ends_with("[...]")
        || title.to_lowercase().contains("[truncated]")
}

fn are_authors_incomplete(authors: &[AuthorParsed]) -> bool {
    if authors.is_empty() {
        return false;
    }
    let missing_family = authors.iter().filter(|a| a.family.is_none()).count();
    missing_family > authors.len() / 2
}

fn detect_special_record_type(
    title_raw: Option<&str>,
    publication_type: Option<&[String]>,
) -> (bool, bool, bool) {
    let mut is_erratum = false;
    let mut is_retraction = false;
    let mut is_corrected = false;

    if let Some(types) = publication_type {
        let lower: Vec<String> = types.iter().map(|t| t.to_lowercase()).collect();
        if lower.iter().any(|t| ERRATUM_PUB_TYPES.contains(&t.as_str())) {
            is_erratum = true;
        }
        if lower.iter().any(|t| RETRACTION_PUB_TYPES.contains(&t.as_str())) {
            is_retraction = true;
        }
        if lower
            .iter()
            .any(|t| CORRECTED_REPUBLISHED_PUB_TYPES.contains(&t.as_str()))
        {
            is_corrected = true;
        }
    }

    if let Some(title) = title_raw {
        if !is_erratum && erratum_title_re().is_match(title) {
            is_erratum = true;
        }
        if !is_retraction && retraction_title_re().is_match(title) {
            is_retraction = true;
        }
    }

    (is_erratum, is_retraction, is_corrected)
}
