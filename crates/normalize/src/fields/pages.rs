//! Pagination normalization.

use srdedupe_model::{Confidence, Provenance, RawTag};

use crate::helpers::{dash_normalize_re, elocator_re, find_tag_value, page_range_re};
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagesResult {
    pub raw: Option<String>,
    pub norm_long: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
    pub article_number: Option<String>,
    pub unreliable: bool,
}

pub fn normalize_pages(raw_tags: &[RawTag], source_format: &str) -> (PagesResult, Provenance) {
    let mut pages_raw: Option<String> = None;
    let mut page_first: Option<String> = None;
    let mut page_last: Option<String> = None;
    let mut pages_unreliable = false;
    let mut page_indices: Vec<usize> = Vec::new();

    let sp_tags = tags_for(source_format, "pages_start");
    let ep_tags = tags_for(source_format, "pages_end");

    if !sp_tags.is_empty() || !ep_tags.is_empty() {
        let sp = find_tag_value(raw_tags, sp_tags);
        let ep = find_tag_value(raw_tags, ep_tags);

        if let Some((v, idx)) = sp {
            page_first = Some(v.to_string());
            page_indices.push(idx);
        }
        if let Some((v, idx)) = ep {
            page_last = Some(v.to_string());
            page_indices.push(idx);
        }

        pages_raw = match (&page_first, &page_last) {
            (Some(f), Some(l)) => Some(format!("{f}-{l}")),
            (Some(f), None) => Some(f.clone()),
            (None, Some(l)) => Some(l.clone()),
            (None, None) => None,
        };
    }

    if pages_raw.is_none() {
        let pg_tags = tags_for(source_format, "pages");
        if let Some((v, idx)) = find_tag_value(raw_tags, pg_tags) {
            pages_raw = Some(v.to_string());
            page_indices.push(idx);
            if let Some(caps) = page_range_re().captures(v) {
                if caps.get(0).map(|m| m.start()) == Some(0) {
                    page_first = Some(caps.get(1).unwrap().as_str().to_string());
                    page_last = Some(caps.get(2).unwrap().as_str().to_string());
                } else if v.chars().all(|c| c.is_ascii_digit()) {
                    page_first = Some(v.to_string());
                } else {
                    pages_unreliable = true;
                }
            } else if v.chars().all(|c| c.is_ascii_digit()) {
                page_first = Some(v.to_string());
            } else {
                pages_unreliable = true;
            }
        }
    }

    let mut article_number = None;
    if let Some(raw) = pages_raw.as_deref() {
        if elocator_re().is_match(raw) {
            article_number = Some(raw.to_string());
            pages_unreliable = true;
            page_first = None;
            page_last = None;
        }
    }

    let pages_norm_long = if pages_raw.is_some() && !pages_unreliable {
        let raw = pages_raw.as_deref().unwrap();
        let dashed = dash_normalize_re().replace_all(raw, "-");
        Some(dashed.replace(' ', ""))
    } else {
        None
    };

    let mut prov = Provenance::new();
    if pages_raw.is_some() && !page_indices.is_empty() {
        let confidence = if pages_unreliable { Confidence::Medium } else { Confidence::High };
        let (k, entry) = build_provenance_entry(
            "canon.pages_norm_long",
            raw_tags,
            &page_indices,
            source_format,
            vec![transform("normalize_pages", "Normalize separators, remove spaces")],
            confidence,
        );
        prov.insert(k, entry);
    }

    (
        PagesResult {
            raw: pages_raw,
            norm_long: pages_norm_long,
            first: page_first,
            last: page_last,
            article_number,
            unreliable: pages_unreliable,
        },
        prov,
    )
}
