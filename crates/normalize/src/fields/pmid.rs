//! PMID/PMCID normalization.

use srdedupe_model::{Confidence, Provenance, RawTag};

use crate::helpers::{find_tag_value, pmcid_aid_re, pmid_aid_re};
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;

const NBIB_LIKE_FORMATS: &[&str] = &["nbib", "pubmed"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PmidResult {
    pub pmid_raw: Option<String>,
    pub pmid_norm: Option<String>,
    pub pmcid: Option<String>,
}

pub fn normalize_pmid_pmcid(raw_tags: &[RawTag], source_format: &str) -> (PmidResult, Provenance) {
    let mut prov = Provenance::new();

    let pmid_tags = tags_for(source_format, "pmid");
    let pmid_match = find_tag_value(raw_tags, pmid_tags);

    let pmid_raw = pmid_match.map(|(v, _)| v.to_string());
    let mut pmid_norm = pmid_match.and_then(|(v, idx)| {
        let digits: String = v.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        let (k, entry) = build_provenance_entry(
            "canon.pmid_norm",
            raw_tags,
            &[idx],
            source_format,
            vec![transform("extract_digits", "Extract digits only from PMID")],
            Confidence::High,
        );
        prov.insert(k, entry);
        Some(digits)
    });

    if pmid_norm.is_none() && NBIB_LIKE_FORMATS.contains(&source_format) {
        let aid_tags = tags_for(source_format, "pmid_aid");
        for (idx, tag) in raw_tags.iter().enumerate() {
            if aid_tags.contains(&tag.tag.as_str()) {
                if let Some(caps) = pmid_aid_re().captures(&tag.value_raw_joined) {
                    pmid_norm = Some(caps.get(1).unwrap().as_str().to_string());
                    let (k, entry) = build_provenance_entry(
                        "canon.pmid_norm",
                        raw_tags,
                        &[idx],
                        source_format,
                        vec![transform("extract_from_aid", "Extract PMID from AID [pmid] tag")],
                        Confidence::High,
                    );
                    prov.insert(k, entry);
                    break;
                }
            }
        }
    }

    let pmcid_tags = tags_for(source_format, "pmcid");
    let mut pmcid = find_tag_value(raw_tags, pmcid_tags).map(|(v, _)| {
        if v.starts_with("PMC") {
            v.to_string()
        } else {
            format!("PMC{v}")
        }
    });

    if pmcid.is_none() && NBIB_LIKE_FORMATS.contains(&source_format) {
        let aid_tags = tags_for(source_format, "pmcid_aid");
        for tag in raw_tags {
            if aid_tags.contains(&tag.tag.as_str()) {
                if let Some(caps) = pmcid_aid_re().captures(&tag.value_raw_joined) {
                    pmcid = Some(caps.get(1).unwrap().as_str().to_uppercase());
                    break;
                }
            }
        }
    }

    (
        PmidResult {
            pmid_raw,
            pmid_norm,
            pmcid,
        },
        prov,
    )
}
