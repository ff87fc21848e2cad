//! Volume, issue, abstract, language, and publication-type extraction.
//! These fields carry no dedicated provenance entries beyond the ones the
//! orchestrator attaches when it knows which canonical path they fill.

use srdedupe_model::RawTag;

use crate::helpers::{find_all_tag_values, find_tag_value};
use crate::tag_mappings::tags_for;
use crate::text::normalize_text_light;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OtherFieldsResult {
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub abstract_raw: Option<String>,
    pub abstract_norm: Option<String>,
    pub language: Option<String>,
    pub publication_type: Option<Vec<String>>,
}

pub fn extract_other_fields(raw_tags: &[RawTag], source_format: &str) -> OtherFieldsResult {
    let volume = find_tag_value(raw_tags, tags_for(source_format, "volume")).map(|(v, _)| v.to_string());
    let issue = find_tag_value(raw_tags, tags_for(source_format, "issue")).map(|(v, _)| v.to_string());

    let abstract_raw =
        find_tag_value(raw_tags, tags_for(source_format, "abstract")).map(|(v, _)| v.to_string());
    let abstract_norm = abstract_raw.as_deref().map(normalize_text_light);

    let language =
        find_tag_value(raw_tags, tags_for(source_format, "language")).map(|(v, _)| v.to_string());

    let pub_types: Vec<String> = find_all_tag_values(raw_tags, tags_for(source_format, "publication_type"))
        .into_iter()
        .map(|(v, _)| v.to_string())
        .collect();
    let publication_type = (!pub_types.is_empty()).then_some(pub_types);

    OtherFieldsResult {
        volume,
        issue,
        abstract_raw,
        abstract_norm,
        language,
        publication_type,
    }
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
    fn extracts_all_other_fields() {
        let tags = vec![
            tag("VL", "12"),
            tag("IS", "3"),
            tag("AB", "Results: p < 0.05."),
            tag("LA", "eng"),
            tag("TY", "JOUR"),
        ];
        let result = extract_other_fields(&tags, "ris");
        assert_eq!(result.volume.as_deref(), Some("12"));
        assert_eq!(result.issue.as_deref(), Some("3"));
        assert_eq!(result.abstract_norm.as_deref(), Some("results: p < 0.05."));
        assert_eq!(result.language.as_deref(), Some("eng"));
        assert_eq!(result.publication_type, Some(vec!["JOUR".to_string()]));
    }

    #[test]
    fn missing_fields_are_none() {
        let result = extract_other_fields(&[], "ris");
        assert_eq!(result.volume, None);
        assert_eq!(result.publication_type, None);
    }
}
