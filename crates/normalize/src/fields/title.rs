//! Title normalization.

use srdedupe_model::{Confidence, Provenance, RawTag};

use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;
use crate::text::normalize_text_for_matching;
use crate::helpers::find_tag_value;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleResult {
    pub raw: Option<String>,
    pub norm_basic: Option<String>,
}

pub fn normalize_title(raw_tags: &[RawTag], source_format: &str) -> (TitleResult, Provenance) {
    let title_tags = tags_for(source_format, "title");
    let Some((title_raw, idx)) = find_tag_value(raw_tags, title_tags) else {
        return (TitleResult::default(), Provenance::new());
    };

    let title_norm = normalize_text_for_matching(title_raw);

    let mut prov = Provenance::new();
    let (k, entry) = build_provenance_entry(
        "canon.title_norm_basic",
        raw_tags,
        &[idx],
        source_format,
        vec![transform(
            "normalize_title",
            "NFKC, casefold, strip accents, collapse whitespace, remove cosmetic punct",
        )],
        Confidence::High,
    );
    prov.insert(k, entry);

    (
        TitleResult {
            raw: Some(title_raw.to_string()),
            norm_basic: Some(title_norm),
        },
        prov,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_title_text() {
        let tags = vec![RawTag {
            tag: "TI".to_string(),
            value_lines: vec!["The Müller Study: A (Re)Analysis!".to_string()],
            value_raw_joined: "The Müller Study: A (Re)Analysis!".to_string(),
            occurrence: 0,
            line_start: 0,
            line_end: 0,
        }];
        let (result, prov) = normalize_title(&tags, "ris");
        assert_eq!(result.norm_basic.as_deref(), Some("the muller study a reanalysis"));
        assert!(prov.contains_key("canon.title_norm_basic"));
    }

    #[test]
    fn missing_title_returns_none() {
        let (result, prov) = normalize_title(&[], "ris");
        assert_eq!(result.raw, None);
        assert!(prov.is_empty());
    }
}
