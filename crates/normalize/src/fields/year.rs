//! Year extraction.

use srdedupe_model::{Confidence, Provenance, RawTag};

use crate::helpers::year_re;
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct YearResult {
    pub raw: Option<String>,
    pub norm: Option<i32>,
    pub source: Option<String>,
}

pub fn extract_year(raw_tags: &[RawTag], source_format: &str) -> (YearResult, Provenance) {
    let year_tags = tags_for(source_format, "year");

    let found = raw_tags.iter().enumerate().find_map(|(idx, tag)| {
        if !year_tags.contains(&tag.tag.as_str()) {
            return None;
        }
        let value = tag.value_raw_joined.trim();
        if value.is_empty() {
            return None;
        }
        year_re().find(value).map(|m| {
            let year: i32 = m.as_str().parse().expect("regex guarantees digits");
            (value.to_string(), year, format!("{}.{}", source_format.to_uppercase(), tag.tag), idx)
        })
    });

    let Some((year_raw, year_norm, year_source, idx)) = found else {
        return (YearResult::default(), Provenance::new());
    };

    let mut prov = Provenance::new();
    let (k, entry) = build_provenance_entry(
        "canon.year_norm",
        raw_tags,
        &[idx],
        source_format,
        vec![transform("extract_year", "Extract first 4-digit year from date field")],
        Confidence::High,
    );
    prov.insert(k, entry);

    (
        YearResult {
            raw: Some(year_raw),
            norm: Some(year_norm),
            source: Some(year_source),
        },
        prov,
    )
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
    fn extracts_year_from_date_string() {
        let tags = vec![tag("PY", "2019/06/15")];
        let (result, prov) = extract_year(&tags, "ris");
        assert_eq!(result.norm, Some(2019));
        assert_eq!(result.source.as_deref(), Some("RIS.PY"));
        assert!(prov.contains_key("canon.year_norm"));
    }

    #[test]
    fn no_year_tag_returns_none() {
        let (result, prov) = extract_year(&[], "ris");
        assert_eq!(result.norm, None);
        assert!(prov.is_empty());
    }
}
