//! Journal normalization.

use srdedupe_model::{Confidence, Provenance, RawTag};
use unicode_normalization::UnicodeNormalization;

use crate::helpers::find_tag_value;
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;
use crate::text::strip_accents;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JournalResult {
    pub full: Option<String>,
    pub abbrev: Option<String>,
    pub norm: Option<String>,
}

pub fn normalize_journal(raw_tags: &[RawTag], source_format: &str) -> (JournalResult, Provenance) {
    let full_tags = tags_for(source_format, "journal_full");
    let full_match = find_tag_value(raw_tags, full_tags);

    let abbrev_tags = tags_for(source_format, "journal_abbrev");
    let abbrev_match = find_tag_value(raw_tags, abbrev_tags);

    let journal_full = full_match.map(|(v, _)| v.to_string());
    let journal_abbrev = abbrev_match.map(|(v, _)| v.to_string());

    let (to_normalize, idx): (&str, usize) = if let Some(full) = journal_full.as_deref() {
        (full, full_match.unwrap().1)
    } else if let Some(abbrev) = journal_abbrev.as_deref() {
        (abbrev, abbrev_match.unwrap().1)
    } else {
        return (
            JournalResult {
                full: journal_full,
                abbrev: journal_abbrev,
                norm: None,
            },
            Provenance::new(),
        );
    };

    let journal_norm = normalize_journal_string(to_normalize);

    let mut prov = Provenance::new();
    let (k, entry) = build_provenance_entry(
        "canon.journal_norm",
        raw_tags,
        &[idx],
        source_format,
        vec![transform(
            "normalize_journal",
            "NFKC, casefold, strip accents, collapse whitespace",
        )],
        Confidence::High,
    );
    prov.insert(k, entry);

    (
        JournalResult {
            full: journal_full,
            abbrev: journal_abbrev,
            norm: Some(journal_norm),
        },
        prov,
    )
}

fn normalize_journal_string(journal: &str) -> String {
    if journal.is_empty() {
        return String::new();
    }
    let nfkc: String = journal.nfkc().collect();
    let folded = nfkc.to_lowercase();
    let unaccented = strip_accents(&folded);
    let collapsed = unaccented.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(|c: char| c == '.' || c == ' ').to_string()
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
    fn prefers_full_name_over_abbreviation() {
        let tags = vec![tag("JA", "J Biol Chem."), tag("JF", "Journal of Biological Chemistry")];
        let (result, _) = normalize_journal(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("journal of biological chemistry"));
    }

    #[test]
    fn falls_back_to_abbreviation() {
        let tags = vec![tag("JA", "J Biol Chem.")];
        let (result, _) = normalize_journal(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("j biol chem"));
    }

    #[test]
    fn strips_trailing_period() {
        let tags = vec![tag("JF", "Nature.")];
        let (result, _) = normalize_journal(&tags, "ris");
        assert_eq!(result.norm.as_deref(), Some("nature"));
    }
}
