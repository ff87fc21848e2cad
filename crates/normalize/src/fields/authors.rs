//! Author parsing and signature generation.

use std::collections::BTreeSet;

use srdedupe_model::{AuthorParsed, Confidence, Provenance, RawTag};

use crate::helpers::{find_all_tag_values, initials_re, suffix_re};
use crate::prov::{build_provenance_entry, transform};
use crate::tag_mappings::tags_for;
use crate::text::strip_accents;

const GIVEN_FAMILY_FORMATS: &[&str] = &["bibtex", "wos", "endnote_tagged"];
const AND_SEPARATED_FORMATS: &[&str] = &["bibtex"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorsResult {
    pub raw: Option<Vec<String>>,
    pub parsed: Option<Vec<AuthorParsed>>,
    pub first_sig: Option<String>,
    pub sig_strict: Option<Vec<String>>,
    pub sig_loose: Option<Vec<String>>,
}

pub fn normalize_authors(raw_tags: &[RawTag], source_format: &str) -> (AuthorsResult, Provenance) {
    let author_tags = tags_for(source_format, "author");
    let mut matches = find_all_tag_values(raw_tags, author_tags)
        .into_iter()
        .filter(|(v, _)| v.to_lowercase() != "et al.")
        .map(|(v, i)| (v.to_string(), i))
        .collect::<Vec<_>>();

    if matches.is_empty() {
        return (AuthorsResult::default(), Provenance::new());
    }

    if AND_SEPARATED_FORMATS.contains(&source_format) {
        matches = split_and_separated_authors(&matches);
    }

    let authors_raw: Vec<String> = matches.iter().map(|(v, _)| v.clone()).collect();
    let author_indices: Vec<usize> = matches.iter().map(|(_, i)| *i).collect();

    let authors_parsed: Vec<AuthorParsed> = authors_raw
        .iter()
        .map(|a| parse_author(a, source_format))
        .collect();

    let mut first_author_sig = None;
    let mut author_sig_strict = Vec::new();
    let mut author_sig_loose = Vec::new();

    for (i, author) in authors_parsed.iter().enumerate() {
        if let (Some(family), Some(initials)) = (&author.family, &author.initials) {
            let family_norm = strip_accents(&family.to_lowercase());
            let sig_strict = format!("{family_norm}|{initials}");
            author_sig_strict.push(sig_strict.clone());

            if i == 0 {
                first_author_sig = Some(sig_strict);
            }

            let first_initial = initials.chars().next().map(String::from).unwrap_or_default();
            author_sig_loose.push(format!("{family_norm}|{first_initial}"));
        }
    }

    let author_sig_loose_sorted: Option<Vec<String>> = if author_sig_loose.is_empty() {
        None
    } else {
        let set: BTreeSet<String> = author_sig_loose.into_iter().collect();
        Some(set.into_iter().collect())
    };
    let author_sig_strict_final = (!author_sig_strict.is_empty()).then_some(author_sig_strict);

    let mut prov = Provenance::new();
    let (k, entry) = build_provenance_entry(
        "canon.authors_parsed",
        raw_tags,
        &author_indices,
        source_format,
        vec![transform("parse_author_names", "Parse author names into structured format")],
        Confidence::High,
    );
    prov.insert(k, entry);

    if first_author_sig.is_some() {
        let (k, entry) = build_provenance_entry(
            "canon.first_author_sig",
            raw_tags,
            &author_indices[..1.min(author_indices.len())],
            source_format,
            vec![transform(
                "generate_author_signature",
                "Generate casefold+accent-stripped family|initials signature",
            )],
            Confidence::High,
        );
        prov.insert(k, entry);
    }

    if author_sig_strict_final.is_some() {
        let (k, entry) = build_provenance_entry(
            "canon.author_sig_strict",
            raw_tags,
            &author_indices,
            source_format,
            vec![transform(
                "generate_author_signature",
                "Generate ordered casefold+accent-stripped family|initials signatures",
            )],
            Confidence::High,
        );
        prov.insert(k, entry);
    }

    if author_sig_loose_sorted.is_some() {
        let (k, entry) = build_provenance_entry(
            "canon.author_sig_loose",
            raw_tags,
            &author_indices,
            source_format,
            vec![transform(
                "generate_loose_signature",
                "Generate sorted casefold+accent-stripped family|first_initial signatures",
            )],
            Confidence::Medium,
        );
        prov.insert(k, entry);
    }

    (
        AuthorsResult {
            raw: Some(authors_raw),
            parsed: Some(authors_parsed),
            first_sig: first_author_sig,
            sig_strict: author_sig_strict_final,
            sig_loose: author_sig_loose_sorted,
        },
        prov,
    )
}

/// Splits BibTeX-style `"Author One and Author Two"` into individual
/// entries, each keeping the parent tag's index for provenance.
fn split_and_separated_authors(matches: &[(String, usize)]) -> Vec<(String, usize)> {
    let mut expanded = Vec::new();
    for (value, idx) in matches {
        for part in value.split(" and ") {
            let stripped = part.trim();
            if !stripped.is_empty() && stripped.to_lowercase() != "et al." {
                expanded.push((stripped.to_string(), *idx));
            }
        }
    }
    expanded
}

/// Disambiguates the no-comma convention via `source_format`: RIS/NBIB use
/// "Family Given", BibTeX/WoS/EndNote use "Given Family".
fn parse_author(author_str: &str, source_format: &str) -> AuthorParsed {
    let author_str = author_str.trim();

    if let Some((family_part, rest_part)) = author_str.split_once(',') {
        let mut family = family_part.trim().to_string();
        let rest = rest_part.trim().to_string();

        let mut suffix = None;
        if let Some(m) = suffix_re().find(&family) {
            let (start, matched) = (m.start(), m.as_str().trim().to_string());
            suffix = Some(matched);
            family = family[..start].trim().to_string();
        }

        let (given, initials) = if initials_re().is_match(&rest) {
            let initials: String = rest.chars().filter(|c| c.is_alphabetic()).collect();
            (None, Some(initials.to_uppercase()))
        } else if !rest.is_empty() {
            let initials = rest
                .split_whitespace()
                .filter_map(|w| w.chars().next())
                .map(|c| c.to_ascii_uppercase())
                .collect::<String>();
            (Some(rest), (!initials.is_empty()).then_some(initials))
        } else {
            (None, None)
        };

        return AuthorParsed {
            family: Some(family),
            given,
            initials,
            suffix,
            raw: author_str.to_string(),
        };
    }

    let parts: Vec<&str> = author_str.split_whitespace().collect();
    let (family, given, initials) = if parts.len() == 1 {
        (Some(parts[0].to_string()), None, None)
    } else if GIVEN_FAMILY_FORMATS.contains(&source_format) {
        let family = parts[parts.len() - 1].to_string();
        let given_parts = &parts[..parts.len() - 1];
        let given = given_parts.join(" ");
        let initials: String = given_parts
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        (Some(family), Some(given), (!initials.is_empty()).then_some(initials))
    } else {
        let family = parts[0].to_string();
        let given_parts = &parts[1..];
        let given = given_parts.join(" ");
        let initials: String = given_parts
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        (Some(family), Some(given), (!initials.is_empty()).then_some(initials))
    };

    AuthorParsed {
        family,
        given,
        initials,
        suffix: None,
        raw: author_str.to_string(),
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
    fn parses_comma_form_with_initials() {
        let tags = vec![tag("AU", "Smith, J. K.")];
        let (result, _) = normalize_authors(&tags, "ris");
        let parsed = &result.parsed.unwrap()[0];
        assert_eq!(parsed.family.as_deref(), Some("Smith"));
        assert_eq!(parsed.initials.as_deref(), Some("JK"));
    }

    #[test]
    fn parses_comma_form_with_given_name() {
        let tags = vec![tag("AU", "Smith, John Kyle")];
        let (result, _) = normalize_authors(&tags, "ris");
        let parsed = &result.parsed.unwrap()[0];
        assert_eq!(parsed.given.as_deref(), Some("John Kyle"));
        assert_eq!(parsed.initials.as_deref(), Some("JK"));
    }

    #[test]
    fn parses_family_given_no_comma_for_ris() {
        let tags = vec![tag("AU", "Smith John")];
        let (result, _) = normalize_authors(&tags, "ris");
        let parsed = &result.parsed.unwrap()[0];
        assert_eq!(parsed.family.as_deref(), Some("Smith"));
        assert_eq!(parsed.given.as_deref(), Some("John"));
    }

    #[test]
    fn parses_given_family_no_comma_for_bibtex() {
        let tags = vec![tag("author", "John Smith")];
        let (result, _) = normalize_authors(&tags, "bibtex");
        let parsed = &result.parsed.unwrap()[0];
        assert_eq!(parsed.family.as_deref(), Some("Smith"));
        assert_eq!(parsed.given.as_deref(), Some("John"));
    }

    #[test]
    fn splits_bibtex_and_separated_authors() {
        let tags = vec![tag("author", "John Smith and Jane Doe")];
        let (result, _) = normalize_authors(&tags, "bibtex");
        assert_eq!(result.raw.unwrap().len(), 2);
    }

    #[test]
    fn filters_out_et_al() {
        let tags = vec![tag("AU", "Smith, J."), tag("AU", "et al.")];
        let (result, _) = normalize_authors(&tags, "ris");
        assert_eq!(result.raw.unwrap().len(), 1);
    }

    #[test]
    fn strips_generational_suffix() {
        let tags = vec![tag("AU", "Smith Jr., John")];
        let (result, _) = normalize_authors(&tags, "ris");
        let parsed = &result.parsed.unwrap()[0];
        assert_eq!(parsed.family.as_deref(), Some("Smith"));
        assert_eq!(parsed.suffix.as_deref(), Some("Jr."));
    }

    #[test]
    fn first_author_sig_uses_strict_form() {
        let tags = vec![tag("AU", "Smith, J."), tag("AU", "Doe, A.")];
        let (result, _) = normalize_authors(&tags, "ris");
        assert_eq!(result.first_sig.as_deref(), Some("smith|J"));
    }

    #[test]
    fn no_authors_returns_none() {
        let (result, prov) = normalize_authors(&[], "ris");
        assert_eq!(result.raw, None);
        assert!(prov.is_empty());
    }
}
