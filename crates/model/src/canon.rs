use serde::{Deserialize, Serialize};

/// A single parsed author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorParsed {
    pub family: Option<String>,
    pub given: Option<String>,
    pub initials: Option<String>,
    pub suffix: Option<String>,
    pub raw: String,
}

/// Canonical normalized fields. Every field is nullable: population is the
/// Normalizer's job and depends on what the source record actually carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Canon {
    pub doi: Option<String>,
    pub doi_norm: Option<String>,
    pub doi_url: Option<String>,
    pub pmid: Option<String>,
    pub pmid_norm: Option<String>,
    pub pmcid: Option<String>,
    pub title_raw: Option<String>,
    pub title_norm_basic: Option<String>,
    pub abstract_raw: Option<String>,
    pub abstract_norm_basic: Option<String>,
    pub authors_raw: Option<Vec<String>>,
    pub authors_parsed: Option<Vec<AuthorParsed>>,
    pub first_author_sig: Option<String>,
    pub author_sig_strict: Option<Vec<String>>,
    pub author_sig_loose: Option<Vec<String>>,
    pub year_raw: Option<String>,
    pub year_norm: Option<i32>,
    pub year_source: Option<String>,
    pub journal_full: Option<String>,
    pub journal_abbrev: Option<String>,
    pub journal_norm: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages_raw: Option<String>,
    pub pages_norm_long: Option<String>,
    pub page_first: Option<String>,
    pub page_last: Option<String>,
    pub article_number: Option<String>,
    pub language: Option<String>,
    pub publication_type: Option<Vec<String>>,
}

impl Canon {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Count of non-null values among the fields §4.7 uses for the
    /// merge-survivor metadata-completeness score.
    pub fn completeness_score(&self) -> u32 {
        [
            self.year_norm.is_some(),
            self.journal_norm.is_some(),
            self.volume.is_some(),
            self.issue.is_some(),
            self.pages_norm_long.is_some(),
            self.language.is_some(),
            self.publication_type.is_some(),
            self.article_number.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count() as u32
    }
}

/// Derived matching keys used for blocking and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keys {
    pub title_key_strict: Option<String>,
    pub title_year_key: Option<String>,
    pub title_first_author_key: Option<String>,
    pub title_journal_key: Option<String>,
    pub title_key_fuzzy: Option<String>,
    pub title_shingles: Option<Vec<String>>,
    pub title_minhash: Option<String>,
    pub title_simhash: Option<String>,
}

impl Keys {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Twelve booleans gating downstream behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub doi_present: bool,
    pub pmid_present: bool,
    pub title_missing: bool,
    pub title_truncated: bool,
    pub authors_missing: bool,
    pub authors_incomplete: bool,
    pub year_missing: bool,
    pub pages_unreliable: bool,
    pub is_erratum_notice: bool,
    pub is_retraction_notice: bool,
    pub is_corrected_republished: bool,
    pub has_linked_citation: bool,
}

impl Flags {
    /// State before normalization has run: everything required is reported
    /// missing, nothing is yet known to be wrong.
    pub fn pre_normalization() -> Self {
        Self {
            doi_present: false,
            pmid_present: false,
            title_missing: true,
            title_truncated: false,
            authors_missing: true,
            authors_incomplete: false,
            year_missing: true,
            pages_unreliable: false,
            is_erratum_notice: false,
            is_retraction_notice: false,
            is_corrected_republished: false,
            has_linked_citation: false,
        }
    }

    /// True if this record is erratum, retraction, correction, or carries a
    /// linked citation — the "special record" gate used by safety checks.
    pub fn is_special_record(&self) -> bool {
        self.is_erratum_notice
            || self.is_retraction_notice
            || self.is_corrected_republished
            || self.has_linked_citation
    }
}
