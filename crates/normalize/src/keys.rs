//! Matching-key derivation for blocking and scoring.

use srdedupe_model::Keys;

const MIN_SHINGLE_TOKEN_LEN: usize = 3;

pub fn generate_keys(
    title_norm_basic: Option<&str>,
    year_norm: Option<i32>,
    first_author_sig: Option<&str>,
    journal_norm: Option<&str>,
) -> Keys {
    let title_key_strict = title_norm_basic.map(str::to_string);

    let title_key_fuzzy = title_norm_basic.map(|t| {
        t.replace('-', " ").split_whitespace().collect::<Vec<_>>().join(" ")
    });

    let title_shingles = title_norm_basic.and_then(generate_shingles);

    let title_year_key = match (&title_key_strict, year_norm) {
        (Some(key), Some(year)) => Some(format!("{key}|{year}")),
        _ => None,
    };

    let title_first_author_key = match (&title_key_strict, first_author_sig) {
        (Some(key), Some(sig)) => Some(format!("{key}|{sig}")),
        _ => None,
    };

    let title_journal_key = match (&title_key_strict, journal_norm) {
        (Some(key), Some(journal)) => Some(format!("{key}|{journal}")),
        _ => None,
    };

    Keys {
        title_key_strict,
        title_year_key,
        title_first_author_key,
        title_journal_key,
        title_key_fuzzy,
        title_shingles,
        // Populated independently by the blocking stage, never here.
        title_minhash: None,
        title_simhash: None,
    }
}

/// Word unigrams (>= `MIN_SHINGLE_TOKEN_LEN` chars) plus bigrams, for
/// overlap estimation in LSH-based blocking.
fn generate_shingles(text: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_SHINGLE_TOKEN_LEN)
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let bigrams = tokens.windows(2).map(|w| format!("{} {}", w[0], w[1]));
    let shingles: Vec<String> = tokens.iter().map(|t| t.to_string()).chain(bigrams).collect();
    Some(shingles)
}
