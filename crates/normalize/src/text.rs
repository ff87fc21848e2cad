//! Locale-independent text normalization helpers.

use unicode_normalization::UnicodeNormalization;

/// Removes combining marks (Unicode category `Mn`) after an NFD
/// decomposition, then recomposes to NFC. Used to strip accents for
/// cross-locale matching (e.g. author family names, journal titles).
pub fn strip_accents(text: &str) -> String {
    let decomposed: String = text.nfd().collect();
    let stripped: String = decomposed
        .chars()
        .filter(|c| !unicode_categories::UnicodeCategories::is_mark_nonspacing(c))
        .collect();
    stripped.nfc().collect()
}

/// Collapses runs of whitespace to single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cosmetic punctuation stripped by full text normalization: `. , : ; ! ? ' " ( ) [ ] { }`.
const COSMETIC_PUNCT: &[char] = &[
    '.', ',', ':', ';', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}',
];

/// Full normalization used for titles and journal names: NFKC, casefold,
/// accent stripping, cosmetic punctuation removed, whitespace collapsed.
pub fn normalize_text_for_matching(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let nfkc: String = text.nfkc().collect();
    let folded = nfkc.to_lowercase();
    let unaccented = strip_accents(&folded);
    let no_punct: String = unaccented
        .chars()
        .map(|c| if COSMETIC_PUNCT.contains(&c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&no_punct)
}

/// Light normalization used for abstracts: NFKC, casefold, whitespace
/// collapse only — preserves punctuation and diacritics.
pub fn normalize_text_light(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let nfkc: String = text.nfkc().collect();
    collapse_whitespace(&nfkc.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents() {
        assert_eq!(strip_accents("Müller"), "Muller");
        assert_eq!(strip_accents("café"), "cafe");
    }

    #[test]
    fn matching_normalization_folds_and_strips_punctuation() {
        let got = normalize_text_for_matching("The Müller Study: A (Re)Analysis!");
        assert_eq!(got, "the muller study a reanalysis");
    }

    #[test]
    fn light_normalization_keeps_punctuation() {
        let got = normalize_text_light("Results: p < 0.05.");
        assert_eq!(got, "results: p < 0.05.");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize_text_for_matching(""), "");
        assert_eq!(normalize_text_light(""), "");
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(collapse_whitespace("  a   b\tc\n"), "a b c");
    }
}
