use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;

const PREFIX_LEN: usize = 32;

/// Emits `"y"+year+":"+title_prefix` for `year ∈ {year-1, year, year+1}`,
/// where `title_prefix` is the first 32 characters of the strict title key.
pub struct YearPm1TitlePrefixBlocker;

impl Blocker for YearPm1TitlePrefixBlocker {
    fn name(&self) -> &str {
        "year_pm1_title_prefix"
    }

    fn match_key(&self) -> &str {
        "title_key_strict"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        let (Some(year), Some(title_key)) =
            (record.canon.year_norm, &record.keys.title_key_strict)
        else {
            return Vec::new();
        };
        if title_key.is_empty() {
            return Vec::new();
        }

        let prefix: String = title_key.chars().take(PREFIX_LEN).collect();
        (-1..=1).map(|offset| format!("y{}:{prefix}", year + offset)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn emits_three_offsets_with_prefix() {
        let blocker = YearPm1TitlePrefixBlocker;
        let record = record_with(|r| {
            r.canon.year_norm = Some(2020);
            r.keys.title_key_strict = Some("a study of bees and wasps in summer".to_string());
        });
        let keys = blocker.block_keys(&record);
        assert_eq!(keys.len(), 3);
        assert!(keys[1].ends_with(&"a study of bees and wasps in summer"[..PREFIX_LEN]));
    }

    #[test]
    fn no_key_when_title_missing() {
        let blocker = YearPm1TitlePrefixBlocker;
        let record = record_with(|r| r.canon.year_norm = Some(2020));
        assert!(blocker.block_keys(&record).is_empty());
    }
}
