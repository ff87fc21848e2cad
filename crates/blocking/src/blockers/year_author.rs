use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;

/// Emits `"y"+year+":"+first_author_sig` for `year ∈ {year-1, year, year+1}`,
/// tolerating off-by-one publication-year discrepancies between sources.
pub struct YearPm1FirstAuthorBlocker;

impl Blocker for YearPm1FirstAuthorBlocker {
    fn name(&self) -> &str {
        "year_pm1_first_author"
    }

    fn match_key(&self) -> &str {
        "first_author_sig"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        let (Some(year), Some(sig)) = (record.canon.year_norm, &record.canon.first_author_sig)
        else {
            return Vec::new();
        };
        if sig.is_empty() {
            return Vec::new();
        }

        (-1..=1)
            .map(|offset| format!("y{}:{}", year + offset, sig))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn emits_three_offsets() {
        let blocker = YearPm1FirstAuthorBlocker;
        let record = record_with(|r| {
            r.canon.year_norm = Some(2020);
            r.canon.first_author_sig = Some("doe|J".to_string());
        });
        let keys = blocker.block_keys(&record);
        assert_eq!(keys, vec!["y2019:doe|J", "y2020:doe|J", "y2021:doe|J"]);
    }

    #[test]
    fn no_key_when_year_missing() {
        let blocker = YearPm1FirstAuthorBlocker;
        let record = record_with(|r| r.canon.first_author_sig = Some("doe|J".to_string()));
        assert!(blocker.block_keys(&record).is_empty());
    }

    #[test]
    fn no_key_when_author_missing() {
        let blocker = YearPm1FirstAuthorBlocker;
        let record = record_with(|r| r.canon.year_norm = Some(2020));
        assert!(blocker.block_keys(&record).is_empty());
    }
}
