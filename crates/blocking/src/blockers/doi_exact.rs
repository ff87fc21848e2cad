use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;

/// Keys on the normalized DOI when present. The strongest signal: two
/// records sharing a DOI are almost certainly the same work.
pub struct DoiExactBlocker;

impl Blocker for DoiExactBlocker {
    fn name(&self) -> &str {
        "doi_exact"
    }

    fn match_key(&self) -> &str {
        "doi_norm"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        match &record.canon.doi_norm {
            Some(doi) if !doi.is_empty() => vec![doi.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn keys_on_present_doi() {
        let blocker = DoiExactBlocker;
        let record = record_with(|r| r.canon.doi_norm = Some("10.1/abc".to_string()));
        assert_eq!(blocker.block_keys(&record), vec!["10.1/abc".to_string()]);
    }

    #[test]
    fn no_key_when_doi_missing() {
        let blocker = DoiExactBlocker;
        let record = record_with(|_| {});
        assert!(blocker.block_keys(&record).is_empty());
    }
}
