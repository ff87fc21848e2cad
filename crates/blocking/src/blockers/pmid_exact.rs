use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;

/// Keys on the normalized PMID when present.
pub struct PmidExactBlocker;

impl Blocker for PmidExactBlocker {
    fn name(&self) -> &str {
        "pmid_exact"
    }

    fn match_key(&self) -> &str {
        "pmid_norm"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        match &record.canon.pmid_norm {
            Some(pmid) if !pmid.is_empty() => vec![pmid.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn keys_on_present_pmid() {
        let blocker = PmidExactBlocker;
        let record = record_with(|r| r.canon.pmid_norm = Some("12345".to_string()));
        assert_eq!(blocker.block_keys(&record), vec!["12345".to_string()]);
    }

    #[test]
    fn no_key_when_pmid_missing() {
        let blocker = PmidExactBlocker;
        let record = record_with(|_| {});
        assert!(blocker.block_keys(&record).is_empty());
    }
}
