use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;
use crate::hashing::{short_hash, simhash_fingerprint, split_chunks};

const MIN_TOKEN_COUNT: usize = 3;
const N_CHUNKS: u32 = 4;

/// Splits a 64-bit SimHash fingerprint of the title tokens into 4 chunks,
/// one key per chunk. Two titles differing in only a few bits still share
/// at least one chunk most of the time.
pub struct SimHashTitleBlocker;

impl Blocker for SimHashTitleBlocker {
    fn name(&self) -> &str {
        "simhash_title"
    }

    fn match_key(&self) -> &str {
        "title_simhash"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        let Some(tokens) = &record.keys.title_shingles else {
            return Vec::new();
        };
        if tokens.len() < MIN_TOKEN_COUNT {
            return Vec::new();
        }

        let fingerprint = simhash_fingerprint(tokens);
        split_chunks(fingerprint, N_CHUNKS)
            .iter()
            .enumerate()
            .map(|(chunk_idx, chunk)| format!("sh:c{chunk_idx}:{}", short_hash(*chunk)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn keys_on_long_enough_title() {
        let blocker = SimHashTitleBlocker;
        let record = record_with(|r| {
            r.keys.title_shingles = Some(vec!["study".into(), "of".into(), "bees".into()])
        });
        let keys = blocker.block_keys(&record);
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| k.starts_with("sh:c")));
    }

    #[test]
    fn skips_short_titles() {
        let blocker = SimHashTitleBlocker;
        let record = record_with(|r| r.keys.title_shingles = Some(vec!["a".into()]));
        assert!(blocker.block_keys(&record).is_empty());
    }

    #[test]
    fn skips_missing_title() {
        let blocker = SimHashTitleBlocker;
        let record = record_with(|_| {});
        assert!(blocker.block_keys(&record).is_empty());
    }
}
