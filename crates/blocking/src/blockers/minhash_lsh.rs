use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;
use crate::hashing::{band_signature, minhash_signature, short_hash};

const MIN_TOKEN_COUNT: usize = 3;

/// Bands a MinHash signature over title shingles into locality-sensitive
/// buckets: records whose title shares any band's signature end up in the
/// same block. `n_perm` must be evenly divisible by `bands`.
pub struct MinHashLshTitleBlocker {
    pub n_perm: usize,
    pub bands: usize,
}

impl Default for MinHashLshTitleBlocker {
    fn default() -> Self {
        Self {
            n_perm: 128,
            bands: 16,
        }
    }
}

impl Blocker for MinHashLshTitleBlocker {
    fn name(&self) -> &str {
        "minhash_lsh_title"
    }

    fn match_key(&self) -> &str {
        "title_minhash"
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        let Some(tokens) = &record.keys.title_shingles else {
            return Vec::new();
        };
        if tokens.len() < MIN_TOKEN_COUNT {
            return Vec::new();
        }

        let signature = minhash_signature(tokens, self.n_perm);
        let bands = band_signature(&signature, self.bands);
        bands
            .iter()
            .enumerate()
            .map(|(band_idx, sig)| format!("mh:b{band_idx}:{}", short_hash(*sig)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    #[test]
    fn keys_on_long_enough_title() {
        let blocker = MinHashLshTitleBlocker::default();
        let record = record_with(|r| {
            r.keys.title_shingles = Some(vec![
                "study".into(),
                "of".into(),
                "bees".into(),
                "study of".into(),
            ])
        });
        let keys = blocker.block_keys(&record);
        assert_eq!(keys.len(), 16);
        assert!(keys.iter().all(|k| k.starts_with("mh:b")));
    }

    #[test]
    fn skips_short_titles() {
        let blocker = MinHashLshTitleBlocker::default();
        let record = record_with(|r| r.keys.title_shingles = Some(vec!["a".into(), "b".into()]));
        assert!(blocker.block_keys(&record).is_empty());
    }

    #[test]
    fn skips_missing_title() {
        let blocker = MinHashLshTitleBlocker::default();
        let record = record_with(|_| {});
        assert!(blocker.block_keys(&record).is_empty());
    }

    #[test]
    fn identical_titles_share_every_band() {
        let blocker = MinHashLshTitleBlocker::default();
        let shingles = vec!["study".into(), "of".into(), "bees".into(), "study of".into()];
        let a = record_with(|r| r.keys.title_shingles = Some(shingles.clone()));
        let b = record_with(|r| r.keys.title_shingles = Some(shingles));
        assert_eq!(blocker.block_keys(&a), blocker.block_keys(&b));
    }
}
