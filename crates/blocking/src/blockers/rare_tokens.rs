use std::collections::{HashMap, HashSet};

use srdedupe_model::CanonicalRecord;

use crate::blocker::Blocker;

const DEFAULT_K: usize = 3;
const DEFAULT_DF_MAX_RATIO: f64 = 0.01;

fn title_unigrams(record: &CanonicalRecord) -> HashSet<&str> {
    record
        .keys
        .title_shingles
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter(|t| !t.contains(' '))
        .map(String::as_str)
        .collect()
}

/// Stateful: `initialize` must run once over the full corpus before any
/// `block_keys` call, building a per-token document-frequency table. Keys
/// on the `k` rarest title tokens a record has, restricted to tokens that
/// appear in at most `df_max_ratio` of the corpus — common words never
/// become block keys, however many documents share them.
pub struct RareTitleTokenBlocker {
    pub k: usize,
    pub df_max_ratio: f64,
    doc_freq: HashMap<String, u64>,
    total_docs: u64,
}

impl Default for RareTitleTokenBlocker {
    fn default() -> Self {
        Self::new(DEFAULT_K, DEFAULT_DF_MAX_RATIO)
    }
}

impl RareTitleTokenBlocker {
    pub fn new(k: usize, df_max_ratio: f64) -> Self {
        Self {
            k,
            df_max_ratio,
            doc_freq: HashMap::new(),
            total_docs: 0,
        }
    }
}

impl Blocker for RareTitleTokenBlocker {
    fn name(&self) -> &str {
        "rare_title_tokens"
    }

    fn match_key(&self) -> &str {
        "title_shingles"
    }

    fn initialize(&mut self, records: &[CanonicalRecord]) {
        self.doc_freq.clear();
        self.total_docs = records.len() as u64;
        for record in records {
            for token in title_unigrams(record) {
                *self.doc_freq.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }

    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String> {
        if self.total_docs == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<(u64, &str)> = title_unigrams(record)
            .into_iter()
            .filter_map(|token| {
                let df = *self.doc_freq.get(token)?;
                let ratio = df as f64 / self.total_docs as f64;
                (ratio <= self.df_max_ratio).then_some((df, token))
            })
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        candidates
            .into_iter()
            .take(self.k)
            .map(|(_, token)| format!("rare:{token}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;

    fn corpus() -> Vec<CanonicalRecord> {
        vec![
            record_with(|r| {
                r.keys.title_shingles =
                    Some(vec!["common".into(), "rareword".into(), "common rareword".into()])
            }),
            record_with(|r| r.keys.title_shingles = Some(vec!["common".into()])),
            record_with(|r| r.keys.title_shingles = Some(vec!["common".into()])),
        ]
    }

    #[test]
    fn keys_only_on_rare_tokens_after_initialize() {
        let mut blocker = RareTitleTokenBlocker::new(DEFAULT_K, 0.5);
        let records = corpus();
        blocker.initialize(&records);

        let keys = blocker.block_keys(&records[0]);
        assert_eq!(keys, vec!["rare:rareword"]);
    }

    #[test]
    fn no_keys_before_initialize() {
        let blocker = RareTitleTokenBlocker::default();
        let records = corpus();
        assert!(blocker.block_keys(&records[0]).is_empty());
    }

    #[test]
    fn caps_at_k_rarest() {
        let mut blocker = RareTitleTokenBlocker::new(1, 1.0);
        let records = vec![record_with(|r| {
            r.keys.title_shingles = Some(vec!["alpha".into(), "beta".into(), "gamma".into()])
        })];
        blocker.initialize(&records);
        assert_eq!(blocker.block_keys(&records[0]).len(), 1);
    }
}
