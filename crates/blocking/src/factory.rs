//! Registry-based factory for blocker instantiation. New blocker types are
//! added by extending [`create_blocker`]'s match arm — no cascading
//! `if`/`else` chain to maintain as the family grows.
use serde::{Deserialize, Serialize};

use crate::blocker::Blocker;
use crate::blockers::{
    DoiExactBlocker, MinHashLshTitleBlocker, PmidExactBlocker, RareTitleTokenBlocker,
    SimHashTitleBlocker, YearPm1FirstAuthorBlocker, YearPm1TitlePrefixBlocker,
};
use crate::error::BlockingError;

const VALID_TYPES: &[&str] = &[
    "doi",
    "pmid",
    "minhash",
    "simhash",
    "year_author",
    "year_title",
    "rare_tokens",
];

/// Declarative configuration for a single blocker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockerConfig {
    #[serde(rename = "type")]
    pub blocker_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub n_perm: Option<usize>,
    #[serde(default)]
    pub bands: Option<usize>,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub df_max_ratio: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

/// Instantiates a single blocker from `config`. Numeric overrides that
/// don't apply to the chosen type are silently ignored, matching the
/// declarative "params are forwarded as kwargs" shape this mirrors.
pub fn create_blocker(config: &BlockerConfig) -> Result<Box<dyn Blocker>, BlockingError> {
    let blocker: Box<dyn Blocker> = match config.blocker_type.as_str() {
        "doi" => Box::new(DoiExactBlocker),
        "pmid" => Box::new(PmidExactBlocker),
        "minhash" => Box::new(MinHashLshTitleBlocker {
            n_perm: config.n_perm.unwrap_or(128),
            bands: config.bands.unwrap_or(16),
        }),
        "simhash" => Box::new(SimHashTitleBlocker),
        "year_author" => Box::new(YearPm1FirstAuthorBlocker),
        "year_title" => Box::new(YearPm1TitlePrefixBlocker),
        "rare_tokens" => Box::new(RareTitleTokenBlocker::new(
            config.k.unwrap_or(3),
            config.df_max_ratio.unwrap_or(0.01),
        )),
        other => {
            return Err(BlockingError::UnknownBlockerType(
                other.to_string(),
                VALID_TYPES.join(", "),
            ))
        }
    };
    Ok(blocker)
}

/// Instantiates every *enabled* blocker from `configs`, preserving order.
pub fn create_blockers(configs: &[BlockerConfig]) -> Result<Vec<Box<dyn Blocker>>, BlockingError> {
    configs.iter().filter(|c| c.enabled).map(create_blocker).collect()
}
