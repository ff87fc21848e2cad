//! Pluggable blockers and inverted-index candidate pair generation.
//!
//! A blocker ([`Blocker`]) maps a [`srdedupe_model::CanonicalRecord`] to
//! zero or more block keys; records sharing a key become candidate pairs.
//! [`generate_candidates`] runs a set of blockers over a record stream and
//! emits a single, deduplicated, deterministically-ordered JSON-Lines
//! stream of [`CandidatePair`]s.
//!
//! Blocker families ([`blockers`]): exact-ID (DOI, PMID), MinHash LSH and
//! SimHash over title tokens, year±1 composite keys, and a stateful
//! rare-title-token blocker that needs a corpus-wide pass before it can
//! key anything. [`factory`] builds blocker instances from declarative
//! [`BlockerConfig`]s.

mod blocker;
pub mod blockers;
mod error;
mod factory;
mod generator;
mod hashing;
mod models;
mod stats;
#[cfg(test)]
mod test_support;

pub use blocker::Blocker;
pub use error::BlockingError;
pub use factory::{create_blocker, create_blockers, BlockerConfig};
pub use generator::{generate_candidates, DEFAULT_MAX_BLOCK_SIZE};
pub use hashing::{
    band_signature, hash_tokens, minhash_signature, short_hash, simhash_fingerprint, split_chunks,
};
pub use models::{CandidatePair, CandidateSource};
pub use stats::{BlockerStats, GenerationStats, GlobalStats};
