//! Deterministic hashing primitives shared by the lexical blockers.
//!
//! The MinHash signature construction mirrors the simulated-permutation
//! approach used elsewhere in this codebase's perceptual-hashing corpus:
//! instead of materialising `n_perm` permutations, each signature slot
//! keys a mixing function derived from the slot index and a fixed seed.

use xxhash_rust::xxh3::xxh3_64_with_seed;

const SEED: u64 = 0xF00D_BAAD_F00D_BAAD;

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[inline]
fn mix_u64(x: u64, key: u64) -> u64 {
    let mut h = xxh3_64_with_seed(&x.to_le_bytes(), key);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
    h ^ (h >> 33)
}

#[inline]
fn compute_slot(token_hashes: &[u64], slot: usize, seed: u64) -> u64 {
    let step = (slot as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let key = splitmix64(seed.wrapping_add(step));
    let mut minv = u64::MAX;
    for &h in token_hashes {
        let mixed = mix_u64(h, key);
        if mixed < minv {
            minv = mixed;
        }
    }
    minv
}

/// Hashes each token to a 64-bit value deterministically.
pub fn hash_tokens(tokens: &[String]) -> Vec<u64> {
    tokens
        .iter()
        .map(|t| xxh3_64_with_seed(t.as_bytes(), SEED))
        .collect()
}

/// Computes an `n_perm`-length MinHash signature over a token set.
/// Empty token sets produce an empty signature (callers should skip
/// keying on an empty signature rather than emit a degenerate key).
pub fn minhash_signature(tokens: &[String], n_perm: usize) -> Vec<u64> {
    if tokens.is_empty() || n_perm == 0 {
        return Vec::new();
    }
    let hashes = hash_tokens(tokens);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n_perm)
            .into_par_iter()
            .map(|slot| compute_slot(&hashes, slot, SEED))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n_perm).map(|slot| compute_slot(&hashes, slot, SEED)).collect()
    }
}

/// Splits a MinHash signature into `bands` bands (`signature.len() / bands`
/// rows each, remainder rows dropped) and returns one short hash per band.
pub fn band_signature(signature: &[u64], bands: usize) -> Vec<u64> {
    if bands == 0 || signature.is_empty() {
        return Vec::new();
    }
    let rows_per_band = signature.len() / bands;
    if rows_per_band == 0 {
        return Vec::new();
    }
    signature
        .chunks(rows_per_band)
        .take(bands)
        .map(|chunk| {
            let mut key = SEED;
            for &v in chunk {
                key = mix_u64(v, key);
            }
            key
        })
        .collect()
}

/// 64-bit SimHash fingerprint over a token multiset: each token's hash
/// contributes +1/-1 votes per bit depending on whether that bit is set,
/// and the final fingerprint bit is set wherever the vote sum is positive.
pub fn simhash_fingerprint(tokens: &[String]) -> u64 {
    let mut votes = [0i64; 64];
    for token in tokens {
        let h = xxh3_64_with_seed(token.as_bytes(), SEED);
        for (bit, vote) in votes.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *vote += 1;
            } else {
                *vote -= 1;
            }
        }
    }
    let mut fingerprint = 0u64;
    for (bit, vote) in votes.iter().enumerate() {
        if *vote > 0 {
            fingerprint |= 1 << bit;
        }
    }
    fingerprint
}

/// Splits a 64-bit fingerprint into `n` equal-width chunks (low bits first).
pub fn split_chunks(fingerprint: u64, n: u32) -> Vec<u64> {
    let width = 64 / n;
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    (0..n).map(|i| (fingerprint >> (i * width)) & mask).collect()
}

/// Short, stable hex digest used inside block keys so they stay compact.
pub fn short_hash(value: u64) -> String {
    format!("{value:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minhash_is_deterministic() {
        let tokens = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let a = minhash_signature(&tokens, 16);
        let b = minhash_signature(&tokens, 16);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn empty_tokens_yield_empty_signature() {
        assert!(minhash_signature(&[], 16).is_empty());
    }

    #[test]
    fn band_signature_splits_evenly() {
        let tokens = vec!["a".to_string(), "b".to_string()];
        let sig = minhash_signature(&tokens, 16);
        let bands = band_signature(&sig, 4);
        assert_eq!(bands.len(), 4);
    }

    #[test]
    fn simhash_is_deterministic_and_order_independent_votes() {
        let tokens = vec!["study".to_string(), "of".to_string(), "bees".to_string()];
        let a = simhash_fingerprint(&tokens);
        let b = simhash_fingerprint(&tokens);
        assert_eq!(a, b);
    }

    #[test]
    fn split_chunks_covers_all_bits() {
        let chunks = split_chunks(u64::MAX, 4);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|&c| c == 0xFFFF_FFFF_FFFF_FFFFu64 >> (64 - 16)));
    }
}
