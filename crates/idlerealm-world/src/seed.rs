//! Seed derivation for deterministic generation.
//!
//! World seeds are strings (the daily seed is `daily-YYYY-MM-DD`). They are
//! hashed with 64-bit FNV-1a into the seed of a [`StdRng`], so the same
//! string yields the same random stream on every machine running the same
//! build.

use rand::SeedableRng;
use rand::rngs::StdRng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Hash a seed string to a 64-bit integer with FNV-1a.
pub fn seed_from_str(seed: &str) -> u64 {
    seed.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Build the random stream for a seed string.
pub fn rng_for(seed: &str) -> StdRng {
    StdRng::seed_from_u64(seed_from_str(seed))
}
