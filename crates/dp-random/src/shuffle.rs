//! Local unbiased shuffle
//!
//! Fisher–Yates over a 32-bit generator. Each step needs a uniform index in
//! `[0, limit)`; raw draws at or above the largest multiple of `limit` that
//! fits in 2^32 are discarded so `value % limit` carries no modulo bias.

use rand::{Rng, RngCore};

const RANGE_32: u64 = 1 << 32;

/// Largest multiple of `limit` not exceeding 2^32. Draws at or above it are rejected.
#[inline]
pub fn rejection_threshold(limit: u32) -> u64 {
    RANGE_32 - RANGE_32 % limit as u64
}

/// Uniform index in `[0, limit)` by rejection sampling over `next_u32`.
///
/// `limit` must be non-zero.
pub fn uniform_index<R: RngCore + ?Sized>(rng: &mut R, limit: u32) -> u32 {
    debug_assert!(limit > 0, "uniform_index needs a non-empty range");
    let max_valid = rejection_threshold(limit);
    loop {
        let value = rng.next_u32();
        if (value as u64) < max_valid {
            return value % limit;
        }
    }
}

/// In-place Fisher–Yates shuffle driven by `rng`
pub fn shuffle_in_place<T, R: RngCore>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = match u32::try_from(i + 1) {
            Ok(limit) => uniform_index(rng, limit) as usize,
            // Past the 32-bit range; rand's own range sampling is unbiased too
            Err(_) => rng.random_range(0..=i),
        };
        items.swap(i, j);
    }
}

/// Shuffled copy of `items` from the thread-local CSPRNG. Never fails.
pub fn local_shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffle_in_place(&mut shuffled, &mut rand::rng());
    shuffled
}
