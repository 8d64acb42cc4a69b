//! Benchmark workloads and utilities for the Keel foundation library.
//!
//! Provides deterministic key and size streams so that every benchmark run
//! (and every allocator under comparison) sees the same inputs:
//!
//! - [`random_keys`]: distinct `u64` keys from a seeded ChaCha8 stream
//! - [`random_words`]: lowercase byte strings for span-keyed tables
//! - [`block_sizes`]: arena request sizes with a realistic small-block skew

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashSet;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `n` distinct keys from `seed`.
pub fn random_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(n);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let key = rng.next_u64();
        if seen.insert(key) {
            keys.push(key);
        }
    }
    keys
}

/// Generate `n` lowercase words of 3 to 12 bytes from `seed`.
///
/// Words may repeat.
pub fn random_words(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let len = 3 + (rng.next_u32() % 10) as usize;
            (0..len).map(|_| b'a' + (rng.next_u32() % 26) as u8).collect()
        })
        .collect()
}

/// Generate `n` allocation sizes from `seed`.
///
/// Three in four requests are 1 to 64 bytes; the rest are 65 to 1024.
pub fn block_sizes(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let roll = rng.next_u32();
            if roll % 4 == 0 {
                65 + (roll >> 2) as usize % 960
            } else {
                1 + (roll >> 2) as usize % 64
            }
        })
        .collect()
}
