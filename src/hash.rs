//! Hash mixing for Bloom filter indices
//!
//! Every hash slot of a filter is the same Jenkins 96-bit mix applied with a
//! different key constant. The constants are drawn from a filter-local,
//! seeded generator so two filters with the same seed hash identically.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The Jenkins 96-bit mix function.
///
/// The low and high halves of `key` seed the `a` and `b` lanes, `input`
/// seeds `c`, and the final `c` lane is returned.
#[inline]
pub fn mix(key: u64, input: u32) -> u32 {
    let mut a = key as u32;
    let mut b = (key >> 32) as u32;
    let mut c = input;

    a = a.wrapping_sub(b.wrapping_add(c));
    a ^= c >> 13;
    b = b.wrapping_sub(c.wrapping_add(a));
    b ^= a << 8;
    c = c.wrapping_sub(a.wrapping_add(b));
    c ^= b >> 13;
    a = a.wrapping_sub(b.wrapping_add(c));
    a ^= c >> 12;
    b = b.wrapping_sub(c.wrapping_add(a));
    b ^= a << 16;
    c = c.wrapping_sub(a.wrapping_add(b));
    c ^= b >> 5;
    a = a.wrapping_sub(b.wrapping_add(c));
    a ^= c >> 3;
    b = b.wrapping_sub(c.wrapping_add(a));
    b ^= a << 10;
    c = c.wrapping_sub(a.wrapping_add(b));
    c ^= b >> 15;

    c
}

/// Per-slot key constants for [`mix`], one per hash function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashKeys {
    keys: Vec<u64>,
}

impl HashKeys {
    /// Derive `count` pairwise-distinct key constants from `seed`.
    ///
    /// Each call owns its generator, so concurrent construction of filters
    /// never shares random state. A draw that repeats an earlier key is
    /// skipped, since two equal keys would collapse into one hash slot.
    pub fn generate(seed: u64, count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen = HashSet::with_capacity(count);
        let mut keys = Vec::with_capacity(count);
        while keys.len() < count {
            let key = u64::from(rng.gen::<u32>());
            if seen.insert(key) {
                keys.push(key);
            }
        }
        HashKeys { keys }
    }

    /// Iterate over the bit indices of `value`, one per hash slot
    #[inline]
    pub fn indices(&self, value: u32, bit_len: u64) -> impl Iterator<Item = u32> + '_ {
        self.keys
            .iter()
            .map(move |&key| (u64::from(mix(key, value)) % bit_len) as u32)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.keys
    }
}
