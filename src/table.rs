//! Packed bit table backing the filter
//!
//! Bits are stored eight to a byte. Each byte is an `AtomicU8` so the table
//! can be read from many threads at once and, for the atomic insert path,
//! written through a shared reference. The serial insert path goes through
//! `&mut self` and touches the bytes without atomic operations.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{BloomError, Result};

/// Fixed-size, insert-only bit array
pub struct BitTable {
    bytes: Vec<AtomicU8>,
    bit_len: u64,
}

impl BitTable {
    /// Allocate a zeroed table of `num_bytes` bytes.
    ///
    /// Returns [`BloomError::AllocationFailure`] if the allocator refuses the
    /// reservation.
    pub fn new(num_bytes: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(num_bytes)
            .map_err(|_| BloomError::AllocationFailure { bytes: num_bytes })?;
        bytes.resize_with(num_bytes, || AtomicU8::new(0));

        Ok(BitTable {
            bytes,
            bit_len: num_bytes as u64 * 8,
        })
    }

    #[inline]
    fn locate(&self, index: u64) -> (usize, u8) {
        let bit = index % self.bit_len;
        ((bit / 8) as usize, 1u8 << (bit % 8))
    }

    /// Set the bit at `index mod bit_len`
    #[inline]
    pub fn set_bit(&mut self, index: u64) {
        let (byte, mask) = self.locate(index);
        *self.bytes[byte].get_mut() |= mask;
    }

    /// Set the bit at `index mod bit_len` with an atomic OR, so concurrent
    /// writers to the same byte never lose each other's bits.
    #[inline]
    pub fn set_bit_shared(&self, index: u64) {
        let (byte, mask) = self.locate(index);
        self.bytes[byte].fetch_or(mask, Ordering::Relaxed);
    }

    /// Whether the bit at `index mod bit_len` is set
    #[inline]
    pub fn test_bit(&self, index: u64) -> bool {
        let (byte, mask) = self.locate(index);
        self.bytes[byte].load(Ordering::Relaxed) & mask != 0
    }

    /// Number of addressable bits
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Size of the table in bytes
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Number of bits currently set
    pub fn count_ones(&self) -> u64 {
        self.bytes
            .iter()
            .map(|b| u64::from(b.load(Ordering::Relaxed).count_ones()))
            .sum()
    }

    /// Copy of the raw table bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }
}

impl std::fmt::Debug for BitTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BitTable")
            .field("bit_len", &self.bit_len)
            .field("bits_set", &self.count_ones())
            .finish()
    }
}
