//! Construction parameters for a [`ConcurrentBloomFilter`](crate::ConcurrentBloomFilter)

use crate::{BloomError, Result};

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_NUM_HASHES: usize = 20;
/// 128 MiB
pub const DEFAULT_TABLE_SIZE_BYTES: u32 = 128 * 1024 * 1024;

/// Immutable filter parameters: hash seed, hash count and table size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub seed: u64,
    pub num_hashes: usize,
    pub table_size_bytes: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            seed: DEFAULT_SEED,
            num_hashes: DEFAULT_NUM_HASHES,
            table_size_bytes: DEFAULT_TABLE_SIZE_BYTES,
        }
    }
}

impl FilterConfig {
    pub fn new(seed: u64, num_hashes: usize, table_size_bytes: u32) -> Self {
        FilterConfig {
            seed,
            num_hashes,
            table_size_bytes,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    pub fn with_table_size_bytes(mut self, table_size_bytes: u32) -> Self {
        self.table_size_bytes = table_size_bytes;
        self
    }

    /// Number of addressable bits in the table
    pub fn table_bit_size(&self) -> u64 {
        u64::from(self.table_size_bytes) * 8
    }

    /// Reject parameters that would leave the filter without hash slots or
    /// without any bits to address.
    pub fn validate(&self) -> Result<()> {
        if self.num_hashes == 0 {
            return Err(BloomError::InvalidConfiguration(
                "Number of hashes must be > 0".to_string(),
            ));
        }
        if self.table_size_bytes == 0 {
            return Err(BloomError::InvalidConfiguration(
                "Table size must be > 0 bytes".to_string(),
            ));
        }
        Ok(())
    }
}
