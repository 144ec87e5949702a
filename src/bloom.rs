//! Batched Bloom filter implementation
//!
//! A space-efficient probabilistic data structure for membership testing,
//! built for workloads that insert or query many 32-bit keys at once.
//! Hashing is spread over a [`WorkerPool`]; bit writes are either
//! consolidated on the calling thread ([`ConcurrentBloomFilter::insert`]) or
//! applied with atomic byte ORs ([`ConcurrentBloomFilter::insert_atomic`]).

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::config::FilterConfig;
use crate::hash::HashKeys;
use crate::pool::WorkerPool;
use crate::table::BitTable;
use crate::{BloomError, Result};

/// A Bloom filter over `u32` keys with parallel batch operations
pub struct ConcurrentBloomFilter {
    config: FilterConfig,
    /// Key constants for the mixer, one per hash function
    hash_keys: HashKeys,
    /// Bit array storing the filter data
    table: BitTable,
    /// Number of keys passed to insert (for statistics)
    inserted: AtomicU64,
}

impl ConcurrentBloomFilter {
    /// Create a filter with the default configuration: seed 0, 20 hashes and
    /// a 128 MiB table.
    pub fn new() -> Result<Self> {
        Self::with_config(FilterConfig::default())
    }

    /// Create a filter with explicit parameters
    pub fn with_params(seed: u64, num_hashes: usize, table_size_bytes: u32) -> Result<Self> {
        Self::with_config(FilterConfig::new(seed, num_hashes, table_size_bytes))
    }

    /// Create a filter from a [`FilterConfig`]
    ///
    /// # Errors
    /// * [`BloomError::InvalidConfiguration`] if the hash count or table size is zero
    /// * [`BloomError::AllocationFailure`] if the table cannot be allocated
    pub fn with_config(config: FilterConfig) -> Result<Self> {
        config.validate()?;

        let num_bytes = usize::try_from(config.table_size_bytes).map_err(|_| {
            BloomError::AllocationFailure {
                bytes: config.table_size_bytes as usize,
            }
        })?;
        let table = BitTable::new(num_bytes)?;
        let hash_keys = HashKeys::generate(config.seed, config.num_hashes);

        debug!(
            seed = config.seed,
            num_hashes = config.num_hashes,
            table_bytes = num_bytes,
            "constructed bloom filter"
        );

        Ok(ConcurrentBloomFilter {
            config,
            hash_keys,
            table,
            inserted: AtomicU64::new(0),
        })
    }

    /// Insert a batch of keys.
    ///
    /// Bit indices for every `(key, hash)` pair are computed in parallel into
    /// a scratch buffer, then set on the calling thread once all workers have
    /// joined. Several indices may land in the same byte, so the writes are
    /// kept on one thread.
    ///
    /// # Panics
    /// If `batch.len() * num_hashes` overflows `usize`; the scratch buffer
    /// holds one `u32` per `(key, hash)` pair.
    pub fn insert(&mut self, batch: &[u32], pool: &WorkerPool) {
        if batch.is_empty() {
            return;
        }
        let _span = debug_span!("insert", batch = batch.len(), workers = pool.num_workers())
            .entered();

        let num_hashes = self.hash_keys.len();
        let bit_len = self.table.bit_len();
        let hash_keys = &self.hash_keys;

        // Slot i * num_hashes + j holds hash j of batch[i].
        let mut scratch = vec![0u32; scratch_len(batch.len(), num_hashes)];
        pool.install(|| {
            scratch
                .par_chunks_mut(num_hashes)
                .zip(batch.par_iter())
                .for_each(|(slots, &value)| {
                    for (slot, index) in slots.iter_mut().zip(hash_keys.indices(value, bit_len)) {
                        *slot = index;
                    }
                });
        });

        for &index in &scratch {
            self.table.set_bit(u64::from(index));
        }
        *self.inserted.get_mut() += batch.len() as u64;
    }

    /// Insert a batch of keys with hashing and bit-setting both in parallel.
    ///
    /// Each bit is set with an atomic byte OR, so this takes `&self` and may
    /// run alongside queries. The resulting table is identical to what
    /// [`insert`](Self::insert) produces for the same keys.
    pub fn insert_atomic(&self, batch: &[u32], pool: &WorkerPool) {
        if batch.is_empty() {
            return;
        }
        let _span = debug_span!(
            "insert_atomic",
            batch = batch.len(),
            workers = pool.num_workers()
        )
        .entered();

        let bit_len = self.table.bit_len();
        let hash_keys = &self.hash_keys;
        let table = &self.table;

        pool.install(|| {
            batch.par_iter().for_each(|&value| {
                for index in hash_keys.indices(value, bit_len) {
                    table.set_bit_shared(u64::from(index));
                }
            });
        });

        self.inserted
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
    }

    /// Query a batch of keys.
    ///
    /// Position `i` of the result is `false` if `batch[i]` was definitely
    /// never inserted and `true` if it might have been.
    pub fn contains(&self, batch: &[u32], pool: &WorkerPool) -> Vec<bool> {
        let mut found = vec![false; batch.len()];
        self.contains_into(batch, &mut found, pool);
        found
    }

    /// Query a batch of keys, writing the answers into `found`.
    ///
    /// # Panics
    /// If `found` and `batch` have different lengths.
    pub fn contains_into(&self, batch: &[u32], found: &mut [bool], pool: &WorkerPool) {
        assert_eq!(
            batch.len(),
            found.len(),
            "result buffer length must match batch length"
        );
        if batch.is_empty() {
            return;
        }
        let _span = debug_span!("contains", batch = batch.len(), workers = pool.num_workers())
            .entered();

        pool.install(|| {
            found
                .par_iter_mut()
                .zip(batch.par_iter())
                .for_each(|(slot, &value)| *slot = self.probe(value));
        });
    }

    /// Query a single key on the calling thread
    pub fn contains_key(&self, key: u32) -> bool {
        self.probe(key)
    }

    #[inline]
    fn probe(&self, value: u32) -> bool {
        let bit_len = self.table.bit_len();
        self.hash_keys
            .indices(value, bit_len)
            .all(|index| self.table.test_bit(u64::from(index)))
    }

    /// Get the current fill ratio (fraction of bits set)
    pub fn fill_ratio(&self) -> f64 {
        self.table.count_ones() as f64 / self.table.bit_len() as f64
    }

    /// Get the estimated false positive rate from the current fill ratio
    pub fn estimated_fpr(&self) -> f64 {
        self.fill_ratio().powi(self.hash_keys.len() as i32)
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> BloomStats {
        let bits_set = self.table.count_ones();
        let table_bits = self.table.bit_len();
        let fill_ratio = bits_set as f64 / table_bits as f64;

        BloomStats {
            table_bits,
            num_hash_functions: self.hash_keys.len(),
            keys_inserted: self.len(),
            bits_set,
            fill_ratio,
            estimated_fpr: fill_ratio.powi(self.hash_keys.len() as i32),
        }
    }

    /// Number of keys passed to insert so far, duplicates included
    pub fn len(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Check if nothing has been inserted yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn hash_keys(&self) -> &HashKeys {
        &self.hash_keys
    }

    /// Snapshot of the raw bit table
    pub fn as_bytes(&self) -> Vec<u8> {
        self.table.to_bytes()
    }
}

/// Number of scratch slots needed to hash `batch_len` keys `num_hashes` times
fn scratch_len(batch_len: usize, num_hashes: usize) -> usize {
    batch_len.checked_mul(num_hashes).unwrap_or_else(|| {
        panic!(
            "scratch buffer for {} keys x {} hashes overflows usize",
            batch_len, num_hashes
        )
    })
}

impl std::fmt::Debug for ConcurrentBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ConcurrentBloomFilter")
            .field("config", &self.config)
            .field("keys_inserted", &self.len())
            .finish()
    }
}

/// Statistics about a Bloom filter
#[derive(Debug, Clone)]
pub struct BloomStats {
    pub table_bits: u64,
    pub num_hash_functions: usize,
    pub keys_inserted: u64,
    pub bits_set: u64,
    pub fill_ratio: f64,
    pub estimated_fpr: f64,
}

impl std::fmt::Display for BloomStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ConcurrentBloomFilter Stats:\n\
             - Table: {} bits\n\
             - Hash functions: {}\n\
             - Keys inserted: {}\n\
             - Bits set: {}\n\
             - Fill ratio: {:.6}\n\
             - Estimated FPR: {:.6}",
            self.table_bits,
            self.num_hash_functions,
            self.keys_inserted,
            self.bits_set,
            self.fill_ratio,
            self.estimated_fpr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_filter() -> ConcurrentBloomFilter {
        ConcurrentBloomFilter::with_params(0, 7, 64 * 1024).unwrap()
    }

    fn random_keys(seed: u64, n: usize) -> Vec<u32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_empty_filter_contains_nothing() {
        let filter = small_filter();
        let pool = WorkerPool::new(2).unwrap();
        let keys = random_keys(1, 1000);

        assert!(filter.is_empty());
        assert!(filter.contains(&keys, &pool).iter().all(|&found| !found));
        assert_eq!(filter.fill_ratio(), 0.0);
    }

    #[test]
    fn test_no_false_negatives() {
        let mut filter = small_filter();
        let keys = random_keys(2, 5000);

        filter.insert(&keys, &WorkerPool::new(3).unwrap());

        for workers in [1, 2, 4] {
            let pool = WorkerPool::new(workers).unwrap();
            assert!(filter.contains(&keys, &pool).iter().all(|&found| found));
        }
        assert!(keys.iter().all(|&k| filter.contains_key(k)));
    }

    #[test]
    fn test_results_are_position_aligned() {
        let mut filter = small_filter();
        let pool = WorkerPool::new(4).unwrap();
        filter.insert(&[10, 30], &pool);

        let found = filter.contains(&[10, 20, 30], &pool);
        assert_eq!(found.len(), 3);
        assert!(found[0]);
        assert!(found[2]);
        assert_eq!(found[1], filter.contains_key(20));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut filter = small_filter();
        let pool = WorkerPool::single().unwrap();

        filter.insert(&[], &pool);
        filter.insert_atomic(&[], &pool);
        assert!(filter.contains(&[], &pool).is_empty());
        assert!(filter.is_empty());
        assert_eq!(filter.stats().bits_set, 0);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut filter = small_filter();
        let pool = WorkerPool::new(2).unwrap();
        let keys = random_keys(3, 2000);

        filter.insert(&keys, &pool);
        let once = filter.as_bytes();
        filter.insert(&keys, &pool);

        assert_eq!(filter.as_bytes(), once);
        assert_eq!(filter.len(), 4000);
    }

    #[test]
    fn test_worker_count_does_not_change_table() {
        let keys = random_keys(4, 10_000);
        let mut serial = small_filter();
        let mut parallel = small_filter();

        serial.insert(&keys, &WorkerPool::single().unwrap());
        parallel.insert(&keys, &WorkerPool::new(4).unwrap());

        assert_eq!(serial.as_bytes(), parallel.as_bytes());
    }

    #[test]
    fn test_atomic_insert_matches_serial_consolidation() {
        let keys = random_keys(5, 10_000);
        let pool = WorkerPool::new(4).unwrap();

        let mut consolidated = small_filter();
        consolidated.insert(&keys, &pool);

        let atomic = small_filter();
        atomic.insert_atomic(&keys, &pool);

        assert_eq!(consolidated.as_bytes(), atomic.as_bytes());
        assert_eq!(atomic.len(), keys.len() as u64);
    }

    #[test]
    fn test_contains_into_fills_buffer() {
        let mut filter = small_filter();
        let pool = WorkerPool::new(2).unwrap();
        let keys = random_keys(6, 100);
        filter.insert(&keys, &pool);

        let mut found = vec![false; keys.len()];
        filter.contains_into(&keys, &mut found, &pool);
        assert!(found.iter().all(|&f| f));
    }

    #[test]
    #[should_panic(expected = "result buffer length")]
    fn test_contains_into_length_mismatch() {
        let filter = small_filter();
        let pool = WorkerPool::single().unwrap();
        let mut found = vec![false; 2];
        filter.contains_into(&[1, 2, 3], &mut found, &pool);
    }

    #[test]
    fn test_scratch_len() {
        assert_eq!(scratch_len(1000, 20), 20_000);
        assert_eq!(scratch_len(0, usize::MAX), 0);
    }

    #[test]
    #[should_panic(expected = "overflows usize")]
    fn test_scratch_len_overflow() {
        scratch_len(usize::MAX / 2, 3);
    }

    #[test]
    fn test_same_seed_same_hash_keys() {
        let a = ConcurrentBloomFilter::with_params(42, 9, 128).unwrap();
        let b = ConcurrentBloomFilter::with_params(42, 9, 4096).unwrap();
        assert_eq!(a.hash_keys(), b.hash_keys());
        assert_eq!(a.hash_keys().len(), 9);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(matches!(
            ConcurrentBloomFilter::with_params(0, 0, 1024),
            Err(BloomError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ConcurrentBloomFilter::with_params(0, 20, 0),
            Err(BloomError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_tiny_table_saturates_without_panicking() {
        let mut filter = ConcurrentBloomFilter::with_params(1, 20, 1).unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let keys = random_keys(7, 500);

        filter.insert(&keys, &pool);
        assert!(filter.contains(&keys, &pool).iter().all(|&f| f));
        assert!(filter.fill_ratio() > 0.9);
    }

    #[test]
    fn test_bloom_filter_stats() {
        let mut filter = small_filter();
        let pool = WorkerPool::new(2).unwrap();
        filter.insert(&random_keys(8, 100), &pool);

        let stats = filter.stats();
        assert_eq!(stats.num_hash_functions, 7);
        assert_eq!(stats.keys_inserted, 100);
        assert_eq!(stats.table_bits, 64 * 1024 * 8);
        assert!(stats.bits_set > 0 && stats.bits_set <= 700);
        assert!(stats.fill_ratio > 0.0);
        assert!(stats.estimated_fpr > 0.0);
        assert!(stats.to_string().contains("Hash functions: 7"));
    }
}
