//! # Concurrent Bloom
//!
//! A Bloom filter over 32-bit keys built for batches. Inserts hash every key
//! of a batch in parallel and then set the bits on the calling thread;
//! queries run fully in parallel. Parallelism is scoped to the
//! [`WorkerPool`] passed to each call.

pub mod bloom;
pub mod config;
pub mod hash;
pub mod pool;
pub mod table;
pub mod utils;

pub use bloom::{BloomStats, ConcurrentBloomFilter};
pub use config::FilterConfig;
pub use hash::{mix, HashKeys};
pub use pool::WorkerPool;

// Python bindings
#[cfg(feature = "python")]
pub mod python_module;

/// Common error types for the library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BloomError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to allocate {bytes} bytes for the bit table")]
    AllocationFailure { bytes: usize },
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, BloomError>;
