//! Utility functions for sizing Bloom filters

use crate::config::{FilterConfig, DEFAULT_SEED};

/// Upper bound on the hash count picked by [`optimal_config`]
pub const MAX_OPTIMAL_HASHES: usize = 20;

/// Theoretical false positive rate `(1 - e^(-kn/m))^k` after inserting `n`
/// distinct keys into `m` bits with `k` hash functions.
pub fn theoretical_fpr(num_hashes: usize, inserted: u64, table_bits: u64) -> f64 {
    if table_bits == 0 {
        return 1.0;
    }
    let k = num_hashes as f64;
    let n = inserted as f64;
    let m = table_bits as f64;
    (1.0 - (-k * n / m).exp()).powi(num_hashes as i32)
}

/// Size a filter for `expected_elements` keys at `desired_fpr`.
///
/// The table is rounded up to whole bytes and capped at `max_table_bytes`
/// when given; the hash count is then chosen for the final table size and
/// kept in `1..=20`.
pub fn optimal_config(
    expected_elements: usize,
    desired_fpr: f64,
    max_table_bytes: Option<u32>,
) -> FilterConfig {
    if expected_elements == 0 {
        return FilterConfig::new(DEFAULT_SEED, 1, 1);
    }

    let n = expected_elements as f64;
    let p = desired_fpr.clamp(f64::MIN_POSITIVE, 1.0);

    // Optimal number of bits: m = -n * ln(p) / (ln(2))^2
    let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
    let optimal_bits = (-n * p.ln() / ln2_squared).ceil();
    let optimal_bytes = (optimal_bits / 8.0).ceil().clamp(1.0, u32::MAX as f64) as u32;

    let table_size_bytes = match max_table_bytes {
        Some(max_bytes) if optimal_bytes > max_bytes => max_bytes.max(1),
        _ => optimal_bytes,
    };

    // Optimal number of hash functions: k = (m/n) * ln(2)
    let m = f64::from(table_size_bytes) * 8.0;
    let optimal_hashes = ((m / n) * std::f64::consts::LN_2).round() as usize;
    let num_hashes = optimal_hashes.clamp(1, MAX_OPTIMAL_HASHES);

    FilterConfig::new(DEFAULT_SEED, num_hashes, table_size_bytes)
}
