//! Basic usage examples for concurrent-bloom

use concurrent_bloom::utils::{optimal_config, theoretical_fpr};
use concurrent_bloom::{ConcurrentBloomFilter, FilterConfig, WorkerPool};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Concurrent Bloom Filter Examples ===\n");

    // Example 1: Batched insert and contains
    println!("1. Batched insert and contains:");
    let pool = WorkerPool::new(4)?;
    let mut bloom = ConcurrentBloomFilter::with_params(0, 7, 1024)?;

    let test_data = [42u32, 1337, 9999, 12345, 67890];
    bloom.insert(&test_data, &pool);

    for (item, found) in test_data.iter().zip(bloom.contains(&test_data, &pool)) {
        println!("  {} in filter: {}", item, found);
    }

    // Check some items not inserted
    let absent = [1u32, 2, 3, 4, 5];
    for (item, found) in absent.iter().zip(bloom.contains(&absent, &pool)) {
        println!("  {} in filter: {}", item, found);
    }

    println!("  {}", bloom.stats());
    println!();

    // Example 2: Atomic insert through a shared reference
    println!("2. Atomic insert:");
    let shared = ConcurrentBloomFilter::with_params(0, 7, 1024)?;
    std::thread::scope(|s| {
        s.spawn(|| shared.insert_atomic(&[1, 2, 3], &pool));
        s.spawn(|| shared.insert_atomic(&[4, 5, 6], &pool));
    });
    println!(
        "  all six present: {}",
        shared.contains(&[1, 2, 3, 4, 5, 6], &pool).iter().all(|&f| f)
    );
    println!();

    // Example 3: Sizing a filter and comparing worker counts
    println!("3. Sized filter, 1 vs 4 workers:");
    let num_items = 100_000u32;
    let config: FilterConfig = optimal_config(num_items as usize, 0.01, None).with_seed(7);
    println!(
        "  config: {} hashes, {} bytes, theoretical FPR {:.4}",
        config.num_hashes,
        config.table_size_bytes,
        theoretical_fpr(config.num_hashes, num_items as u64, config.table_bit_size())
    );

    let keys: Vec<u32> = (0..num_items).collect();
    for workers in [1, 4] {
        let pool = WorkerPool::new(workers)?;
        let mut filter = ConcurrentBloomFilter::with_config(config)?;

        let start = std::time::Instant::now();
        filter.insert(&keys, &pool);
        let insert_time = start.elapsed();

        let start = std::time::Instant::now();
        let found = filter.contains(&keys, &pool).iter().filter(|&&f| f).count();
        let query_time = start.elapsed();

        println!(
            "  {} worker(s): insert {:?}, contains {:?}, found {}/{}, estimated FPR {:.4}",
            workers,
            insert_time,
            query_time,
            found,
            num_items,
            filter.estimated_fpr()
        );
    }

    Ok(())
}
