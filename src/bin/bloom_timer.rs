//! Times batch insert and contains across batch sizes and worker counts.

use clap::Parser;
use concurrent_bloom::{ConcurrentBloomFilter, WorkerPool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloom_timer", about = "Time batch insert and contains across worker counts")]
struct Cli {
    /// Number of batch sizes to try, each ten times the previous
    #[arg(long, default_value_t = 4)]
    steps: u32,
    /// First batch size
    #[arg(long, default_value_t = 1000)]
    starting_size: usize,
    /// Largest worker count; counts double from 1 up to this
    #[arg(long, default_value_t = 8)]
    max_workers: usize,
    /// Seed for the key generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let worker_counts: Vec<usize> = std::iter::successors(Some(1usize), |&w| w.checked_mul(2))
        .take_while(|&w| w <= cli.max_workers.max(1))
        .collect();
    let pools = worker_counts
        .iter()
        .map(|&w| WorkerPool::new(w))
        .collect::<concurrent_bloom::Result<Vec<_>>>()?;

    println!("Batch Timer");
    println!("{}", "=".repeat(40));

    let mut results = Vec::new();
    let mut batch_size = cli.starting_size;
    for _ in 0..cli.steps {
        println!("Batch Size: {}", batch_size);
        let batch: Vec<u32> = (0..batch_size).map(|_| rng.gen()).collect();

        for pool in &pools {
            let workers = pool.num_workers();
            let mut filter = ConcurrentBloomFilter::new()?;

            let start = Instant::now();
            filter.insert(&batch, pool);
            let insert_time = start.elapsed().as_secs_f64();
            println!("Insertion Time {} Threads: {:.6}", workers, insert_time);

            let start = Instant::now();
            let found = filter.contains(&batch, pool);
            let contains_time = start.elapsed().as_secs_f64();
            println!("Contains Time {} Threads: {:.6}", workers, contains_time);

            debug_assert!(found.iter().all(|&f| f));
            results.push((batch_size, workers, insert_time, contains_time));
        }

        batch_size = batch_size.saturating_mul(10);
    }

    // Print results in CSV format for plotting
    println!("\nResults (CSV format):");
    println!("batch_size,workers,insert_time,contains_time");
    for (batch_size, workers, insert_time, contains_time) in &results {
        println!(
            "{},{},{:.6},{:.6}",
            batch_size, workers, insert_time, contains_time
        );
    }

    Ok(())
}
