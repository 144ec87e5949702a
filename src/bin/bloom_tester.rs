//! Checks that inserting and querying with many workers gives the same
//! answers as doing it with one.

use clap::Parser;
use concurrent_bloom::{ConcurrentBloomFilter, WorkerPool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloom_tester", about = "Compare serial and parallel batch results")]
struct Cli {
    /// Number of keys in the batch
    #[arg(long, default_value_t = 1_000_000)]
    batch_size: usize,
    /// Worker count for the parallel run
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Seed for the key generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run(cli: &Cli) -> concurrent_bloom::Result<bool> {
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let batch: Vec<u32> = (0..cli.batch_size).map(|_| rng.gen()).collect();

    let serial_pool = WorkerPool::single()?;
    let mut serial = ConcurrentBloomFilter::new()?;
    serial.insert(&batch, &serial_pool);
    let serial_found = serial.contains(&batch, &serial_pool);

    let parallel_pool = WorkerPool::new(cli.workers)?;
    let mut parallel = ConcurrentBloomFilter::new()?;
    parallel.insert(&batch, &parallel_pool);
    let parallel_found = parallel.contains(&batch, &parallel_pool);

    let mismatches = serial_found
        .iter()
        .zip(&parallel_found)
        .filter(|(a, b)| a != b)
        .count();
    if mismatches > 0 {
        error!(mismatches, "serial and parallel results differ");
        return Ok(false);
    }
    if serial_found.iter().any(|&found| !found) {
        error!("an inserted key was reported absent");
        return Ok(false);
    }

    info!(
        batch = cli.batch_size,
        workers = parallel_pool.num_workers(),
        "serial and parallel results match"
    );
    Ok(true)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => {
            println!("Success");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("Failed the test");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
