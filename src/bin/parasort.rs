//! CLI harness for the segmented bitonic-merge sort engine (§6).
//!
//! Generates a pseudo-random permutation of `2^data_shift` integers,
//! sorts it with the configured coordination strategy, verifies the
//! result, and reports timing to stdout. Exits 0 on a verified sort,
//! 1 on any failure (verification failure or a configuration the sort
//! engine's preconditions reject).

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use parasort::config::{CliArgs, Config};

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let config = Config::resolve(&args);
    log::info!(
        "parasort: data_shift={} segment_size={} num_threads={} wait_policy={:?}",
        config.data_shift,
        config.segment_size,
        config.num_threads,
        config.wait_policy,
    );

    let n = config.num_elements();
    if n % config.segment_size != 0 {
        bail!(
            "num_elements ({n}) is not a multiple of segment_size ({})",
            config.segment_size
        );
    }
    let num_segments = n / config.segment_size;
    if num_segments % config.num_threads != 0 {
        bail!(
            "num_segments ({num_segments}) is not divisible by num_threads ({})",
            config.num_threads
        );
    }

    let mut data = pseudo_random_permutation(n);

    let start = Instant::now();
    parasort::sort::sort(
        &mut data,
        config.resolved_sort_mode(),
        config.num_threads,
        config.segment_size,
        config.wait_policy,
    );
    let elapsed = start.elapsed();

    verify_sorted(&data).context("sort produced an unsorted result")?;

    println!(
        "sorted {n} elements in {:?} ({} threads, {:?})",
        elapsed, config.num_threads, config.sort_mode
    );
    Ok(())
}

fn pseudo_random_permutation(n: usize) -> Vec<u64> {
    let mut data: Vec<u64> = (0..n as u64).collect();
    let mut seed: u64 = 0x9E3779B97F4A7C15 ^ n as u64;
    for i in (1..data.len()).rev() {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let j = (seed as usize) % (i + 1);
        data.swap(i, j);
    }
    data
}

fn verify_sorted(data: &[u64]) -> Result<()> {
    if data.windows(2).all(|w| w[0] <= w[1]) {
        Ok(())
    } else {
        bail!("output is not in ascending order")
    }
}
