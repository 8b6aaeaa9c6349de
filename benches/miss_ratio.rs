//! Trace replay benchmarks across the eviction policies.
//!
//! Run with: `cargo bench --bench miss_ratio`

use cachesim::params::PolicyConfig;
use cachesim::request::Request;
use cachesim::sim::{simulate_slice, sweep};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TRACE_LEN: usize = 50_000;
const UNIQUE_OBJECTS: u64 = 4_000;
const CAPACITY: u64 = 64 * 1024;

/// Skewed synthetic trace: low ids dominate, sizes vary 64..1KiB.
fn skewed_trace(seed: u64) -> Vec<Request> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..TRACE_LEN)
        .map(|i| {
            // Squaring a uniform draw concentrates mass on small ids.
            let draw: f64 = rng.gen();
            let id = ((draw * draw) * UNIQUE_OBJECTS as f64) as u64;
            let size = 64 + rng.gen_range(0..960);
            Request::new(id, size).at(i as u64)
        })
        .collect()
}

// ============================================================================
// Single-cache replay throughput per policy
// ============================================================================

fn bench_replay(c: &mut Criterion) {
    let trace = skewed_trace(42);
    let mut group = c.benchmark_group("replay");
    group.throughput(Throughput::Elements(TRACE_LEN as u64));

    for algo in ["fifo", "lru", "car", "clockpro", "s3fifo", "s3fifov0"] {
        let config = PolicyConfig::parse(algo, "").unwrap();
        group.bench_function(algo, |b| {
            b.iter_batched(
                || config.build(CAPACITY).unwrap(),
                |mut cache| std::hint::black_box(simulate_slice(&trace, cache.as_mut())),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// Lock-step capacity sweep (one trace pass, many cache sizes)
// ============================================================================

fn bench_sweep(c: &mut Criterion) {
    let trace = skewed_trace(42);
    let capacities: Vec<u64> = (1..=8).map(|i| i * 16 * 1024).collect();
    let mut group = c.benchmark_group("sweep");
    group.throughput(Throughput::Elements((TRACE_LEN * capacities.len()) as u64));
    group.sample_size(10);

    for algo in ["lru", "s3fifo"] {
        let config = PolicyConfig::parse(algo, "").unwrap();
        group.bench_function(algo, |b| {
            b.iter(|| std::hint::black_box(sweep(&config, &capacities, &trace).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_replay, bench_sweep);
criterion_main!(benches);
