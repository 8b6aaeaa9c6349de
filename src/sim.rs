//! Trace replay driver.
//!
//! [`simulate`] pulls requests from a [`TraceSource`] and feeds them to
//! one cache. [`sweep`] replays a trace buffer through one cache per
//! capacity in lock-step, so a miss-ratio curve costs one pass over the
//! trace; [`sweep_parallel`] runs the same sweep with one thread per
//! capacity. All three produce identical per-cache results because the
//! caches never share state: the trace buffer is the only shared input
//! and is only read.

use std::thread;

use tracing::debug;

use crate::error::ConfigError;
use crate::params::PolicyConfig;
use crate::policy::CachePolicy;
use crate::request::{Request, TraceSource};
use crate::stats::Stats;

/// Replays the remainder of `trace` through `cache`.
pub fn simulate<T: TraceSource>(trace: &mut T, cache: &mut dyn CachePolicy) -> Stats {
    let mut stats = Stats::new();
    for req in trace.by_ref() {
        let hit = cache.get(&req);
        stats.record(&req, hit);
    }
    debug!(
        policy = cache.name(),
        capacity = cache.capacity(),
        n_req = stats.n_req,
        miss_ratio = stats.miss_ratio(),
        "replay finished"
    );
    stats
}

/// Replays an in-memory request buffer through `cache`.
pub fn simulate_slice(requests: &[Request], cache: &mut dyn CachePolicy) -> Stats {
    let mut stats = Stats::new();
    for req in requests {
        let hit = cache.get(req);
        stats.record(req, hit);
    }
    stats
}

/// One capacity on a miss-ratio curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPoint {
    pub capacity: u64,
    pub stats: Stats,
}

/// Builds one cache per capacity and replays `requests` through all of
/// them in lock-step, one trace pass in total.
pub fn sweep(
    config: &PolicyConfig,
    capacities: &[u64],
    requests: &[Request],
) -> Result<Vec<SweepPoint>, ConfigError> {
    let mut caches = capacities
        .iter()
        .map(|&capacity| config.build(capacity))
        .collect::<Result<Vec<_>, _>>()?;
    let mut stats = vec![Stats::new(); caches.len()];
    for req in requests {
        for (cache, stats) in caches.iter_mut().zip(stats.iter_mut()) {
            let hit = cache.get(req);
            stats.record(req, hit);
        }
    }
    Ok(capacities
        .iter()
        .zip(stats)
        .map(|(&capacity, stats)| SweepPoint { capacity, stats })
        .collect())
}

/// Same curve as [`sweep`], computed with one thread per capacity.
///
/// Each thread owns its cache; the request buffer is shared read-only.
pub fn sweep_parallel(
    config: &PolicyConfig,
    capacities: &[u64],
    requests: &[Request],
) -> Result<Vec<SweepPoint>, ConfigError> {
    // Build up front so a bad configuration fails before spawning.
    let caches = capacities
        .iter()
        .map(|&capacity| config.build(capacity))
        .collect::<Result<Vec<_>, _>>()?;
    let points = thread::scope(|scope| {
        let handles: Vec<_> = caches
            .into_iter()
            .map(|mut cache| {
                scope.spawn(move || {
                    let capacity = cache.capacity();
                    let stats = simulate_slice(requests, cache.as_mut());
                    SweepPoint { capacity, stats }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("sweep worker panicked"))
            .collect::<Vec<_>>()
    });
    Ok(points)
}
