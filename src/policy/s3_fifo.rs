//! S3-FIFO eviction.
//!
//! Three sub-caches with independent budgets: a small FIFO (around 10%
//! of the capacity) absorbs new arrivals, a main FIFO (the rest) keeps
//! objects that proved themselves, and a byte-budgeted ghost FIFO
//! remembers ids recently evicted from small. An object popped from
//! small is promoted into main if its access counter reached
//! `move_to_main_threshold`, otherwise it leaves a ghost behind; a
//! ghost hit routes the re-arrival straight into main. Main evicts with
//! a 2-bit CLOCK: a referenced head is reinserted with its counter
//! decayed instead of being dropped.
//!
//! The v0 variant differs only at insert: every new object enters the
//! small FIFO, even when it overflows it. v1 sends overflow directly to
//! main.

use crate::ds::GhostFifo;
use crate::error::ConfigError;
use crate::policy::fifo::{FifoCache, MAX_FREQ};
use crate::policy::CachePolicy;
use crate::request::{ObjId, Request};

const DEFAULT_SMALL_RATIO: f64 = 0.10;
const DEFAULT_GHOST_RATIO: f64 = 0.90;
const DEFAULT_THRESHOLD: u8 = 2;

#[derive(Debug)]
pub struct S3FifoCache {
    small: FifoCache,
    main: FifoCache,
    ghost: GhostFifo,
    move_to_main_threshold: u8,
    capacity: u64,
    /// Set by a ghost hit in `find`, consumed by the next `insert`.
    hit_on_ghost: bool,
    v0_insertion: bool,
    ghost_hits: u64,
    promotions: u64,
}

impl S3FifoCache {
    /// v1 with the conventional budgets: small 10%, ghost 90%,
    /// promotion threshold 2.
    pub fn new(capacity: u64) -> Self {
        Self::try_with_ratios(
            capacity,
            DEFAULT_SMALL_RATIO,
            DEFAULT_GHOST_RATIO,
            DEFAULT_THRESHOLD,
        )
        .expect("default ratios are valid")
    }

    /// v0 (always-insert-into-small) with the conventional budgets.
    pub fn new_v0(capacity: u64) -> Self {
        let mut cache = Self::new(capacity);
        cache.v0_insertion = true;
        cache
    }

    /// Fallible constructor for user-supplied budgets.
    ///
    /// `small_ratio` carves the small FIFO out of `capacity` and must be
    /// in `[0, 1]`; `ghost_ratio` sizes the ghost FIFO relative to
    /// `capacity` and must be non-negative; `threshold` must not exceed
    /// the counter maximum of 3.
    pub fn try_with_ratios(
        capacity: u64,
        small_ratio: f64,
        ghost_ratio: f64,
        threshold: u8,
    ) -> Result<Self, ConfigError> {
        if !small_ratio.is_finite() || !(0.0..=1.0).contains(&small_ratio) {
            return Err(ConfigError::new(format!(
                "small-size-ratio must be in [0, 1], got {small_ratio}"
            )));
        }
        if !ghost_ratio.is_finite() || ghost_ratio < 0.0 {
            return Err(ConfigError::new(format!(
                "ghost-size-ratio must be non-negative, got {ghost_ratio}"
            )));
        }
        if threshold > MAX_FREQ {
            return Err(ConfigError::new(format!(
                "move-to-main-threshold must be at most {MAX_FREQ}, got {threshold}"
            )));
        }
        let small_capacity = ((capacity as f64) * small_ratio).round() as u64;
        let small_capacity = small_capacity.min(capacity);
        let ghost_capacity = ((capacity as f64) * ghost_ratio).round() as u64;
        Ok(S3FifoCache {
            small: FifoCache::new(small_capacity),
            main: FifoCache::new(capacity - small_capacity),
            ghost: GhostFifo::new(ghost_capacity),
            move_to_main_threshold: threshold,
            capacity,
            hit_on_ghost: false,
            v0_insertion: false,
            ghost_hits: 0,
            promotions: 0,
        })
    }

    /// v0 twin of [`try_with_ratios`](Self::try_with_ratios).
    pub fn try_v0_with_ratios(
        capacity: u64,
        small_ratio: f64,
        ghost_ratio: f64,
        threshold: u8,
    ) -> Result<Self, ConfigError> {
        let mut cache = Self::try_with_ratios(capacity, small_ratio, ghost_ratio, threshold)?;
        cache.v0_insertion = true;
        Ok(cache)
    }

    /// Ghost hits seen so far (misses that re-entered via the ghost
    /// FIFO).
    pub fn ghost_hits(&self) -> u64 {
        self.ghost_hits
    }

    /// Small-to-main survivor promotions performed so far.
    pub fn promotions(&self) -> u64 {
        self.promotions
    }

    fn evict_small(&mut self) {
        let Some(victim) = self.small.pop_oldest() else {
            return;
        };
        if victim.freq >= self.move_to_main_threshold {
            // Survivor: moves to main, so no byte left the cache as a
            // whole and the caller's eviction loop goes another round.
            self.promotions += 1;
            self.main.admit(victim.id, victim.size, victim.expire_time, 0);
        } else {
            self.ghost.record(victim.id, victim.size);
        }
    }

    fn evict_main(&mut self) {
        // Every reinsertion strictly decreases the counter, so one true
        // eviction happens within this budget.
        let budget = (usize::from(MAX_FREQ) + 1) * self.main.object_count() + 1;
        for _ in 0..budget {
            let Some(victim) = self.main.pop_oldest() else {
                return;
            };
            if victim.freq >= 1 {
                self.main.admit(
                    victim.id,
                    victim.size,
                    victim.expire_time,
                    victim.freq.min(MAX_FREQ) - 1,
                );
            } else {
                return;
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.small.debug_validate();
        self.main.debug_validate();
        self.ghost.debug_validate();
        assert!(
            self.small.occupied_bytes() + self.main.occupied_bytes() <= self.capacity,
            "sub-cache bytes exceed total capacity"
        );
    }
}

impl CachePolicy for S3FifoCache {
    fn name(&self) -> &'static str {
        if self.v0_insertion {
            "s3fifov0"
        } else {
            "s3fifo"
        }
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn occupied_bytes(&self) -> u64 {
        self.small.occupied_bytes() + self.main.occupied_bytes()
    }

    fn object_count(&self) -> usize {
        self.small.object_count() + self.main.object_count()
    }

    fn find(&mut self, req: &Request, update: bool) -> bool {
        debug_assert!(
            self.small.occupied_bytes() + self.main.occupied_bytes() <= self.capacity,
            "sub-cache bytes exceed total capacity"
        );
        if update {
            self.hit_on_ghost = false;
        }
        if self.small.find(req, update) {
            return true;
        }
        if update && self.ghost.remove(req.id) {
            self.ghost_hits += 1;
            self.hit_on_ghost = true;
        }
        self.main.find(req, update)
    }

    fn can_insert(&self, req: &Request) -> bool {
        // Everything that lasts ends up in main, so main's budget is the
        // binding one.
        u64::from(req.size) <= self.main.capacity()
    }

    fn insert(&mut self, req: &Request) {
        let expire_time = req.expire_time();
        if self.hit_on_ghost {
            self.hit_on_ghost = false;
            self.main.admit(req.id, req.size, expire_time, 0);
        } else if !self.v0_insertion
            && self.small.occupied_bytes() + u64::from(req.size) > self.small.capacity()
        {
            self.main.admit(req.id, req.size, expire_time, 0);
        } else {
            self.small.admit(req.id, req.size, expire_time, 0);
        }
    }

    fn evict(&mut self, _req: &Request) {
        if self.main.occupied_bytes() > self.main.capacity() || self.small.object_count() == 0 {
            self.evict_main();
        } else {
            self.evict_small();
        }
    }

    fn to_evict(&self, _req: &Request) -> Option<ObjId> {
        panic!("s3fifo: victim selection is not separable from the eviction scan");
    }

    fn remove(&mut self, id: ObjId) -> bool {
        let mut removed = self.ghost.remove(id);
        removed |= self.small.remove(id);
        removed |= self.main.remove(id);
        removed
    }
}
