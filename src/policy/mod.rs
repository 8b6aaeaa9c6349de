//! Eviction policies and the contract they share.
//!
//! Every policy implements [`CachePolicy`]: the four mutating operations
//! (`find`, `insert`, `evict`, `remove`) plus admission (`can_insert`)
//! and victim inspection (`to_evict`), composed into [`CachePolicy::get`]
//! by a provided method. The simulation driver only ever calls `get`;
//! the finer-grained operations exist so tests and composed policies
//! (S3-FIFO drives two FIFO sub-caches through the same interface) can
//! exercise each step in isolation.
//!
//! | Policy                     | Victim selection              | `to_evict` |
//! |----------------------------|-------------------------------|------------|
//! | [`fifo::FifoCache`]        | arrival order                 | exact      |
//! | [`lru::LruCache`]          | least recently used           | exact      |
//! | [`car::CarCache`]          | two adaptive CLOCKs + ghosts  | panics     |
//! | [`clock_pro::ClockProCache`] | hot/cold/test ring          | panics     |
//! | [`s3_fifo::S3FifoCache`]   | small/main FIFOs + ghost      | panics     |
//!
//! `to_evict` panics where selection is not separable from the eviction
//! itself (the scan mutates reference bits and list membership as it
//! goes); returning a guess would mislead callers that rely on it for
//! non-mutating inspection.

pub mod car;
pub mod clock_pro;
pub mod fifo;
pub mod lru;
pub mod s3_fifo;

use crate::request::{ObjId, Request};

/// Sequential, single-owner cache policy over byte-sized objects.
///
/// A policy instance is driven from one thread; `Send` lets independent
/// instances move onto worker threads for parallel capacity sweeps.
pub trait CachePolicy: Send + std::fmt::Debug {
    /// Short algorithm name, e.g. `"s3fifo"`.
    fn name(&self) -> &'static str;

    /// Data capacity in bytes.
    fn capacity(&self) -> u64;

    /// Bytes held by resident objects. Never exceeds `capacity` after a
    /// completed `get`.
    fn occupied_bytes(&self) -> u64;

    /// Number of resident objects.
    fn object_count(&self) -> usize;

    /// Looks up `req.id`. With `update = true` this is an access: it
    /// bumps recency/frequency state and applies TTL expiry. With
    /// `update = false` it is a pure peek; repeated peeks never change
    /// the outcome or any object state.
    fn find(&mut self, req: &Request, update: bool) -> bool;

    /// Admission check, consulted before any eviction work happens.
    /// The default accepts anything that could ever fit.
    fn can_insert(&self, req: &Request) -> bool {
        u64::from(req.size) <= self.capacity()
    }

    /// Inserts `req` as a new resident object. The caller must have
    /// established capacity first (`get` does).
    fn insert(&mut self, req: &Request);

    /// Performs one eviction step. The step may free zero bytes (e.g. a
    /// ClockPro demotion-avoidance pass); callers loop until enough
    /// space exists.
    fn evict(&mut self, req: &Request);

    /// Returns the id the next eviction would remove, without mutating
    /// anything.
    ///
    /// # Panics
    ///
    /// Panics for policies whose eviction scan is not separable from
    /// selection (CAR, ClockPro, S3-FIFO).
    fn to_evict(&self, req: &Request) -> Option<ObjId>;

    /// Removes `id` regardless of queue position; returns whether it
    /// was resident or tracked as a ghost.
    fn remove(&mut self, id: ObjId) -> bool;

    /// Processes one request: hit check, then evict-until-fits, then
    /// insert. Returns `true` on hit.
    ///
    /// A request that cannot be admitted (larger than the cache, or
    /// rejected by the policy's `can_insert`) is a miss with no
    /// insertion and no eviction work.
    fn get(&mut self, req: &Request) -> bool {
        if self.find(req, true) {
            return true;
        }
        if !self.can_insert(req) {
            return false;
        }
        while self.occupied_bytes() + u64::from(req.size) > self.capacity() {
            if self.object_count() == 0 {
                // Nothing left to evict; ghost-only state cannot make room.
                return false;
            }
            self.evict(req);
        }
        self.insert(req);
        false
    }
}
