//! Shared object store: hash index plus record arena.
//!
//! Every policy keeps its tracked objects, resident entries and ghost
//! tombstones alike, in one `ObjectStore`. The store owns the records
//! and the byte accounting; policies own ordering (queues, rings) built
//! from the `prev`/`next` handles embedded in each record.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<ObjId, SlotId>     arena: SlotArena<CacheObject<M>>
//!   ┌──────────┬──────────┐            ┌─────┬────────────────────────────┐
//!   │ ObjId    │ SlotId   │            │ idx │ id, size, prev, next, meta │
//!   ├──────────┼──────────┤            ├─────┼────────────────────────────┤
//!   │  1001    │  id(0)   │───────────►│  0  │ 1001, 4096, …   (resident) │
//!   │  1002    │  id(1)   │───────────►│  1  │ 1002,  512, …   (ghost)    │
//!   └──────────┴──────────┘            └─────┴────────────────────────────┘
//!
//!   occupied_bytes / object_count   ← residents only
//!   ghost_bytes / ghost_count       ← tombstones (no data capacity cost)
//! ```
//!
//! Centralizing the byte bookkeeping here is deliberate: a policy that
//! inserts, demotes or removes through the store cannot forget to update
//! `occupied_bytes`, which is the correctness-critical counter behind
//! the capacity invariant.

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;
use crate::request::ObjId;

/// One tracked object: a resident cache entry or a ghost tombstone.
///
/// `size` is frozen at insertion time and used for all capacity
/// accounting, even if later requests for the same id carry a different
/// size. `prev`/`next` are the intrusive list links; a record belongs to
/// at most one queue or ring at a time.
#[derive(Debug)]
pub struct CacheObject<M> {
    /// Object identifier (unique within the store).
    pub id: ObjId,
    /// Accounted size in bytes.
    pub size: u32,
    /// Absolute expiry deadline, if the inserting request carried a TTL.
    pub expire_time: Option<u64>,
    pub(crate) prev: Option<SlotId>,
    pub(crate) next: Option<SlotId>,
    pub(crate) resident: bool,
    /// Policy-specific metadata (reference bit, queue tag, frequency).
    pub meta: M,
}

impl<M> CacheObject<M> {
    /// Returns `true` if the record counts against the data capacity.
    #[inline]
    pub fn is_resident(&self) -> bool {
        self.resident
    }

    /// Returns `true` if the object's TTL deadline has passed at `now`.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.expire_time, Some(deadline) if deadline <= now)
    }
}

/// Hash-indexed arena of [`CacheObject`]s with centralized accounting.
#[derive(Debug)]
pub struct ObjectStore<M> {
    arena: SlotArena<CacheObject<M>>,
    index: FxHashMap<ObjId, SlotId>,
    occupied_bytes: u64,
    object_count: usize,
    ghost_bytes: u64,
    ghost_count: usize,
}

impl<M> ObjectStore<M> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            index: FxHashMap::default(),
            occupied_bytes: 0,
            object_count: 0,
            ghost_bytes: 0,
            ghost_count: 0,
        }
    }

    /// Creates an empty store with reserved record capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ..Self::new()
        }
    }

    /// Looks up the slot tracking `id` (resident or ghost).
    #[inline]
    pub fn lookup(&self, id: ObjId) -> Option<SlotId> {
        self.index.get(&id).copied()
    }

    /// Returns `true` if `id` is tracked (resident or ghost).
    #[inline]
    pub fn contains(&self, id: ObjId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns the record at `slot`.
    ///
    /// Slots only come from this store's `insert`/`lookup`, so a stale
    /// slot is a policy bug and panics.
    #[inline]
    pub fn get(&self, slot: SlotId) -> &CacheObject<M> {
        self.arena.get(slot).expect("stale slot")
    }

    /// Returns the record at `slot` mutably.
    #[inline]
    pub fn get_mut(&mut self, slot: SlotId) -> &mut CacheObject<M> {
        self.arena.get_mut(slot).expect("stale slot")
    }

    /// Inserts a new resident record and accounts its bytes.
    ///
    /// The caller must have evicted or removed any previous record for
    /// the same id first; a duplicate insert is a programming error.
    pub fn insert(&mut self, id: ObjId, size: u32, expire_time: Option<u64>, meta: M) -> SlotId {
        let slot = self.arena.insert(CacheObject {
            id,
            size,
            expire_time,
            prev: None,
            next: None,
            resident: true,
            meta,
        });
        let prev = self.index.insert(id, slot);
        debug_assert!(prev.is_none(), "duplicate insert for object {id}");
        self.occupied_bytes += u64::from(size);
        self.object_count += 1;
        slot
    }

    /// Inserts a ghost tombstone: indexed and linkable, but costing no
    /// data capacity.
    pub fn insert_ghost(&mut self, id: ObjId, size: u32, meta: M) -> SlotId {
        let slot = self.arena.insert(CacheObject {
            id,
            size,
            expire_time: None,
            prev: None,
            next: None,
            resident: false,
            meta,
        });
        let prev = self.index.insert(id, slot);
        debug_assert!(prev.is_none(), "duplicate ghost insert for object {id}");
        self.ghost_bytes += u64::from(size);
        self.ghost_count += 1;
        slot
    }

    /// Converts a resident record into a ghost tombstone in place.
    ///
    /// The record keeps its slot, id and list links; its bytes move from
    /// the data accounting to the ghost accounting.
    pub fn demote_to_ghost(&mut self, slot: SlotId) {
        let obj = self.arena.get_mut(slot).expect("demote of stale slot");
        debug_assert!(obj.resident, "demote of non-resident object {}", obj.id);
        obj.resident = false;
        let size = u64::from(obj.size);
        self.occupied_bytes -= size;
        self.object_count -= 1;
        self.ghost_bytes += size;
        self.ghost_count += 1;
    }

    /// Removes the record at `slot`, un-accounting its bytes.
    ///
    /// The caller must have unlinked the record from its queue or ring
    /// first; the store does not touch neighbours.
    pub fn remove(&mut self, slot: SlotId) -> CacheObject<M> {
        let obj = self.arena.remove(slot).expect("remove of stale slot");
        self.index.remove(&obj.id);
        if obj.resident {
            self.occupied_bytes -= u64::from(obj.size);
            self.object_count -= 1;
        } else {
            self.ghost_bytes -= u64::from(obj.size);
            self.ghost_count -= 1;
        }
        obj
    }

    /// Bytes held by resident objects.
    #[inline]
    pub fn occupied_bytes(&self) -> u64 {
        self.occupied_bytes
    }

    /// Number of resident objects.
    #[inline]
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Bytes held by ghost tombstones (not counted against capacity).
    #[inline]
    pub fn ghost_bytes(&self) -> u64 {
        self.ghost_bytes
    }

    /// Number of ghost tombstones.
    #[inline]
    pub fn ghost_count(&self) -> usize {
        self.ghost_count
    }

    /// Total number of tracked records.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.object_count + self.ghost_count
    }

    /// Drops every record and resets the accounting.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.index.clear();
        self.occupied_bytes = 0;
        self.object_count = 0;
        self.ghost_bytes = 0;
        self.ghost_count = 0;
    }

    /// Walks every record and cross-checks the running accounting.
    ///
    /// O(n); intended for tests and debugging, not the replay path.
    pub fn check_accounting(&self) -> Result<(), InvariantError> {
        let mut bytes = 0u64;
        let mut count = 0usize;
        let mut gbytes = 0u64;
        let mut gcount = 0usize;
        for (slot, obj) in self.arena.iter() {
            if self.index.get(&obj.id).copied() != Some(slot) {
                return Err(InvariantError::new(format!(
                    "index does not point at slot for object {}",
                    obj.id
                )));
            }
            if obj.resident {
                bytes += u64::from(obj.size);
                count += 1;
            } else {
                gbytes += u64::from(obj.size);
                gcount += 1;
            }
        }
        if bytes != self.occupied_bytes || count != self.object_count {
            return Err(InvariantError::new(format!(
                "resident accounting drift: {bytes}B/{count} walked, {}B/{} recorded",
                self.occupied_bytes, self.object_count
            )));
        }
        if gbytes != self.ghost_bytes || gcount != self.ghost_count {
            return Err(InvariantError::new(format!(
                "ghost accounting drift: {gbytes}B/{gcount} walked, {}B/{} recorded",
                self.ghost_bytes, self.ghost_count
            )));
        }
        if self.index.len() != self.tracked() {
            return Err(InvariantError::new("index and arena are out of sync"));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_accounting(&self) {
        if let Err(err) = self.check_accounting() {
            panic!("{err}");
        }
    }
}

impl<M> Default for ObjectStore<M> {
    fn default() -> Self {
        Self::new()
    }
}
