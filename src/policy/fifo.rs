//! Plain FIFO eviction.
//!
//! Objects are appended at insert time and evicted strictly in arrival
//! order; hits never reorder the queue. Each object carries a small
//! saturating access counter that FIFO itself ignores but that
//! [`S3FifoCache`](crate::policy::s3_fifo::S3FifoCache) reads when it
//! uses `FifoCache` as a sub-cache.

use crate::ds::Queue;
use crate::policy::CachePolicy;
use crate::request::{ObjId, Request};
use crate::store::ObjectStore;

/// Access counters saturate here; two bits of state are enough to
/// separate one-hit wonders from recurring objects.
pub(crate) const MAX_FREQ: u8 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FifoMeta {
    pub(crate) freq: u8,
}

/// A record popped off the queue head, handed to the caller so a
/// composing policy can decide its fate (promote, ghost, or drop).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evicted {
    pub(crate) id: ObjId,
    pub(crate) size: u32,
    pub(crate) expire_time: Option<u64>,
    pub(crate) freq: u8,
}

#[derive(Debug, Default)]
pub struct FifoCache {
    store: ObjectStore<FifoMeta>,
    queue: Queue,
    capacity: u64,
}

impl FifoCache {
    pub fn new(capacity: u64) -> Self {
        FifoCache {
            store: ObjectStore::new(),
            queue: Queue::new(),
            capacity,
        }
    }

    /// Inserts with an explicit starting counter. Used by S3-FIFO when
    /// reinserting survivors into the main queue.
    pub(crate) fn admit(&mut self, id: ObjId, size: u32, expire_time: Option<u64>, freq: u8) {
        let slot = self.store.insert(id, size, expire_time, FifoMeta { freq });
        self.queue.push_back(&mut self.store, slot);
    }

    /// Pops the queue head and fully removes it from the store.
    pub(crate) fn pop_oldest(&mut self) -> Option<Evicted> {
        let slot = self.queue.pop_front(&mut self.store)?;
        let obj = self.store.remove(slot);
        Some(Evicted {
            id: obj.id,
            size: obj.size,
            expire_time: obj.expire_time,
            freq: obj.meta.freq,
        })
    }

    pub(crate) fn peek_oldest(&self) -> Option<ObjId> {
        self.queue.head().map(|slot| self.store.get(slot).id)
    }

    pub(crate) fn contains(&self, id: ObjId) -> bool {
        self.store.contains(id)
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.queue.debug_validate(&self.store);
        self.store.debug_validate_accounting();
        assert_eq!(self.queue.len(), self.store.object_count());
        assert_eq!(self.queue.bytes(), self.store.occupied_bytes());
    }
}

impl CachePolicy for FifoCache {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn occupied_bytes(&self) -> u64 {
        self.store.occupied_bytes()
    }

    fn object_count(&self) -> usize {
        self.store.object_count()
    }

    fn find(&mut self, req: &Request, update: bool) -> bool {
        let Some(slot) = self.store.lookup(req.id) else {
            return false;
        };
        if !update {
            return true;
        }
        if self.store.get(slot).is_expired(req.time) {
            self.queue.unlink(&mut self.store, slot);
            self.store.remove(slot);
            return false;
        }
        let meta = &mut self.store.get_mut(slot).meta;
        meta.freq = (meta.freq + 1).min(MAX_FREQ);
        true
    }

    fn insert(&mut self, req: &Request) {
        self.admit(req.id, req.size, req.expire_time(), 0);
    }

    fn evict(&mut self, _req: &Request) {
        self.pop_oldest();
    }

    fn to_evict(&self, _req: &Request) -> Option<ObjId> {
        self.peek_oldest()
    }

    fn remove(&mut self, id: ObjId) -> bool {
        let Some(slot) = self.store.lookup(id) else {
            return false;
        };
        self.queue.unlink(&mut self.store, slot);
        self.store.remove(slot);
        true
    }
}
