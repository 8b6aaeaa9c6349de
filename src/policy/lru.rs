//! LRU eviction over the intrusive queue, head = least recent.

use crate::ds::Queue;
use crate::policy::CachePolicy;
use crate::request::{ObjId, Request};
use crate::store::ObjectStore;

#[derive(Debug, Default)]
pub struct LruCache {
    store: ObjectStore<()>,
    queue: Queue,
    capacity: u64,
}

impl LruCache {
    pub fn new(capacity: u64) -> Self {
        LruCache {
            store: ObjectStore::new(),
            queue: Queue::new(),
            capacity,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.queue.debug_validate(&self.store);
        self.store.debug_validate_accounting();
        assert_eq!(self.queue.bytes(), self.store.occupied_bytes());
    }
}

impl CachePolicy for LruCache {
    fn name(&self) -> &'static str {
        "lru"
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
        self.queue.move_to_back(&mut self.store, slot);
        true
    }

    fn insert(&mut self, req: &Request) {
        let slot = self.store.insert(req.id, req.size, req.expire_time(), ());
        self.queue.push_back(&mut self.store, slot);
    }

    fn evict(&mut self, _req: &Request) {
        if let Some(slot) = self.queue.pop_front(&mut self.store) {
            self.store.remove(slot);
        }
    }

    fn to_evict(&self, _req: &Request) -> Option<ObjId> {
        self.queue.head().map(|slot| self.store.get(slot).id)
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
