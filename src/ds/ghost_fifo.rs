//! Byte-budgeted ghost FIFO.
//!
//! Tracks `(id, size)` tombstones of recently evicted objects in strict
//! arrival order, bounded by a byte budget rather than an entry count.
//! Used by S3-FIFO as its third queue: a ghost hit re-routes the next
//! insert of that id into the main queue.
//!
//! Built from the same store + intrusive queue machinery as the data
//! queues so that removal-on-ghost-hit stays O(1). Tombstones enter the
//! store as ghost records, so they never touch resident accounting.

use crate::ds::queue::Queue;
use crate::request::ObjId;
use crate::store::ObjectStore;

/// FIFO of ghost tombstones with a byte budget.
#[derive(Debug)]
pub struct GhostFifo {
    store: ObjectStore<()>,
    queue: Queue,
    capacity: u64,
}

impl GhostFifo {
    /// Creates a ghost FIFO holding at most `capacity` bytes of
    /// tombstones. A zero capacity disables ghost tracking entirely.
    pub fn new(capacity: u64) -> Self {
        Self {
            store: ObjectStore::new(),
            queue: Queue::new(),
            capacity,
        }
    }

    /// Returns the byte budget.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently held by tombstones.
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.queue.bytes()
    }

    /// Number of tombstones.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no tombstone is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns `true` if `id` has a tombstone.
    #[inline]
    pub fn contains(&self, id: ObjId) -> bool {
        self.store.contains(id)
    }

    /// Records a tombstone for `id`, dropping the oldest tombstones
    /// until the byte budget holds. A duplicate record is a no-op (the
    /// id keeps its original position; ghost hits remove before
    /// re-recording, so this only guards misuse).
    pub fn record(&mut self, id: ObjId, size: u32) {
        if self.capacity == 0 || u64::from(size) > self.capacity {
            return;
        }
        if self.store.contains(id) {
            return;
        }
        while self.queue.bytes() + u64::from(size) > self.capacity {
            let oldest = self
                .queue
                .pop_front(&mut self.store)
                .expect("ghost budget exceeded with empty queue");
            self.store.remove(oldest);
        }
        let slot = self.store.insert_ghost(id, size, ());
        self.queue.push_back(&mut self.store, slot);
    }

    /// Removes `id`'s tombstone; returns `true` if one existed.
    pub fn remove(&mut self, id: ObjId) -> bool {
        let slot = match self.store.lookup(id) {
            Some(slot) => slot,
            None => return false,
        };
        self.queue.unlink(&mut self.store, slot);
        self.store.remove(slot);
        true
    }

    /// Drops every tombstone.
    pub fn clear(&mut self) {
        self.store.clear();
        self.queue.reset();
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.queue.debug_validate(&self.store);
        self.store.debug_validate_accounting();
        assert!(self.queue.bytes() <= self.capacity, "ghost over budget");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_evicts_oldest_when_over_budget() {
        let mut ghost = GhostFifo::new(10);
        ghost.record(1, 4);
        ghost.record(2, 4);
        assert!(ghost.contains(1));
        assert!(ghost.contains(2));

        // 4 + 4 + 4 > 10: id 1 is the oldest, it goes.
        ghost.record(3, 4);
        assert!(!ghost.contains(1));
        assert!(ghost.contains(2));
        assert!(ghost.contains(3));
        assert_eq!(ghost.bytes(), 8);
        ghost.debug_validate();
    }

    #[test]
    fn zero_capacity_tracks_nothing() {
        let mut ghost = GhostFifo::new(0);
        ghost.record(1, 1);
        assert!(ghost.is_empty());
        assert!(!ghost.contains(1));
    }

    #[test]
    fn oversized_tombstone_is_dropped() {
        let mut ghost = GhostFifo::new(8);
        ghost.record(1, 9);
        assert!(ghost.is_empty());
        ghost.record(2, 8);
        assert!(ghost.contains(2));
        ghost.debug_validate();
    }

    #[test]
    fn remove_frees_budget() {
        let mut ghost = GhostFifo::new(8);
        ghost.record(1, 4);
        ghost.record(2, 4);
        assert!(ghost.remove(1));
        assert!(!ghost.remove(1));
        assert_eq!(ghost.bytes(), 4);

        ghost.record(3, 4);
        assert!(ghost.contains(2));
        assert!(ghost.contains(3));
        ghost.debug_validate();
    }

    #[test]
    fn duplicate_record_keeps_position() {
        let mut ghost = GhostFifo::new(12);
        ghost.record(1, 4);
        ghost.record(2, 4);
        ghost.record(1, 4);
        assert_eq!(ghost.bytes(), 8);

        // id 1 is still the oldest: next overflow drops it first.
        ghost.record(3, 4);
        ghost.record(4, 4);
        assert!(!ghost.contains(1));
        assert!(ghost.contains(2));
        ghost.debug_validate();
    }
}
