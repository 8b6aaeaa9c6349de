//! Intrusive FIFO/LRU queue over an [`ObjectStore`].
//!
//! The queue owns no records: it is a structural view threading the
//! `prev`/`next` handles embedded in [`CacheObject`]s that live in the
//! store. Head is the oldest member (the eviction end), tail the newest.
//! Every operation is O(1); `len` and `bytes` are maintained inline so
//! policies can compare list occupancy without walking.
//!
//! After `unlink`, the record's link fields are cleared; an object is
//! a member of at most one queue at a time, and a cleared record can be
//! pushed onto any queue.
//!
//! [`CacheObject`]: crate::store::CacheObject

use crate::ds::slot_arena::SlotId;
use crate::store::ObjectStore;

/// Head/tail handles plus running totals for one intrusive queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Queue {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
    bytes: u64,
}

impl Queue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest member (next eviction candidate).
    #[inline]
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    /// Newest member.
    #[inline]
    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of member sizes in bytes.
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Appends `slot` at the tail (newest position).
    pub fn push_back<M>(&mut self, store: &mut ObjectStore<M>, slot: SlotId) {
        let size = {
            let obj = store.get_mut(slot);
            debug_assert!(obj.prev.is_none() && obj.next.is_none());
            obj.prev = self.tail;
            obj.next = None;
            obj.size
        };
        match self.tail {
            Some(old_tail) => {
                store.get_mut(old_tail).next = Some(slot);
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        self.bytes += u64::from(size);
    }

    /// Prepends `slot` at the head (oldest position).
    pub fn push_front<M>(&mut self, store: &mut ObjectStore<M>, slot: SlotId) {
        let size = {
            let obj = store.get_mut(slot);
            debug_assert!(obj.prev.is_none() && obj.next.is_none());
            obj.prev = None;
            obj.next = self.head;
            obj.size
        };
        match self.head {
            Some(old_head) => {
                store.get_mut(old_head).prev = Some(slot);
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
        self.bytes += u64::from(size);
    }

    /// Detaches `slot` from the queue and clears its link fields.
    pub fn unlink<M>(&mut self, store: &mut ObjectStore<M>, slot: SlotId) {
        let (prev, next, size) = {
            let obj = store.get_mut(slot);
            let links = (obj.prev, obj.next, obj.size);
            obj.prev = None;
            obj.next = None;
            links
        };
        match prev {
            Some(p) => store.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => store.get_mut(n).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        self.bytes -= u64::from(size);
    }

    /// Moves `slot` to the tail (newest position). The LRU touch.
    pub fn move_to_back<M>(&mut self, store: &mut ObjectStore<M>, slot: SlotId) {
        if self.tail == Some(slot) {
            return;
        }
        self.unlink(store, slot);
        self.push_back(store, slot);
    }

    /// Detaches and returns the head, if any.
    pub fn pop_front<M>(&mut self, store: &mut ObjectStore<M>) -> Option<SlotId> {
        let head = self.head?;
        self.unlink(store, head);
        Some(head)
    }

    /// Resets the queue to empty without touching records.
    ///
    /// Only valid when the store side is being cleared as well.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Walks the chain and cross-checks `len`/`bytes` and link symmetry.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate<M>(&self, store: &ObjectStore<M>) {
        let mut count = 0usize;
        let mut bytes = 0u64;
        let mut prev: Option<SlotId> = None;
        let mut cur = self.head;
        while let Some(slot) = cur {
            let obj = store.get(slot);
            assert_eq!(obj.prev, prev, "broken prev link at slot {}", slot.index());
            count += 1;
            bytes += u64::from(obj.size);
            assert!(count <= store.tracked(), "queue cycle detected");
            prev = cur;
            cur = obj.next;
        }
        assert_eq!(self.tail, prev, "tail does not match walk");
        assert_eq!(count, self.len, "queue len drift");
        assert_eq!(bytes, self.bytes, "queue byte drift");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[(u64, u32)]) -> (ObjectStore<()>, Vec<SlotId>) {
        let mut store = ObjectStore::new();
        let slots = ids
            .iter()
            .map(|&(id, size)| store.insert(id, size, None, ()))
            .collect();
        (store, slots)
    }

    #[test]
    fn push_back_preserves_arrival_order() {
        let (mut store, slots) = store_with(&[(1, 10), (2, 20), (3, 30)]);
        let mut q = Queue::new();
        for &slot in &slots {
            q.push_back(&mut store, slot);
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.bytes(), 60);
        assert_eq!(q.head(), Some(slots[0]));
        assert_eq!(q.tail(), Some(slots[2]));
        q.debug_validate(&store);

        assert_eq!(q.pop_front(&mut store), Some(slots[0]));
        assert_eq!(q.pop_front(&mut store), Some(slots[1]));
        assert_eq!(q.pop_front(&mut store), Some(slots[2]));
        assert_eq!(q.pop_front(&mut store), None);
        assert_eq!(q.bytes(), 0);
    }

    #[test]
    fn unlink_middle_and_relink() {
        let (mut store, slots) = store_with(&[(1, 1), (2, 1), (3, 1)]);
        let mut q = Queue::new();
        for &slot in &slots {
            q.push_back(&mut store, slot);
        }
        q.unlink(&mut store, slots[1]);
        q.debug_validate(&store);
        assert_eq!(q.len(), 2);

        // Cleared links allow re-admission at the tail.
        q.push_back(&mut store, slots[1]);
        q.debug_validate(&store);
        assert_eq!(q.tail(), Some(slots[1]));
    }

    #[test]
    fn move_to_back_is_noop_on_tail() {
        let (mut store, slots) = store_with(&[(1, 1), (2, 1)]);
        let mut q = Queue::new();
        q.push_back(&mut store, slots[0]);
        q.push_back(&mut store, slots[1]);

        q.move_to_back(&mut store, slots[1]);
        assert_eq!(q.head(), Some(slots[0]));
        q.move_to_back(&mut store, slots[0]);
        assert_eq!(q.head(), Some(slots[1]));
        assert_eq!(q.tail(), Some(slots[0]));
        q.debug_validate(&store);
    }

    #[test]
    fn single_member_queue_empties_cleanly() {
        let (mut store, slots) = store_with(&[(9, 5)]);
        let mut q = Queue::new();
        q.push_back(&mut store, slots[0]);
        q.unlink(&mut store, slots[0]);
        assert!(q.is_empty());
        assert_eq!(q.head(), None);
        assert_eq!(q.tail(), None);
        q.debug_validate(&store);
    }

    #[test]
    fn push_front_is_eviction_end() {
        let (mut store, slots) = store_with(&[(1, 1), (2, 1)]);
        let mut q = Queue::new();
        q.push_back(&mut store, slots[0]);
        q.push_front(&mut store, slots[1]);
        assert_eq!(q.head(), Some(slots[1]));
        q.debug_validate(&store);
    }
}
