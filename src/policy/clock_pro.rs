//! ClockPro eviction.
//!
//! One circular ring holds every tracked page, tagged `hot`, `cold`, or
//! `test` (a non-resident ghost left behind by a cold eviction). Three
//! hands walk the same ring: the cold hand evicts, the hot hand demotes
//! hot pages back to cold, the test hand expires ghosts. The byte
//! budget for cold-resident pages, `mem_cold_max`, adapts: a hit on a
//! test ghost proves the cold section was too small and grows it, a
//! ghost aging out shrinks it.
//!
//! Hits never move a page. A referenced cold page is promoted to hot
//! only when the cold hand reaches it, so a single `evict` call may
//! free zero bytes and callers must retry.

use crate::ds::SlotId;
use crate::policy::CachePolicy;
use crate::request::{ObjId, Request};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageStatus {
    Hot,
    Cold,
    Test,
}

#[derive(Debug, Clone, Copy)]
struct ClockProMeta {
    status: PageStatus,
    referenced: bool,
}

#[derive(Debug)]
pub struct ClockProCache {
    store: ObjectStore<ClockProMeta>,
    hand_hot: Option<SlotId>,
    hand_cold: Option<SlotId>,
    hand_test: Option<SlotId>,
    mem_hot: u64,
    mem_cold: u64,
    /// Adaptive cap on cold-resident bytes, kept in `[1, capacity]`
    /// once the ring is non-trivial.
    mem_cold_max: u64,
    capacity: u64,
    init_referenced: bool,
    /// Set by a test-ghost hit in `find`; the next insert goes hot.
    hit_on_test: bool,
}

impl ClockProCache {
    pub fn new(capacity: u64) -> Self {
        Self::with_params(capacity, false, 1.0)
    }

    /// `init_referenced` is the reference bit given to fresh cold pages;
    /// `init_ratio_cold` sets the starting cold budget as a fraction of
    /// the capacity. Both match the conventional defaults when called
    /// through [`new`](Self::new).
    pub fn with_params(capacity: u64, init_referenced: bool, init_ratio_cold: f64) -> Self {
        let mem_cold_max = ((capacity as f64) * init_ratio_cold) as u64;
        ClockProCache {
            store: ObjectStore::new(),
            hand_hot: None,
            hand_cold: None,
            hand_test: None,
            mem_hot: 0,
            mem_cold: 0,
            mem_cold_max: mem_cold_max.min(capacity),
            capacity,
            init_referenced,
            hit_on_test: false,
        }
    }

    pub fn cold_budget(&self) -> u64 {
        self.mem_cold_max
    }

    fn advance(&self, slot: SlotId) -> SlotId {
        self.store.get(slot).next.expect("ring is circular")
    }

    /// Links `slot` just behind the hot hand, the ring's tail position.
    fn ring_insert(&mut self, slot: SlotId) {
        match self.hand_hot {
            None => {
                let obj = self.store.get_mut(slot);
                obj.prev = Some(slot);
                obj.next = Some(slot);
                self.hand_hot = Some(slot);
                self.hand_cold = Some(slot);
                self.hand_test = Some(slot);
            }
            Some(head) => {
                let tail = self.store.get(head).prev.expect("ring is circular");
                self.store.get_mut(tail).next = Some(slot);
                self.store.get_mut(head).prev = Some(slot);
                let obj = self.store.get_mut(slot);
                obj.prev = Some(tail);
                obj.next = Some(head);
            }
        }
    }

    /// Unlinks `slot`, stepping any hand parked on it to its successor.
    fn ring_unlink(&mut self, slot: SlotId) {
        let next = self.store.get(slot).next.expect("ring is circular");
        if next == slot {
            self.hand_hot = None;
            self.hand_cold = None;
            self.hand_test = None;
        } else {
            let prev = self.store.get(slot).prev.expect("ring is circular");
            self.store.get_mut(prev).next = Some(next);
            self.store.get_mut(next).prev = Some(prev);
            for hand in [&mut self.hand_hot, &mut self.hand_cold, &mut self.hand_test] {
                if *hand == Some(slot) {
                    *hand = Some(next);
                }
            }
        }
        let obj = self.store.get_mut(slot);
        obj.prev = None;
        obj.next = None;
    }

    /// One hot-hand step: a referenced hot page keeps its place with the
    /// bit cleared, an unreferenced one falls back to cold.
    fn run_hot(&mut self) {
        let Some(hand) = self.hand_hot else { return };
        let obj = self.store.get(hand);
        if obj.meta.status != PageStatus::Hot {
            self.hand_hot = Some(self.advance(hand));
            return;
        }
        let size = u64::from(obj.size);
        let next = self.advance(hand);
        let meta = &mut self.store.get_mut(hand).meta;
        if meta.referenced {
            meta.referenced = false;
        } else {
            meta.status = PageStatus::Cold;
            self.mem_hot -= size;
            self.mem_cold += size;
        }
        self.hand_hot = Some(next);
    }

    /// One test-hand step: drops the oldest test ghost it can find and
    /// shrinks the cold budget by its size.
    fn run_test(&mut self) {
        let Some(hand) = self.hand_test else { return };
        let obj = self.store.get(hand);
        if obj.meta.status != PageStatus::Test {
            self.hand_test = Some(self.advance(hand));
            return;
        }
        let size = u64::from(obj.size);
        self.ring_unlink(hand);
        self.store.remove(hand);
        self.mem_cold_max = self.mem_cold_max.saturating_sub(size).max(1);
    }

    fn trim_test(&mut self) {
        let mut budget = 2 * self.store.tracked() + 1;
        while self.store.ghost_bytes() > self.capacity && budget > 0 {
            self.run_test();
            budget -= 1;
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.store.debug_validate_accounting();
        assert_eq!(
            self.mem_hot + self.mem_cold,
            self.store.occupied_bytes(),
            "hot/cold totals disagree with resident accounting"
        );
        assert_eq!(self.hand_hot.is_some(), self.store.tracked() > 0);
        let Some(start) = self.hand_hot else { return };
        let (mut hot, mut cold, mut test) = (0u64, 0u64, 0u64);
        let mut seen = 0usize;
        let mut cursor = start;
        loop {
            let obj = self.store.get(cursor);
            match obj.meta.status {
                PageStatus::Hot => hot += u64::from(obj.size),
                PageStatus::Cold => cold += u64::from(obj.size),
                PageStatus::Test => test += u64::from(obj.size),
            }
            seen += 1;
            assert!(seen <= self.store.tracked(), "ring walk escaped the store");
            cursor = obj.next.expect("ring is circular");
            if cursor == start {
                break;
            }
        }
        assert_eq!(seen, self.store.tracked(), "ring misses tracked records");
        assert_eq!(hot, self.mem_hot);
        assert_eq!(cold, self.mem_cold);
        assert_eq!(test, self.store.ghost_bytes());
    }
}

impl CachePolicy for ClockProCache {
    fn name(&self) -> &'static str {
        "clockpro"
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
        if update {
            self.hit_on_test = false;
        }
        let Some(slot) = self.store.lookup(req.id) else {
            return false;
        };
        let obj = self.store.get(slot);
        match obj.meta.status {
            PageStatus::Hot | PageStatus::Cold => {
                if !update {
                    return true;
                }
                if obj.is_expired(req.time) {
                    let size = u64::from(obj.size);
                    match obj.meta.status {
                        PageStatus::Hot => self.mem_hot -= size,
                        PageStatus::Cold => self.mem_cold -= size,
                        PageStatus::Test => unreachable!(),
                    }
                    self.ring_unlink(slot);
                    self.store.remove(slot);
                    return false;
                }
                self.store.get_mut(slot).meta.referenced = true;
                true
            }
            PageStatus::Test => {
                if !update {
                    return false;
                }
                // The ghost proves the cold section evicted too eagerly.
                let size = u64::from(obj.size);
                self.mem_cold_max = (self.mem_cold_max + size).min(self.capacity);
                self.ring_unlink(slot);
                self.store.remove(slot);
                self.hit_on_test = true;
                false
            }
        }
    }

    fn can_insert(&self, req: &Request) -> bool {
        let size = u64::from(req.size);
        if size > self.capacity {
            return false;
        }
        // A test-ghost hit is admitted as hot and bypasses the cold
        // budget backpressure.
        self.hit_on_test || self.mem_cold + size <= self.mem_cold_max
    }

    fn insert(&mut self, req: &Request) {
        let size = u64::from(req.size);
        if self.hit_on_test {
            self.hit_on_test = false;
            // Demote hot pages until the promoted page fits the hot
            // section.
            let limit = self.capacity.saturating_sub(self.mem_cold_max);
            let mut budget = 2 * self.store.tracked() + 1;
            while self.mem_hot + size > limit && self.mem_hot > 0 && budget > 0 {
                self.run_hot();
                budget -= 1;
            }
            let slot = self.store.insert(
                req.id,
                req.size,
                req.expire_time(),
                ClockProMeta {
                    status: PageStatus::Hot,
                    referenced: false,
                },
            );
            self.ring_insert(slot);
            self.mem_hot += size;
        } else {
            let slot = self.store.insert(
                req.id,
                req.size,
                req.expire_time(),
                ClockProMeta {
                    status: PageStatus::Cold,
                    referenced: self.init_referenced,
                },
            );
            self.ring_insert(slot);
            self.mem_cold += size;
        }
    }

    fn evict(&mut self, _req: &Request) {
        if self.store.object_count() == 0 {
            return;
        }
        let mut budget = 2 * self.store.tracked() + 1;
        while budget > 0 {
            budget -= 1;
            let Some(hand) = self.hand_cold else { return };
            let obj = self.store.get(hand);
            if obj.meta.status != PageStatus::Cold {
                self.hand_cold = Some(self.advance(hand));
                continue;
            }
            let size = u64::from(obj.size);
            if obj.meta.referenced {
                // Demotion avoidance: promote in place, free nothing.
                let next = self.advance(hand);
                let meta = &mut self.store.get_mut(hand).meta;
                meta.referenced = false;
                meta.status = PageStatus::Hot;
                self.mem_cold -= size;
                self.mem_hot += size;
                self.hand_cold = Some(next);
                return;
            }
            // The victim stays in the ring as a test ghost.
            self.hand_cold = Some(self.advance(hand));
            self.store.demote_to_ghost(hand);
            self.store.get_mut(hand).meta = ClockProMeta {
                status: PageStatus::Test,
                referenced: false,
            };
            self.mem_cold -= size;
            if self.store.ghost_bytes() > self.capacity {
                self.trim_test();
            }
            return;
        }
        // A full sweep found no cold page; make one and let the caller
        // retry.
        self.run_hot();
    }

    /// ClockPro drives the cold hand from two pressures, capacity and
    /// the cold byte budget, so its composition differs from the shared
    /// one: cold-budget overflow evicts instead of rejecting. Only a
    /// page that can never fit the cold section is turned away.
    fn get(&mut self, req: &Request) -> bool {
        if self.find(req, true) {
            return true;
        }
        let size = u64::from(req.size);
        if size > self.capacity {
            return false;
        }
        if !self.hit_on_test && size > self.mem_cold_max {
            return false;
        }
        while self.occupied_bytes() + size > self.capacity
            || (!self.hit_on_test && self.mem_cold + size > self.mem_cold_max)
        {
            if self.object_count() == 0 {
                return false;
            }
            self.evict(req);
        }
        self.insert(req);
        false
    }

    fn to_evict(&self, _req: &Request) -> Option<ObjId> {
        panic!("clockpro: victim selection is not separable from the hand sweep");
    }

    fn remove(&mut self, id: ObjId) -> bool {
        let Some(slot) = self.store.lookup(id) else {
            return false;
        };
        let obj = self.store.get(slot);
        let size = u64::from(obj.size);
        match obj.meta.status {
            PageStatus::Hot => self.mem_hot -= size,
            PageStatus::Cold => self.mem_cold -= size,
            PageStatus::Test => {}
        }
        self.ring_unlink(slot);
        self.store.remove(slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: ObjId, size: u32) -> Request {
        Request::new(id, size)
    }

    #[test]
    fn single_object_ring_is_self_referential() {
        let mut cache = ClockProCache::new(10);
        assert!(!cache.get(&req(1, 10)));
        let slot = cache.store.lookup(1).unwrap();
        assert_eq!(cache.store.get(slot).next, Some(slot));
        assert_eq!(cache.store.get(slot).prev, Some(slot));
        assert!(cache.get(&req(1, 10)));
        cache.debug_validate();
    }

    #[test]
    fn capacity_one_object_churn() {
        let mut cache = ClockProCache::new(10);
        for id in 0..20u64 {
            assert!(!cache.get(&req(id, 10)));
            assert!(cache.occupied_bytes() <= 10);
        }
        cache.debug_validate();
    }

    #[test]
    fn cold_eviction_leaves_test_ghost() {
        let mut cache = ClockProCache::new(3);
        for id in [1, 2, 3] {
            cache.get(&req(id, 1));
        }
        cache.get(&req(4, 1));
        assert_eq!(cache.object_count(), 3);
        assert_eq!(cache.store.ghost_count(), 1);
        cache.debug_validate();
    }

    #[test]
    fn test_ghost_hit_promotes_to_hot_and_grows_budget() {
        let mut cache = ClockProCache::with_params(4, false, 0.5);
        for id in [1, 2, 3] {
            cache.get(&req(id, 1));
        }
        // Cold-budget pressure pushed 1 out into a test ghost.
        assert!(cache.store.ghost_count() > 0);
        let budget_before = cache.cold_budget();
        assert!(!cache.get(&req(1, 1)));
        assert!(cache.cold_budget() >= budget_before);
        let slot = cache.store.lookup(1).unwrap();
        assert_eq!(cache.store.get(slot).meta.status, PageStatus::Hot);
        cache.debug_validate();
    }

    #[test]
    fn referenced_cold_page_survives_one_sweep() {
        let mut cache = ClockProCache::new(3);
        for id in [1, 2, 3] {
            cache.get(&req(id, 1));
        }
        assert!(cache.get(&req(1, 1)));
        cache.get(&req(4, 1));
        // 1 was referenced, so the cold hand promoted it and evicted 2.
        assert!(cache.find(&req(1, 1), false));
        assert!(!cache.find(&req(2, 1), false) || !cache.find(&req(3, 1), false));
        cache.debug_validate();
    }

    #[test]
    fn ghost_bytes_stay_bounded() {
        let mut cache = ClockProCache::new(16);
        for id in 0..400u64 {
            cache.get(&req(id, 1));
            assert!(cache.store.ghost_bytes() <= cache.capacity());
        }
        cache.debug_validate();
    }

    #[test]
    fn remove_handles_every_page_kind() {
        let mut cache = ClockProCache::new(3);
        for id in [1, 2, 3, 4] {
            cache.get(&req(id, 1));
        }
        assert!(cache.store.ghost_count() > 0);
        let ghost = cache.hand_test.map(|_| {
            let mut cursor = cache.hand_test.unwrap();
            loop {
                let obj = cache.store.get(cursor);
                if obj.meta.status == PageStatus::Test {
                    break obj.id;
                }
                cursor = obj.next.unwrap();
            }
        });
        assert!(cache.remove(ghost.unwrap()));
        assert!(cache.remove(4));
        assert!(!cache.remove(99));
        cache.debug_validate();
    }

    #[test]
    fn expired_page_is_a_miss() {
        let mut cache = ClockProCache::new(10);
        cache.get(&Request::new(1, 2).at(0).with_ttl(3));
        assert!(cache.get(&Request::new(1, 2).at(2)));
        assert!(!cache.get(&Request::new(1, 2).at(3)));
        cache.debug_validate();
    }
}
