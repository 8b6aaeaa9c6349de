//! CAR: Clock with Adaptive Replacement.
//!
//! Two CLOCK lists hold resident objects: `T1` for recency (objects
//! seen once since they last left the cache) and `T2` for frequency.
//! Two ghost lists `B1`/`B2` remember recently evicted ids at zero data
//! cost. A byte-denominated target `p` splits the capacity between the
//! two clocks and adapts on ghost hits: a `B1` hit means recency is
//! underserved and grows `p`, a `B2` hit shrinks it.
//!
//! Hits only set a reference bit; list membership changes happen during
//! the eviction sweep, which second-chances referenced heads (T1 heads
//! migrate to T2, T2 heads rotate) until it finds an unreferenced head
//! to demote into the matching ghost list.

use crate::ds::Queue;
use crate::policy::CachePolicy;
use crate::request::{ObjId, Request};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CarList {
    T1,
    T2,
    B1,
    B2,
}

#[derive(Debug, Clone, Copy)]
struct CarMeta {
    list: CarList,
    referenced: bool,
}

#[derive(Debug)]
pub struct CarCache {
    store: ObjectStore<CarMeta>,
    t1: Queue,
    t2: Queue,
    b1: Queue,
    b2: Queue,
    /// Byte target for T1, clamped to `[0, capacity]`.
    p: u64,
    capacity: u64,
    /// Set by a ghost hit in `find`; makes the next insert land in T2.
    ghost_hit: bool,
}

impl CarCache {
    pub fn new(capacity: u64) -> Self {
        Self::with_initial_target(capacity, 0)
    }

    /// Starts the recency target `p` at `target` bytes instead of 0.
    /// `target` is clamped to the capacity.
    pub fn with_initial_target(capacity: u64, target: u64) -> Self {
        CarCache {
            store: ObjectStore::new(),
            t1: Queue::new(),
            t2: Queue::new(),
            b1: Queue::new(),
            b2: Queue::new(),
            p: target.min(capacity),
            capacity,
            ghost_hit: false,
        }
    }

    /// Current byte target for the recency clock.
    pub fn recency_target(&self) -> u64 {
        self.p
    }

    fn drop_ghost_front(&mut self, list: CarList) {
        debug_assert!(matches!(list, CarList::B1 | CarList::B2));
        if let Some(slot) = match list {
            CarList::B1 => self.b1.pop_front(&mut self.store),
            CarList::B2 => self.b2.pop_front(&mut self.store),
            _ => None,
        } {
            self.store.remove(slot);
        }
    }

    /// History trimming, run at the start of a plain miss (before any
    /// demotion). Ghosts created while serving a miss therefore survive
    /// at least until the next miss, so an immediate re-request can
    /// still hit them and adapt `p`.
    fn trim_ghosts(&mut self) {
        while self.t1.bytes() + self.b1.bytes() >= self.capacity && !self.b1.is_empty() {
            self.drop_ghost_front(CarList::B1);
        }
        while self.store.occupied_bytes() + self.store.ghost_bytes() >= 2 * self.capacity {
            if !self.b2.is_empty() {
                self.drop_ghost_front(CarList::B2);
            } else if !self.b1.is_empty() {
                self.drop_ghost_front(CarList::B1);
            } else {
                break;
            }
        }
    }

    /// Moves the head of `from` into the ghost list that shadows it.
    fn demote_head(&mut self, from: CarList) {
        let (slot, ghost) = match from {
            CarList::T1 => (self.t1.pop_front(&mut self.store), CarList::B1),
            CarList::T2 => (self.t2.pop_front(&mut self.store), CarList::B2),
            _ => unreachable!("only data lists are demoted"),
        };
        let Some(slot) = slot else { return };
        self.store.demote_to_ghost(slot);
        self.store.get_mut(slot).meta = CarMeta {
            list: ghost,
            referenced: false,
        };
        match ghost {
            CarList::B1 => self.b1.push_back(&mut self.store, slot),
            CarList::B2 => self.b2.push_back(&mut self.store, slot),
            _ => unreachable!(),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self) {
        self.t1.debug_validate(&self.store);
        self.t2.debug_validate(&self.store);
        self.b1.debug_validate(&self.store);
        self.b2.debug_validate(&self.store);
        self.store.debug_validate_accounting();
        assert!(self.p <= self.capacity, "target p out of range");
        assert_eq!(
            self.t1.bytes() + self.t2.bytes(),
            self.store.occupied_bytes(),
            "data clocks disagree with resident accounting"
        );
        assert_eq!(
            self.b1.bytes() + self.b2.bytes(),
            self.store.ghost_bytes(),
            "ghost lists disagree with ghost accounting"
        );
        assert_eq!(
            self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len(),
            self.store.tracked(),
            "every tracked record belongs to exactly one list"
        );
    }
}

impl CachePolicy for CarCache {
    fn name(&self) -> &'static str {
        "car"
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
            self.ghost_hit = false;
        }
        let Some(slot) = self.store.lookup(req.id) else {
            if update {
                self.trim_ghosts();
            }
            return false;
        };
        let list = self.store.get(slot).meta.list;
        match list {
            CarList::T1 | CarList::T2 => {
                if !update {
                    return true;
                }
                if self.store.get(slot).is_expired(req.time) {
                    match list {
                        CarList::T1 => self.t1.unlink(&mut self.store, slot),
                        CarList::T2 => self.t2.unlink(&mut self.store, slot),
                        _ => unreachable!(),
                    }
                    self.store.remove(slot);
                    return false;
                }
                self.store.get_mut(slot).meta.referenced = true;
                true
            }
            CarList::B1 => {
                if !update {
                    return false;
                }
                // Recency ghosts hitting means T1 deserves more bytes.
                let delta = if self.b1.bytes() == 0 {
                    1
                } else {
                    (self.b2.bytes() / self.b1.bytes()).max(1)
                };
                self.p = (self.p + delta).min(self.capacity);
                self.b1.unlink(&mut self.store, slot);
                self.store.remove(slot);
                self.ghost_hit = true;
                false
            }
            CarList::B2 => {
                if !update {
                    return false;
                }
                let delta = if self.b2.bytes() == 0 {
                    1
                } else {
                    (self.b1.bytes() / self.b2.bytes()).max(1)
                };
                self.p = self.p.saturating_sub(delta);
                self.b2.unlink(&mut self.store, slot);
                self.store.remove(slot);
                self.ghost_hit = true;
                false
            }
        }
    }

    fn insert(&mut self, req: &Request) {
        let list = if self.ghost_hit {
            self.ghost_hit = false;
            CarList::T2
        } else {
            CarList::T1
        };
        let slot = self.store.insert(
            req.id,
            req.size,
            req.expire_time(),
            CarMeta {
                list,
                referenced: false,
            },
        );
        match list {
            CarList::T1 => self.t1.push_back(&mut self.store, slot),
            CarList::T2 => self.t2.push_back(&mut self.store, slot),
            _ => unreachable!(),
        }
    }

    fn evict(&mut self, _req: &Request) {
        // Each resident is visited at most twice: once to second-chance
        // it, once more after its reference bit has been cleared.
        let budget = 2 * self.store.object_count() + 1;
        for _ in 0..budget {
            let from_t1 = if self.t1.is_empty() {
                if self.t2.is_empty() {
                    return;
                }
                false
            } else if self.t2.is_empty() {
                true
            } else {
                self.t1.bytes() >= self.p.max(1)
            };
            if from_t1 {
                let head = self.t1.head().expect("t1 checked non-empty");
                if self.store.get(head).meta.referenced {
                    // Second chance: referenced T1 heads graduate to T2.
                    self.t1.unlink(&mut self.store, head);
                    let meta = &mut self.store.get_mut(head).meta;
                    meta.referenced = false;
                    meta.list = CarList::T2;
                    self.t2.push_back(&mut self.store, head);
                } else {
                    self.demote_head(CarList::T1);
                    return;
                }
            } else {
                let head = self.t2.head().expect("t2 checked non-empty");
                if self.store.get(head).meta.referenced {
                    self.store.get_mut(head).meta.referenced = false;
                    self.t2.move_to_back(&mut self.store, head);
                } else {
                    self.demote_head(CarList::T2);
                    return;
                }
            }
        }
    }

    fn to_evict(&self, _req: &Request) -> Option<ObjId> {
        panic!("car: victim selection is not separable from the eviction sweep");
    }

    fn remove(&mut self, id: ObjId) -> bool {
        let Some(slot) = self.store.lookup(id) else {
            return false;
        };
        let list = self.store.get(slot).meta.list;
        match list {
            CarList::T1 => self.t1.unlink(&mut self.store, slot),
            CarList::T2 => self.t2.unlink(&mut self.store, slot),
            CarList::B1 => self.b1.unlink(&mut self.store, slot),
            CarList::B2 => self.b2.unlink(&mut self.store, slot),
        }
        self.store.remove(slot);
        true
    }
}
