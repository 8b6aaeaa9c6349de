//! Data-structure building blocks shared by the eviction policies.

pub mod ghost_fifo;
pub mod queue;
pub mod slot_arena;

pub use ghost_fifo::GhostFifo;
pub use queue::Queue;
pub use slot_arena::{SlotArena, SlotId};
