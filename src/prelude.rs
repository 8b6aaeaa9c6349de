//! Flat re-exports of the public surface: `use cachesim::prelude::*;`.

pub use crate::ds::{GhostFifo, Queue, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::params::{build_policy, CarParams, ClockProParams, PolicyConfig, S3FifoParams};
pub use crate::policy::car::CarCache;
pub use crate::policy::clock_pro::ClockProCache;
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::s3_fifo::S3FifoCache;
pub use crate::policy::CachePolicy;
pub use crate::request::{ObjId, Request, SyntheticTrace, TraceSource};
pub use crate::sim::{simulate, simulate_slice, sweep, sweep_parallel, SweepPoint};
pub use crate::stats::Stats;
pub use crate::store::{CacheObject, ObjectStore};
