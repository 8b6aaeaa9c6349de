//! cachesim: trace-driven cache eviction simulation.
//!
//! Byte-denominated eviction policies (FIFO, LRU, CAR, ClockPro,
//! S3-FIFO) behind one [`policy::CachePolicy`] trait, plus a replay
//! driver that turns request traces into miss-ratio curves.

pub mod ds;
pub mod error;
pub mod params;
pub mod policy;
pub mod request;
pub mod sim;
pub mod stats;
pub mod store;

pub mod prelude;
