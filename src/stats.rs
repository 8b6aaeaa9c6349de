//! Hit/miss accounting for a simulation run.

use std::fmt;

use crate::request::Request;

/// Counters accumulated over one replay of a trace through one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Stats {
    /// Number of requests processed.
    pub n_req: u64,
    /// Number of requests that missed.
    pub n_miss: u64,
    /// Total bytes requested.
    pub n_req_byte: u64,
    /// Total bytes missed.
    pub n_miss_byte: u64,
}

impl Stats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one `get`.
    #[inline]
    pub fn record(&mut self, req: &Request, hit: bool) {
        self.n_req += 1;
        self.n_req_byte += u64::from(req.size);
        if !hit {
            self.n_miss += 1;
            self.n_miss_byte += u64::from(req.size);
        }
    }

    /// Object miss ratio: `n_miss / n_req`. Zero when no requests ran.
    pub fn miss_ratio(&self) -> f64 {
        if self.n_req == 0 {
            0.0
        } else {
            self.n_miss as f64 / self.n_req as f64
        }
    }

    /// Byte miss ratio: `n_miss_byte / n_req_byte`.
    pub fn byte_miss_ratio(&self) -> f64 {
        if self.n_req_byte == 0 {
            0.0
        } else {
            self.n_miss_byte as f64 / self.n_req_byte as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} req, {} miss ({:.4} miss ratio, {:.4} byte miss ratio)",
            self.n_req,
            self.n_miss,
            self.miss_ratio(),
            self.byte_miss_ratio()
        )
    }
}
