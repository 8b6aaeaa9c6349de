//! Trace requests and request sources.
//!
//! A trace is a finite, ordered, replayable sequence of [`Request`]s.
//! Parsing on-disk trace formats is out of scope here; anything that
//! implements [`TraceSource`] (an iterator with `reset`) can drive a
//! simulation. [`SyntheticTrace`] is the in-memory source used by the
//! tests and benches.

/// Object identifier within a trace.
pub type ObjId = u64;

/// One trace event: an access to `id` with a fixed byte size.
///
/// `time` is a logical clock supplied by the trace (seconds, request
/// index; the simulator only compares it against TTL deadlines).
/// Requests are immutable; the cache never takes ownership of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Logical timestamp of the access.
    pub time: u64,
    /// Object identifier.
    pub id: ObjId,
    /// Object size in bytes, frozen at insertion time for accounting.
    pub size: u32,
    /// Optional time-to-live, relative to `time`.
    pub ttl: Option<u64>,
}

impl Request {
    /// Creates a request with no timestamp and no TTL.
    #[inline]
    pub fn new(id: ObjId, size: u32) -> Self {
        Self {
            time: 0,
            id,
            size,
            ttl: None,
        }
    }

    /// Sets the logical timestamp.
    #[inline]
    pub fn at(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Sets the time-to-live.
    #[inline]
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Absolute expiry deadline for an object inserted by this request.
    #[inline]
    pub fn expire_time(&self) -> Option<u64> {
        self.ttl.map(|ttl| self.time.saturating_add(ttl))
    }
}

/// A replayable request source.
///
/// `reset` rewinds to the first request so the same trace can drive
/// several cache configurations in turn.
pub trait TraceSource: Iterator<Item = Request> {
    /// Rewinds the source to its first request.
    fn reset(&mut self);
}

/// In-memory trace backed by a `Vec<Request>`.
///
/// # Example
///
/// ```
/// use cachesim::request::{Request, SyntheticTrace, TraceSource};
///
/// let mut trace = SyntheticTrace::from_requests(vec![
///     Request::new(1, 100),
///     Request::new(2, 200),
/// ]);
/// assert_eq!(trace.by_ref().count(), 2);
/// trace.reset();
/// assert_eq!(trace.next().map(|r| r.id), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticTrace {
    requests: Vec<Request>,
    pos: usize,
}

impl SyntheticTrace {
    /// Wraps an existing request vector.
    pub fn from_requests(requests: Vec<Request>) -> Self {
        Self { requests, pos: 0 }
    }

    /// Builds a trace of unit-time requests from `(id, size)` pairs.
    pub fn from_pairs(pairs: &[(ObjId, u32)]) -> Self {
        let requests = pairs
            .iter()
            .enumerate()
            .map(|(i, &(id, size))| Request::new(id, size).at(i as u64))
            .collect();
        Self { requests, pos: 0 }
    }

    /// Returns the underlying request slice.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Returns the number of requests in the trace.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` if the trace holds no requests.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Iterator for SyntheticTrace {
    type Item = Request;

    fn next(&mut self) -> Option<Request> {
        let req = self.requests.get(self.pos).copied()?;
        self.pos += 1;
        Some(req)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.requests.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl TraceSource for SyntheticTrace {
    fn reset(&mut self) {
        self.pos = 0;
    }
}
