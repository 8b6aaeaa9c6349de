//! Error types for the simulator.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when a policy configuration is invalid
//!   (zero capacity, out-of-range ratios, unknown parameter keys).
//! - [`InvariantError`]: Returned when internal data-structure invariants
//!   are violated (the store's `check_accounting` walk).
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::s3_fifo::S3FifoCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache = S3FifoCache::try_with_ratios(1000, 0.1, 0.9, 2);
//! assert!(cache.is_ok());
//!
//! // Invalid ratio is caught without panicking
//! let bad = S3FifoCache::try_with_ratios(1000, 2.0, 0.9, 2);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors and by [`PolicyConfig::parse`]
/// (unknown keys, malformed values, inconsistent ratios). Carries a
/// human-readable description of which parameter failed validation.
///
/// [`PolicyConfig::parse`]: crate::params::PolicyConfig::parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`ObjectStore::check_accounting`](crate::store::ObjectStore::check_accounting).
/// An `InvariantError` always indicates a programming error in the
/// simulator, never bad user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
        assert_eq!(err.message(), "capacity must be > 0");
    }

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("queue byte total mismatch");
        assert_eq!(err.to_string(), "queue byte total mismatch");
    }

    #[test]
    fn errors_clone_and_eq() {
        let a = ConfigError::new("x");
        assert_eq!(a.clone(), a);
        let b = InvariantError::new("y");
        assert_eq!(b.clone(), b);
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
        assert_error::<InvariantError>();
    }
}
