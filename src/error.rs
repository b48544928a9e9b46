//! Error types for limitkit.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: a constructor argument was rejected (zero capacity, zero
//!   refill rate, zero refill period). Construction fails before anything is
//!   allocated, so no half-built cache or limiter is ever observable.
//! - [`InvariantError`]: a structural check (`check_invariants`) found the
//!   index and recency list out of step.
//!
//! Lookups that miss are not errors: they return `None`.
//!
//! ## Example Usage
//!
//! ```
//! use limitkit::error::ConfigError;
//! use limitkit::policy::lru::LruCache;
//!
//! let cache: Result<LruCache<u64, String>, ConfigError> = LruCache::try_new(16);
//! assert!(cache.is_ok());
//!
//! let err = LruCache::<u64, String>::try_new(0).unwrap_err();
//! assert_eq!(err.parameter(), "capacity");
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when a constructor argument is invalid.
///
/// Carries the name of the offending parameter and a human-readable reason.
///
/// # Example
///
/// ```
/// use limitkit::limiter::KeyedRateLimiter;
///
/// let err = KeyedRateLimiter::<String>::new(5, 0).unwrap_err();
/// assert_eq!(err.parameter(), "refill_rate");
/// assert!(err.to_string().contains("refill_rate"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    parameter: &'static str,
    reason: String,
}

impl ConfigError {
    /// Creates a new `ConfigError` for `parameter`.
    #[inline]
    pub fn new(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            parameter,
            reason: reason.into(),
        }
    }

    /// Shorthand for the "must be greater than zero" case shared by every
    /// constructor in the crate.
    #[inline]
    pub(crate) fn non_positive(parameter: &'static str) -> Self {
        Self::new(parameter, "must be greater than zero")
    }

    /// Name of the rejected parameter.
    #[inline]
    pub fn parameter(&self) -> &'static str {
        self.parameter
    }

    /// Why the parameter was rejected.
    #[inline]
    pub fn message(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument `{}`: {}", self.parameter, self.reason)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when an internal structure is found to be inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

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
