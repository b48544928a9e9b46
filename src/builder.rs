//! Builders for caches and rate limiters.
//!
//! Builders collect settings and validate them all at once in `try_build`,
//! so a bad value is reported as a [`ConfigError`] rather than a panic.
//!
//! ## Example
//!
//! ```rust
//! use limitkit::builder::{CacheBuilder, RateLimiterBuilder};
//! use limitkit::limiter::ManualClock;
//! use std::time::Duration;
//!
//! let mut cache = CacheBuilder::new(100).try_build::<u64, String>().unwrap();
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some(&"hello".to_string()));
//!
//! let clock = ManualClock::new();
//! let limiter = RateLimiterBuilder::new(5)
//!     .refill_every(2, Duration::from_secs(1))
//!     .clock(clock.clone())
//!     .try_build::<String>()
//!     .unwrap();
//! assert!(limiter.allow_request("user-123"));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::error::ConfigError;
use crate::limiter::clock::{Clock, MonotonicClock};
use crate::limiter::keyed::KeyedRateLimiter;
use crate::limiter::token_bucket::RefillRate;
#[cfg(feature = "concurrency")]
use crate::policy::lru::ConcurrentLruCache;
use crate::policy::lru::LruCache;

/// Builder for [`LruCache`] and [`ConcurrentLruCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity is zero.
    pub fn try_build<K, V>(self) -> Result<LruCache<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        LruCache::try_new(self.capacity)
    }

    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn build<K, V>(self) -> LruCache<K, V>
    where
        K: Clone + Eq + Hash,
    {
        LruCache::new(self.capacity)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity is zero.
    #[cfg(feature = "concurrency")]
    pub fn try_build_concurrent<K, V>(self) -> Result<ConcurrentLruCache<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        ConcurrentLruCache::try_new(self.capacity)
    }
}

/// Builder for [`KeyedRateLimiter`].
///
/// Defaults: refills one full bucket per second on a [`MonotonicClock`].
#[derive(Debug, Clone)]
pub struct RateLimiterBuilder<C = MonotonicClock> {
    capacity: u64,
    refill_tokens: Option<u64>,
    refill_period: Duration,
    clock: C,
}

impl RateLimiterBuilder<MonotonicClock> {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            refill_tokens: None,
            refill_period: Duration::from_secs(1),
            clock: MonotonicClock::new(),
        }
    }
}

impl<C> RateLimiterBuilder<C>
where
    C: Clock + Clone,
{
    pub fn refill(mut self, rate: RefillRate) -> Self {
        self.refill_tokens = Some(rate.tokens());
        self.refill_period = rate.period();
        self
    }

    /// Unvalidated form of [`refill`](Self::refill); checked by `try_build`.
    pub fn refill_every(mut self, tokens: u64, period: Duration) -> Self {
        self.refill_tokens = Some(tokens);
        self.refill_period = period;
        self
    }

    pub fn refill_per_second(self, tokens: u64) -> Self {
        self.refill_every(tokens, Duration::from_secs(1))
    }

    /// Replaces the time source.
    pub fn clock<D: Clock + Clone>(self, clock: D) -> RateLimiterBuilder<D> {
        RateLimiterBuilder {
            capacity: self.capacity,
            refill_tokens: self.refill_tokens,
            refill_period: self.refill_period,
            clock,
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero capacity, refill amount or period.
    pub fn try_build<K>(self) -> Result<KeyedRateLimiter<K, C>, ConfigError>
    where
        K: Eq + Hash,
    {
        if self.capacity == 0 {
            return Err(ConfigError::non_positive("capacity"));
        }
        let tokens = self.refill_tokens.unwrap_or(self.capacity);
        let rate = RefillRate::new(tokens, self.refill_period)?;
        KeyedRateLimiter::with_clock(self.capacity, rate, self.clock)
    }
}
