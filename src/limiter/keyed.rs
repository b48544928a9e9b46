//! # Keyed rate limiter
//!
//! Gives every key its own [`TokenBucket`], created on the key's first
//! request with the limiter's fixed configuration.
//!
//! ```text
//!   allow_request("alice")
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ DashMap<K, Arc<TokenBucket<C>>>              │
//!   │   shard lock: get, or entry().or_insert_with │
//!   └──────────────────────┬───────────────────────┘
//!                          │ Arc::clone, shard lock released
//!                          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ TokenBucket (own Mutex): refill + consume    │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! - Concurrent first requests for the same key converge on one bucket:
//!   insert-if-absent is atomic within a `DashMap` shard.
//! - A shard lock is never held while a bucket lock is taken, so requests for
//!   different keys only contend when they hash to the same shard, and then
//!   only for the lookup.
//! - Buckets are never expired. [`remove`](KeyedRateLimiter::remove) and
//!   [`clear`](KeyedRateLimiter::clear) are the host's tools for bounding the
//!   key set.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::ConfigError;
use crate::limiter::clock::{Clock, MonotonicClock};
use crate::limiter::token_bucket::{RefillRate, TokenBucket};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LimiterMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::LimiterMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{LimiterMetricsRecorder, MetricsSnapshotProvider};
use crate::traits::RateLimiter;

/// Settings shared by every bucket of a [`KeyedRateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub capacity: u64,
    pub refill: RefillRate,
}

/// Per-key token-bucket rate limiter.
///
/// # Example
///
/// ```
/// use limitkit::limiter::KeyedRateLimiter;
///
/// // bursts of 5, refilling 2 per second
/// let limiter = KeyedRateLimiter::<String>::new(5, 2).unwrap();
///
/// let admitted = (0..7).filter(|_| limiter.allow_request("user-123")).count();
/// assert_eq!(admitted, 5);
///
/// // other keys are unaffected
/// assert!(limiter.allow_request("user-456"));
/// assert_eq!(limiter.len(), 2);
/// ```
pub struct KeyedRateLimiter<K, C = MonotonicClock> {
    buckets: DashMap<K, Arc<TokenBucket<C>>>,
    config: LimiterConfig,
    clock: C,
    #[cfg(feature = "metrics")]
    metrics: LimiterMetrics,
}

impl<K> KeyedRateLimiter<K, MonotonicClock>
where
    K: Eq + Hash,
{
    /// Buckets of `capacity` tokens, each regaining `refill_per_second`
    /// tokens per second.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either argument is zero.
    pub fn new(capacity: u64, refill_per_second: u64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::non_positive("capacity"));
        }
        let refill = RefillRate::per_second(refill_per_second)?;
        Self::with_clock(capacity, refill, MonotonicClock::new())
    }
}

impl<K, C> KeyedRateLimiter<K, C>
where
    K: Eq + Hash,
    C: Clock + Clone,
{
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero.
    pub fn with_clock(capacity: u64, refill: RefillRate, clock: C) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::non_positive("capacity"));
        }
        Ok(Self {
            buckets: DashMap::new(),
            config: LimiterConfig { capacity, refill },
            clock,
            #[cfg(feature = "metrics")]
            metrics: LimiterMetrics::default(),
        })
    }

    /// Spends one token from `key`'s bucket, creating the bucket on first use.
    ///
    /// Returns `false` when the bucket is empty; nothing is consumed then.
    pub fn allow_request<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let bucket = self.bucket_for(key);
        let allowed = bucket.try_consume();

        #[cfg(feature = "metrics")]
        if allowed {
            self.metrics.record_allowed();
        } else {
            self.metrics.record_denied();
        }

        if !allowed {
            debug!(
                capacity = self.config.capacity,
                refill_tokens = self.config.refill.tokens(),
                "request rate limited"
            );
        }
        allowed
    }

    fn bucket_for<Q>(&self, key: &Q) -> Arc<TokenBucket<C>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let existing = self.buckets.get(key).map(|b| Arc::clone(b.value()));
        if let Some(bucket) = existing {
            return bucket;
        }

        let mut created = false;
        let bucket = {
            let entry = self.buckets.entry(key.to_owned()).or_insert_with(|| {
                created = true;
                Arc::new(TokenBucket::from_parts(
                    self.config.capacity,
                    self.config.refill,
                    self.clock.clone(),
                ))
            });
            Arc::clone(entry.value())
        };

        if created {
            #[cfg(feature = "metrics")]
            self.metrics.record_bucket_created();

            debug!(
                capacity = self.config.capacity,
                live_buckets = self.buckets.len(),
                "created token bucket"
            );
        }
        bucket
    }

    /// Tokens `key` could spend right now. Unseen keys report a full bucket
    /// and no bucket is created for them.
    pub fn available_tokens<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.buckets.get(key).map(|b| Arc::clone(b.value()));
        match bucket {
            Some(bucket) => bucket.available_tokens(),
            None => self.config.capacity,
        }
    }

    /// Returns `true` if `key` has a bucket. Does not create one.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.contains_key(key)
    }

    /// Drops `key`'s bucket. Its next request starts from a full bucket.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.remove(key).is_some()
    }

    /// Number of keys with a bucket.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if no key has a bucket yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drops every bucket.
    pub fn clear(&self) {
        self.buckets.clear();
    }

    /// Returns the settings every bucket is created with.
    pub fn config(&self) -> LimiterConfig {
        self.config
    }
}

#[cfg(feature = "metrics")]
impl<K, C> KeyedRateLimiter<K, C>
where
    K: Eq + Hash,
    C: Clock + Clone,
{
    /// Returns the admission counters and the current bucket count.
    pub fn metrics_snapshot(&self) -> LimiterMetricsSnapshot {
        LimiterMetricsSnapshot {
            allowed: self.metrics.allowed.get(),
            denied: self.metrics.denied.get(),
            buckets_created: self.metrics.buckets_created.get(),
            live_buckets: self.buckets.len(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, C> MetricsSnapshotProvider<LimiterMetricsSnapshot> for KeyedRateLimiter<K, C>
where
    K: Eq + Hash,
    C: Clock + Clone,
{
    fn snapshot(&self) -> LimiterMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, C, Q> RateLimiter<Q> for KeyedRateLimiter<K, C>
where
    K: Eq + Hash + Borrow<Q> + Send + Sync,
    C: Clock + Clone,
    Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
{
    #[inline]
    fn allow_request(&self, key: &Q) -> bool {
        KeyedRateLimiter::allow_request(self, key)
    }
}

impl<K, C> fmt::Debug for KeyedRateLimiter<K, C>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedRateLimiter")
            .field("config", &self.config)
            .field("live_buckets", &self.buckets.len())
            .finish_non_exhaustive()
    }
}
