//! limitkit: bounded caches and per-key rate limiting.
//!
//! Two independent in-process primitives:
//!
//! - [`LruCache`](policy::lru::LruCache): fixed capacity, O(1) `get`/`put`,
//!   least-recently-used eviction. [`ConcurrentLruCache`](policy::lru::ConcurrentLruCache)
//!   wraps it for shared use.
//! - [`KeyedRateLimiter`](limiter::KeyedRateLimiter): one token bucket per
//!   key, created on first request.
//!
//! ```
//! use limitkit::prelude::*;
//!
//! let mut cache = LruCache::new(2);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get("a");
//! cache.put("c", 3);
//! assert!(!cache.contains("b"));
//!
//! let limiter = KeyedRateLimiter::<String>::new(5, 2).unwrap();
//! assert!(limiter.allow_request("user-123"));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod limiter;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
