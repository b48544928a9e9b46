pub use crate::builder::{CacheBuilder, RateLimiterBuilder};
pub use crate::ds::{IntrusiveList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::limiter::{
    Clock, KeyedRateLimiter, LimiterConfig, ManualClock, MonotonicClock, RefillRate, TokenBucket,
};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::{LimiterMetricsSnapshot, LruMetricsSnapshot};
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::MetricsSnapshotProvider;
#[cfg(feature = "concurrency")]
pub use crate::policy::lru::ConcurrentLruCache;
pub use crate::policy::lru::LruCache;
pub use crate::traits::{ConcurrentCache, CoreCache, LruCacheTrait, MutableCache, RateLimiter};
