//! # Trait seams
//!
//! ```text
//!   ┌──────────────────────────────┐        ┌──────────────────────────────┐
//!   │       CoreCache<K, V>        │        │       RateLimiter<Q>         │
//!   │  insert / get / contains     │        │  allow_request(&Q) → bool    │
//!   │  len / capacity / clear      │        └──────────────────────────────┘
//!   └──────────────┬───────────────┘
//!                  ▼
//!   ┌──────────────────────────────┐
//!   │      MutableCache<K, V>      │
//!   │  remove(&K) → Option<V>      │
//!   └──────────────┬───────────────┘
//!                  ▼
//!   ┌──────────────────────────────┐
//!   │      LruCacheTrait<K, V>     │
//!   │  pop_lru / peek_lru          │
//!   │  touch / recency_rank        │
//!   └──────────────────────────────┘
//! ```
//!
//! The cache traits take `&mut self`: they describe single-threaded cores.
//! Thread-safe wrappers such as
//! [`ConcurrentLruCache`](crate::policy::lru::ConcurrentLruCache) expose
//! `&self` methods of their own and carry the [`ConcurrentCache`] marker.
//!
//! [`RateLimiter`] takes `&self` because admission decisions are made from
//! many threads at once; implementations synchronize internally.

/// Operations every bounded cache supports.
///
/// # Example
///
/// ```
/// use limitkit::policy::lru::LruCache;
/// use limitkit::traits::CoreCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, &str)]) {
///     for (k, v) in data {
///         cache.insert(*k, v.to_string());
///     }
/// }
///
/// let mut cache = LruCache::new(8);
/// warm(&mut cache, &[(1, "one"), (2, "two")]);
/// assert_eq!(CoreCache::len(&cache), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// A new key inserted into a full cache evicts one entry first.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Looks up `key`. May update eviction order.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks membership without touching eviction order.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    fn clear(&mut self);
}

/// Caches that allow removing an arbitrary key.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes each key in turn, returning the removed values in order.
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.remove(k)).collect()
    }
}

/// Recency-ordered caches.
pub trait LruCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// Returns the least recently used entry without removing it.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks `key` as most recently used. Returns `false` if absent.
    fn touch(&mut self, key: &K) -> bool;

    /// Position of `key` in recency order, 0 being most recent. O(n).
    fn recency_rank(&self, key: &K) -> Option<usize>;
}

/// Marker for cache types that are safe to share across threads.
pub trait ConcurrentCache: Send + Sync {}

/// Per-key admission control.
///
/// `Q` is the borrowed key form callers pass in (`str` for `String` keys).
///
/// # Example
///
/// ```
/// use limitkit::limiter::KeyedRateLimiter;
/// use limitkit::traits::RateLimiter;
///
/// fn admit(limiter: &dyn RateLimiter<str>, user: &str) -> &'static str {
///     if limiter.allow_request(user) { "ok" } else { "429" }
/// }
///
/// let limiter = KeyedRateLimiter::<String>::new(1, 1).unwrap();
/// assert_eq!(admit(&limiter, "user-123"), "ok");
/// assert_eq!(admit(&limiter, "user-123"), "429");
/// ```
pub trait RateLimiter<Q: ?Sized>: Send + Sync {
    /// Returns `true` if one unit of work for `key` may proceed now.
    fn allow_request(&self, key: &Q) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::lru::LruCache;

    #[test]
    fn remove_batch_default_preserves_order() {
        let mut cache = LruCache::new(4);
        cache.put(1, "a");
        cache.put(2, "b");

        let removed = MutableCache::remove_batch(&mut cache, &[2, 3, 1]);
        assert_eq!(removed, vec![Some("b"), None, Some("a")]);
        assert!(CoreCache::is_empty(&cache));
    }

    #[test]
    fn lru_trait_drains_in_recency_order() {
        fn evict_all<C: LruCacheTrait<u32, u32>>(cache: &mut C) -> Vec<u32> {
            std::iter::from_fn(|| cache.pop_lru().map(|(k, _)| k)).collect()
        }

        let mut cache = LruCache::new(3);
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30);
        assert_eq!(evict_all(&mut cache), vec![1, 2, 3]);
    }
}
