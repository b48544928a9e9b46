//! # Least Recently Used (LRU) cache
//!
//! A fixed-capacity key/value store. `get` and `put` are O(1); when a new key
//! arrives at a full cache the least recently touched entry is evicted.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         LruCache<K, V>                               │
//!   │                                                                      │
//!   │   index: FxHashMap<K, SlotId>                                        │
//!   │   ┌─────────┬────────┐                                               │
//!   │   │  "a"    │ id_2 ──┼──────────────┐                                │
//!   │   │  "b"    │ id_0 ──┼───────┐      │                                │
//!   │   │  "c"    │ id_1 ──┼──┐    │      │                                │
//!   │   └─────────┴────────┘  │    │      │                                │
//!   │                         ▼    ▼      ▼                                │
//!   │   order: IntrusiveList<Entry<K, V>>                                  │
//!   │     head ──► [c] ◄──► [b] ◄──► [a] ◄── tail                          │
//!   │              MRU                LRU                                  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index and the recency list always hold the same key set. Every
//! mutation touches both inside one `&mut self` call, so a caller can never
//! observe one updated without the other.
//!
//! ## Operations
//!
//! ```text
//!   put(d) on a full cache (capacity 3)
//!     before: head ─► [c] [b] [a] ◄─ tail
//!     1. pop [a] from the tail, drop "a" from the index
//!     2. push [d] at the head, index "d"
//!     after:  head ─► [d] [c] [b] ◄─ tail
//!
//!   get(b)
//!     before: head ─► [d] [c] [b] ◄─ tail
//!     after:  head ─► [b] [d] [c] ◄─ tail
//!
//!   peek(c): no reordering
//! ```
//!
//! | Method           | Complexity | Notes                                |
//! |------------------|------------|--------------------------------------|
//! | `get` / `put`    | O(1) avg   | moves the entry to MRU               |
//! | `peek`           | O(1) avg   | no reordering                        |
//! | `remove`         | O(1) avg   |                                      |
//! | `pop_lru`        | O(1)       |                                      |
//! | `touch`          | O(1) avg   | MRU without reading the value        |
//! | `recency_rank`   | O(n)       | 0 = MRU                              |
//! | `clear`          | O(n)       |                                      |
//!
//! ## Thread Safety
//!
//! - [`LruCache`]: single-threaded; `get` needs `&mut self`.
//! - [`ConcurrentLruCache`]: `Arc<parking_lot::RwLock<LruCache<K, Arc<V>>>>`.
//!   `get`/`put`/`remove`/`touch` hold the write lock for the whole call;
//!   `peek`/`contains`/`len` share the read lock. Values come back as
//!   `Arc<V>` so they stay valid after the lock is released or the entry is
//!   evicted.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::mem;
#[cfg(feature = "concurrency")]
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ds::{IntrusiveList, SlotId};
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::LruMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, LruMetricsReadRecorder, LruMetricsRecorder, MetricsSnapshotProvider,
};
#[cfg(feature = "concurrency")]
use crate::traits::ConcurrentCache;
use crate::traits::{CoreCache, LruCacheTrait, MutableCache};

/// List payload. The key is kept so eviction can clean up the index.
#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Single-threaded LRU cache.
///
/// # Example
///
/// ```
/// use limitkit::policy::lru::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.put(1, 10);
/// cache.put(2, 20);
/// assert_eq!(cache.get(&1), Some(&10));
///
/// cache.put(3, 30); // evicts 2
/// assert_eq!(cache.get(&2), None);
///
/// cache.put(4, 40); // evicts 1
/// assert_eq!(cache.get(&1), None);
/// assert_eq!(cache.get(&3), Some(&30));
/// assert_eq!(cache.get(&4), Some(&40));
/// ```
pub struct LruCache<K, V> {
    index: FxHashMap<K, SlotId>,
    order: IntrusiveList<Entry<K, V>>,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: LruMetrics,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache, returning an error if `capacity` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero capacity.
    ///
    /// # Example
    ///
    /// ```
    /// use limitkit::policy::lru::LruCache;
    ///
    /// assert!(LruCache::<u32, u32>::try_new(0).is_err());
    /// assert_eq!(LruCache::<u32, u32>::try_new(4).unwrap().capacity(), 4);
    /// ```
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::non_positive("capacity"));
        }
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: IntrusiveList::with_capacity(capacity),
            capacity,
            #[cfg(feature = "metrics")]
            metrics: LruMetrics::default(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if `key` is cached. Does not update recency.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Returns the value for `key` and marks it most recently used.
    ///
    /// A miss returns `None` and leaves the recency order untouched.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = match self.index.get(key) {
            Some(&id) => id,
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                return None;
            },
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.order.move_to_front(id);
        self.order.get(id).map(|entry| &entry.value)
    }

    /// Like [`get`](Self::get) but returns a mutable reference.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = match self.index.get(key) {
            Some(&id) => id,
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                return None;
            },
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.order.move_to_front(id);
        self.order.get_mut(id).map(|entry| &mut entry.value)
    }

    /// Returns the value for `key` without updating recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_call();

        let id = *self.index.get(key)?;
        let value = self.order.get(id).map(|entry| &entry.value);

        #[cfg(feature = "metrics")]
        if value.is_some() {
            self.metrics.record_peek_found();
        }

        value
    }

    /// Inserts or overwrites `key` and marks it most recently used.
    ///
    /// Overwriting returns the previous value. Inserting a new key into a full
    /// cache evicts the least recently used entry first.
    ///
    /// # Example
    ///
    /// ```
    /// use limitkit::policy::lru::LruCache;
    ///
    /// let mut cache = LruCache::new(2);
    /// assert_eq!(cache.put("a", 1), None);
    /// assert_eq!(cache.put("b", 2), None);
    /// assert_eq!(cache.put("a", 10), Some(1)); // "a" is now MRU
    ///
    /// cache.put("c", 3); // evicts "b"
    /// assert!(!cache.contains("b"));
    /// assert_eq!(cache.peek("a"), Some(&10));
    /// ```
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        if let Some(&id) = self.index.get(&key) {
            debug_assert!(self.order.contains(id), "index points at a freed slot");
            if let Some(entry) = self.order.get_mut(id) {
                #[cfg(feature = "metrics")]
                self.metrics.record_insert_update();

                let previous = mem::replace(&mut entry.value, value);
                self.order.move_to_front(id);
                return Some(previous);
            }
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        if self.index.len() >= self.capacity {
            self.evict_lru();
        }

        let id = self.order.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);

        debug_assert_eq!(self.index.len(), self.order.len());
        debug_assert!(self.index.len() <= self.capacity);
        None
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        self.order.remove(id).map(|entry| entry.value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        #[cfg(feature = "metrics")]
        self.metrics.record_pop_lru_call();

        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);

        #[cfg(feature = "metrics")]
        self.metrics.record_pop_lru_found();

        Some((entry.key, entry.value))
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Marks `key` most recently used without reading it.
    pub fn touch<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_touch_call();

        let Some(&id) = self.index.get(key) else {
            return false;
        };
        self.order.move_to_front(id);

        #[cfg(feature = "metrics")]
        self.metrics.record_touch_found();

        true
    }

    /// Position of `key` in recency order (0 = most recent). O(n).
    pub fn recency_rank<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let target = *self.index.get(key)?;
        self.order.iter_entries().position(|(id, _)| id == target)
    }

    /// Drops every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        self.index.clear();
        self.order.clear();
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|entry| &entry.key)
    }

    /// Verifies that the index and the recency list describe the same entries.
    ///
    /// Walks the whole list: O(n). Intended for tests and fuzzing.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.order.check_invariants()?;

        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but recency list holds {}",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.order.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.order.len(),
                self.capacity
            )));
        }
        for (id, entry) in self.order.iter_entries() {
            if self.index.get(&entry.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "slot {} is not indexed under its key",
                    id.index()
                )));
            }
        }
        Ok(())
    }

    fn evict_lru(&mut self) -> Option<(K, V)> {
        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);

        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();

        trace!(
            capacity = self.capacity,
            len = self.index.len(),
            "evicted least recently used entry"
        );
        Some((entry.key, entry.value))
    }
}

#[cfg(feature = "metrics")]
impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        LruMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_calls: self.metrics.insert_calls,
            insert_updates: self.metrics.insert_updates,
            insert_new: self.metrics.insert_new,
            evicted_entries: self.metrics.evicted_entries,
            clear_calls: self.metrics.clear_calls,
            pop_lru_calls: self.metrics.pop_lru_calls,
            pop_lru_found: self.metrics.pop_lru_found,
            touch_calls: self.metrics.touch_calls,
            touch_found: self.metrics.touch_found,
            peek_calls: self.metrics.peek_calls.get(),
            peek_found: self.metrics.peek_found.get(),
            cache_len: self.index.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<LruMetricsSnapshot> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> LruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> CoreCache<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        LruCache::put(self, key, value)
    }

    #[inline]
    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        LruCache::clear(self)
    }
}

impl<K, V> MutableCache<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        LruCache::remove(self, key)
    }
}

impl<K, V> LruCacheTrait<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        LruCache::pop_lru(self)
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        LruCache::peek_lru(self)
    }

    fn touch(&mut self, key: &K) -> bool {
        LruCache::touch(self, key)
    }

    fn recency_rank(&self, key: &K) -> Option<usize> {
        LruCache::recency_rank(self, key)
    }
}

impl<K, V> Extend<(K, V)> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ConcurrentLruCache
// ---------------------------------------------------------------------------

/// Thread-safe LRU cache. Cloning shares the same underlying cache.
///
/// # Example
///
/// ```
/// use limitkit::policy::lru::ConcurrentLruCache;
/// use std::thread;
///
/// let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(64);
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let cache = cache.clone();
///         thread::spawn(move || {
///             for i in 0..16 {
///                 cache.put(t * 16 + i, format!("v{t}-{i}"));
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(cache.len(), 64);
/// assert_eq!(*cache.get(&17).unwrap(), "v1-1");
/// ```
#[cfg(feature = "concurrency")]
pub struct ConcurrentLruCache<K, V> {
    inner: Arc<RwLock<LruCache<K, Arc<V>>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for ConcurrentLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a shared cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self::from_core(LruCache::try_new(capacity)?))
    }

    pub(crate) fn from_core(core: LruCache<K, Arc<V>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(core)),
        }
    }

    /// Inserts or overwrites `key`. Returns the previous value, if any.
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        let value = Arc::new(value);
        self.inner.write().put(key, value)
    }

    /// Inserts an already shared value.
    pub fn put_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        self.inner.write().put(key, value)
    }

    /// Returns the value and marks it most recently used.
    ///
    /// Takes the write lock: lookup and reposition form one critical section.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().get(key).map(Arc::clone)
    }

    /// Returns the value without updating recency. Read lock only.
    pub fn peek<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().peek(key).map(Arc::clone)
    }

    /// Returns `true` if `key` is cached. Read lock only.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().contains(key)
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().remove(key)
    }

    /// Marks `key` most recently used. Returns `false` if absent.
    pub fn touch<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().touch(key)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&self) -> Option<(K, Arc<V>)> {
        self.inner.write().pop_lru()
    }

    /// Returns a copy of the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(K, Arc<V>)> {
        let cache = self.inner.read();
        cache
            .peek_lru()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// See [`LruCache::check_invariants`]. Read lock for the whole walk.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}

#[cfg(all(feature = "concurrency", feature = "metrics"))]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Returns the counters of the wrapped cache.
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        self.inner.read().metrics_snapshot()
    }
}

#[cfg(all(feature = "concurrency", feature = "metrics"))]
impl<K, V> MetricsSnapshotProvider<LruMetricsSnapshot> for ConcurrentLruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> LruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ConcurrentLruCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for ConcurrentLruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLruCache")
            .field("len", &cache.index.len())
            .field("capacity", &cache.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==============================================
    // CORRECTNESS TESTS MODULE
    // ==============================================
    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn test_new_cache_is_empty() {
                let cache: LruCache<i32, i32> = LruCache::new(10);
                assert_eq!(cache.capacity(), 10);
                assert_eq!(cache.len(), 0);
                assert!(cache.is_empty());
            }

            #[test]
            fn test_get_missing_key_returns_none() {
                let mut cache: LruCache<i32, i32> = LruCache::new(2);
                cache.put(1, 10);
                assert_eq!(cache.get(&2), None);
            }

            #[test]
            fn test_put_then_get() {
                let mut cache = LruCache::new(5);
                assert_eq!(cache.put(1, 100), None);
                assert_eq!(cache.get(&1), Some(&100));
                assert_eq!(cache.len(), 1);
            }

            #[test]
            fn test_put_existing_key_updates_in_place() {
                let mut cache = LruCache::new(5);
                cache.put(1, 100);
                assert_eq!(cache.put(1, 200), Some(100));
                assert_eq!(cache.len(), 1);
                assert_eq!(cache.get(&1), Some(&200));
            }

            #[test]
            fn test_stored_value_is_distinct_from_miss() {
                // A stored "sentinel-looking" value is still a hit.
                let mut cache = LruCache::new(2);
                cache.put(7, -1);
                assert_eq!(cache.get(&7), Some(&-1));
                assert_eq!(cache.get(&8), None);
            }

            #[test]
            fn test_borrowed_lookup_with_string_keys() {
                let mut cache: LruCache<String, u32> = LruCache::new(2);
                cache.put("alpha".to_string(), 1);
                assert_eq!(cache.get("alpha"), Some(&1));
                assert!(cache.contains("alpha"));
                assert_eq!(cache.remove("alpha"), Some(1));
            }

            #[test]
            fn test_get_mut_modifies_and_promotes() {
                let mut cache = LruCache::new(2);
                cache.put(1, 1);
                cache.put(2, 2);
                if let Some(v) = cache.get_mut(&1) {
                    *v += 10;
                }
                cache.put(3, 3); // evicts 2
                assert_eq!(cache.peek(&1), Some(&11));
                assert!(!cache.contains(&2));
            }

            #[test]
            fn test_remove() {
                let mut cache = LruCache::new(3);
                cache.put(1, "one");
                cache.put(2, "two");
                assert_eq!(cache.remove(&1), Some("one"));
                assert_eq!(cache.remove(&1), None);
                assert_eq!(cache.len(), 1);
                cache.check_invariants().unwrap();
            }

            #[test]
            fn test_clear() {
                let mut cache = LruCache::new(3);
                cache.extend([(1, 1), (2, 2), (3, 3)]);
                cache.clear();
                assert!(cache.is_empty());
                assert_eq!(cache.capacity(), 3);
                assert_eq!(cache.peek_lru(), None);
                cache.check_invariants().unwrap();
            }
        }

        mod eviction {
            use super::*;

            #[test]
            fn test_two_slot_walkthrough() {
                let mut cache = LruCache::new(2);
                cache.put(1, 10);
                cache.put(2, 20);
                assert_eq!(cache.get(&1), Some(&10));
                cache.put(3, 30);
                assert_eq!(cache.get(&2), None);
                cache.put(4, 40);
                assert_eq!(cache.get(&1), None);
                assert_eq!(cache.get(&3), Some(&30));
                assert_eq!(cache.get(&4), Some(&40));
            }

            #[test]
            fn test_evicts_oldest_insert_without_access() {
                let mut cache = LruCache::new(3);
                for i in 0..3 {
                    cache.put(i, i);
                }
                cache.put(3, 3);
                assert!(!cache.contains(&0));
                for i in 1..=3 {
                    assert_eq!(cache.peek(&i), Some(&i));
                }
            }

            #[test]
            fn test_capacity_one() {
                let mut cache = LruCache::new(1);
                cache.put("a", 1);
                cache.put("b", 2);
                assert_eq!(cache.len(), 1);
                assert_eq!(cache.get("a"), None);
                assert_eq!(cache.get("b"), Some(&2));
            }

            #[test]
            fn test_overwrite_at_capacity_does_not_evict() {
                let mut cache = LruCache::new(2);
                cache.put(1, 1);
                cache.put(2, 2);
                cache.put(2, 22);
                assert_eq!(cache.len(), 2);
                assert!(cache.contains(&1));
            }

            #[test]
            fn test_pop_lru_order() {
                let mut cache = LruCache::new(3);
                cache.put(1, "a");
                cache.put(2, "b");
                cache.put(3, "c");
                cache.get(&1);
                assert_eq!(cache.pop_lru(), Some((2, "b")));
                assert_eq!(cache.pop_lru(), Some((3, "c")));
                assert_eq!(cache.pop_lru(), Some((1, "a")));
                assert_eq!(cache.pop_lru(), None);
            }

            #[test]
            fn test_long_churn_keeps_last_n() {
                let mut cache = LruCache::new(8);
                for i in 0..1000u32 {
                    cache.put(i, i * 2);
                    assert!(cache.len() <= 8);
                }
                let keys: Vec<_> = cache.keys().copied().collect();
                assert_eq!(keys, (992..1000).rev().collect::<Vec<_>>());
                cache.check_invariants().unwrap();
            }
        }

        mod recency {
            use super::*;

            #[test]
            fn test_get_protects_entry() {
                let mut cache = LruCache::new(3);
                cache.put(1, ());
                cache.put(2, ());
                cache.put(3, ());
                cache.get(&1);
                cache.put(4, ());
                cache.put(5, ());
                assert!(cache.contains(&1));
                assert!(!cache.contains(&2));
                assert!(!cache.contains(&3));
            }

            #[test]
            fn test_put_update_protects_entry() {
                let mut cache = LruCache::new(3);
                cache.put(1, 0);
                cache.put(2, 0);
                cache.put(3, 0);
                cache.put(1, 1);
                cache.put(4, 0);
                assert_eq!(cache.peek(&1), Some(&1));
                assert!(!cache.contains(&2));
            }

            #[test]
            fn test_peek_does_not_promote() {
                let mut cache = LruCache::new(2);
                cache.put(1, 1);
                cache.put(2, 2);
                assert_eq!(cache.peek(&1), Some(&1));
                cache.put(3, 3);
                assert!(!cache.contains(&1));
            }

            #[test]
            fn test_miss_does_not_reorder() {
                let mut cache = LruCache::new(2);
                cache.put(1, 1);
                cache.put(2, 2);
                let before: Vec<_> = cache.keys().copied().collect();
                assert_eq!(cache.get(&9), None);
                let after: Vec<_> = cache.keys().copied().collect();
                assert_eq!(before, after);
            }

            #[test]
            fn test_touch_and_rank() {
                let mut cache = LruCache::new(4);
                for i in 0..4 {
                    cache.put(i, i);
                }
                assert_eq!(cache.recency_rank(&3), Some(0));
                assert_eq!(cache.recency_rank(&0), Some(3));

                assert!(cache.touch(&0));
                assert!(!cache.touch(&42));
                assert_eq!(cache.recency_rank(&0), Some(0));
                assert_eq!(cache.peek_lru(), Some((&1, &1)));
                assert_eq!(cache.recency_rank(&42), None);
            }

            #[test]
            fn test_iter_is_mru_to_lru() {
                let mut cache = LruCache::new(3);
                cache.put('a', 1);
                cache.put('b', 2);
                cache.put('c', 3);
                cache.get(&'a');
                let order: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                assert_eq!(order, vec![('a', 1), ('c', 3), ('b', 2)]);
            }
        }
    }

    // ==============================================
    // EDGE CASES
    // ==============================================
    mod edge_cases {
        use super::*;

        #[test]
        fn test_zero_capacity_is_rejected() {
            let err = LruCache::<u8, u8>::try_new(0).unwrap_err();
            assert_eq!(err.parameter(), "capacity");
        }

        #[test]
        #[should_panic(expected = "capacity")]
        fn test_new_zero_capacity_panics() {
            let _ = LruCache::<u8, u8>::new(0);
        }

        #[test]
        fn test_slots_are_recycled_after_eviction() {
            let mut cache = LruCache::new(2);
            for i in 0..100 {
                cache.put(i, i);
            }
            cache.check_invariants().unwrap();
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn test_debug_output() {
            let mut cache = LruCache::new(4);
            cache.put(1, 1);
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("len: 1"));
            assert!(dbg.contains("capacity: 4"));
        }
    }

    // ==============================================
    // TRAIT DISPATCH
    // ==============================================
    mod trait_dispatch {
        use super::*;

        #[test]
        fn test_core_cache_insert_returns_previous_value() {
            let mut cache: LruCache<u32, &str> = LruCache::new(2);
            assert_eq!(CoreCache::insert(&mut cache, 1, "a"), None);
            assert_eq!(CoreCache::insert(&mut cache, 1, "b"), Some("a"));
            assert_eq!(CoreCache::get(&mut cache, &1), Some(&"b"));
            assert_eq!(CoreCache::capacity(&cache), 2);
        }

        #[test]
        fn test_lru_trait_touch_and_peek() {
            let mut cache: LruCache<u32, u32> = LruCache::new(2);
            cache.put(1, 1);
            cache.put(2, 2);
            assert!(LruCacheTrait::touch(&mut cache, &1));
            assert_eq!(LruCacheTrait::peek_lru(&cache), Some((&2, &2)));
            assert_eq!(LruCacheTrait::recency_rank(&cache, &1), Some(0));
        }
    }

    // ==============================================
    // CONCURRENT WRAPPER
    // ==============================================
    #[cfg(feature = "concurrency")]
    mod concurrent {
        use super::*;
        use std::thread;

        #[test]
        fn test_shared_clone_sees_writes() {
            let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(4);
            let other = cache.clone();
            cache.put(1, "one".into());
            assert_eq!(other.get(&1).as_deref().map(String::as_str), Some("one"));
        }

        #[test]
        fn test_value_outlives_eviction() {
            let cache: ConcurrentLruCache<u32, Vec<u8>> = ConcurrentLruCache::new(1);
            cache.put(1, vec![1, 2, 3]);
            let held = cache.get(&1).unwrap();
            cache.put(2, vec![4]);
            assert!(!cache.contains(&1));
            assert_eq!(*held, vec![1, 2, 3]);
        }

        #[test]
        fn test_put_arc_shares_allocation() {
            let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(2);
            let shared = Arc::new("shared".to_string());
            cache.put_arc(1, Arc::clone(&shared));
            assert!(Arc::ptr_eq(&shared, &cache.peek(&1).unwrap()));
        }

        #[test]
        fn test_try_new_rejects_zero() {
            assert!(ConcurrentLruCache::<u32, u32>::try_new(0).is_err());
        }

        #[test]
        fn test_parallel_mixed_ops_hold_invariants() {
            let cache: ConcurrentLruCache<u64, u64> = ConcurrentLruCache::new(32);
            let handles: Vec<_> = (0..8u64)
                .map(|t| {
                    let cache = cache.clone();
                    thread::spawn(move || {
                        for i in 0..2_000u64 {
                            let key = (t * 31 + i) % 97;
                            match i % 4 {
                                0 | 1 => {
                                    cache.put(key, key * 10);
                                },
                                2 => {
                                    if let Some(v) = cache.get(&key) {
                                        assert_eq!(*v, key * 10);
                                    }
                                },
                                _ => {
                                    cache.touch(&key);
                                },
                            }
                            assert!(cache.len() <= 32);
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            cache.check_invariants().unwrap();
            assert_eq!(cache.len(), 32);
        }

        #[test]
        fn test_pop_and_peek_lru() {
            let cache: ConcurrentLruCache<u32, u32> = ConcurrentLruCache::new(3);
            cache.put(1, 1);
            cache.put(2, 2);
            cache.get(&1);
            assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(2));
            assert_eq!(cache.pop_lru().map(|(k, v)| (k, *v)), Some((2, 2)));
            cache.clear();
            assert!(cache.is_empty());
        }
    }

    // ==============================================
    // METRICS
    // ==============================================
    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn test_counters_follow_operations() {
            let mut cache = LruCache::new(2);
            cache.put(1, 1);
            cache.put(2, 2);
            cache.put(1, 11);
            cache.get(&1);
            cache.get(&9);
            cache.put(3, 3); // evicts 2
            cache.peek(&3);
            cache.touch(&3);
            cache.pop_lru();

            let snap = cache.snapshot();
            assert_eq!(snap.insert_calls, 4);
            assert_eq!(snap.insert_new, 3);
            assert_eq!(snap.insert_updates, 1);
            assert_eq!(snap.get_hits, 1);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.peek_calls, 1);
            assert_eq!(snap.peek_found, 1);
            assert_eq!(snap.touch_found, 1);
            assert_eq!(snap.pop_lru_found, 1);
            assert_eq!(snap.cache_len, 1);
            assert_eq!(snap.capacity, 2);
        }

        #[test]
        fn test_get_mut_counts_hits_and_misses() {
            let mut cache = LruCache::new(2);
            cache.put(1, 10);

            if let Some(value) = cache.get_mut(&1) {
                *value += 1;
            }
            assert!(cache.get_mut(&9).is_none());

            let snap = cache.snapshot();
            assert_eq!(snap.get_calls, 2);
            assert_eq!(snap.get_hits, 1);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(cache.peek(&1), Some(&11));
        }

        #[cfg(feature = "concurrency")]
        #[test]
        fn test_concurrent_snapshot_reads_inner_counters() {
            let cache: ConcurrentLruCache<u64, u64> = ConcurrentLruCache::new(2);
            cache.put(1, 1);
            cache.put(2, 2);
            cache.get(&1);
            cache.get(&7);
            cache.peek(&2);
            cache.put(3, 3); // evicts 2

            let snap = cache.metrics_snapshot();
            assert_eq!(snap.insert_calls, 3);
            assert_eq!(snap.get_hits, 1);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(snap.peek_calls, 1);
            assert_eq!(snap.peek_found, 1);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.cache_len, 2);
            assert_eq!(snap.capacity, 2);
            assert_eq!(snap, MetricsSnapshotProvider::snapshot(&cache));
        }
    }

    // ==============================================
    // PROPERTY TESTS
    // ==============================================
    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::VecDeque;

        #[derive(Debug, Clone)]
        enum Op {
            Put(u8, u16),
            Get(u8),
            Peek(u8),
            Touch(u8),
            Remove(u8),
            PopLru,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            // Small key space so hits, updates and evictions all happen.
            let key = 0u8..16;
            prop_oneof![
                4 => (key.clone(), any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
                3 => key.clone().prop_map(Op::Get),
                1 => key.clone().prop_map(Op::Peek),
                1 => key.clone().prop_map(Op::Touch),
                1 => key.prop_map(Op::Remove),
                1 => Just(Op::PopLru),
            ]
        }

        /// Reference model: front = MRU.
        struct Model {
            cap: usize,
            entries: VecDeque<(u8, u16)>,
        }

        impl Model {
            fn position(&self, k: u8) -> Option<usize> {
                self.entries.iter().position(|(key, _)| *key == k)
            }

            fn promote(&mut self, k: u8) -> Option<u16> {
                let pos = self.position(k)?;
                let entry = self.entries.remove(pos)?;
                self.entries.push_front(entry);
                Some(entry.1)
            }

            fn put(&mut self, k: u8, v: u16) -> Option<u16> {
                if let Some(pos) = self.position(k) {
                    let (_, old) = self.entries.remove(pos)?;
                    self.entries.push_front((k, v));
                    return Some(old);
                }
                if self.entries.len() == self.cap {
                    self.entries.pop_back();
                }
                self.entries.push_front((k, v));
                None
            }
        }

        proptest! {
            /// Property: cache behaves exactly like the VecDeque model
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_matches_reference_model(
                cap in 1usize..8,
                ops in prop::collection::vec(op_strategy(), 0..300)
            ) {
                let mut cache = LruCache::new(cap);
                let mut model = Model { cap, entries: VecDeque::new() };

                for op in ops {
                    match op {
                        Op::Put(k, v) => prop_assert_eq!(cache.put(k, v), model.put(k, v)),
                        Op::Get(k) => prop_assert_eq!(cache.get(&k).copied(), model.promote(k)),
                        Op::Peek(k) => {
                            let expected = model.position(k).map(|p| model.entries[p].1);
                            prop_assert_eq!(cache.peek(&k).copied(), expected);
                        },
                        Op::Touch(k) => {
                            prop_assert_eq!(cache.touch(&k), model.promote(k).is_some());
                        },
                        Op::Remove(k) => {
                            let expected = model
                                .position(k)
                                .and_then(|p| model.entries.remove(p))
                                .map(|(_, v)| v);
                            prop_assert_eq!(cache.remove(&k), expected);
                        },
                        Op::PopLru => prop_assert_eq!(cache.pop_lru(), model.entries.pop_back()),
                    }

                    prop_assert!(cache.len() <= cap);
                    prop_assert!(cache.check_invariants().is_ok());
                    let actual: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                    let expected: Vec<_> = model.entries.iter().copied().collect();
                    prop_assert_eq!(actual, expected);
                }
            }

            /// Property: after a put into a full cache, the evicted key is the LRU one
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_evicts_exactly_the_lru_key(
                cap in 1usize..10,
                touches in prop::collection::vec(0usize..10, 0..20)
            ) {
                let mut cache = LruCache::new(cap);
                for k in 0..cap {
                    cache.put(k, k);
                }
                for t in touches {
                    cache.get(&(t % cap));
                }
                let lru = *cache.peek_lru().unwrap().0;
                let survivors: Vec<_> = cache.keys().copied().filter(|k| *k != lru).collect();

                cache.put(usize::MAX, 0);

                prop_assert!(!cache.contains(&lru));
                for k in survivors {
                    prop_assert_eq!(cache.peek(&k), Some(&k));
                }
            }
        }
    }
}
