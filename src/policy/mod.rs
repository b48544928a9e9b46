//! Eviction policies.
//!
//! | Policy | Single-threaded | Thread-safe                         |
//! |--------|-----------------|-------------------------------------|
//! | LRU    | [`LruCache`]    | [`ConcurrentLruCache`] (`concurrency`) |

pub mod lru;

#[cfg(feature = "concurrency")]
pub use lru::ConcurrentLruCache;
pub use lru::LruCache;
