//! # Metrics recorder traits
//!
//! ```text
//!   ┌─────────────────────────┐      ┌─────────────────────────────┐
//!   │   CoreMetricsRecorder   │      │   LimiterMetricsRecorder    │
//!   │  get hit/miss, insert,  │      │  allowed / denied /         │
//!   │  evict, clear (&mut)    │      │  bucket created (&self)     │
//!   └───────────┬─────────────┘      └─────────────────────────────┘
//!               ▼
//!   ┌─────────────────────────┐      ┌─────────────────────────────┐
//!   │   LruMetricsRecorder    │      │  LruMetricsReadRecorder     │
//!   │  pop_lru, touch (&mut)  │      │  peek (&self)               │
//!   └─────────────────────────┘      └─────────────────────────────┘
//!
//!   Consumption: MetricsSnapshotProvider<S> → S (Copy snapshot)
//! ```
//!
//! Recorders only write counters; snapshot providers only read them.

/// Counters shared by every cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// LRU-specific counters recorded under exclusive access.
pub trait LruMetricsRecorder: CoreMetricsRecorder {
    fn record_pop_lru_call(&mut self);
    fn record_pop_lru_found(&mut self);
    fn record_touch_call(&mut self);
    fn record_touch_found(&mut self);
}

/// LRU counters recorded from `&self` read paths.
pub trait LruMetricsReadRecorder {
    fn record_peek_call(&self);
    fn record_peek_found(&self);
}

/// Rate limiter counters. Recorded concurrently from many callers.
pub trait LimiterMetricsRecorder {
    fn record_allowed(&self);
    fn record_denied(&self);
    fn record_bucket_created(&self);
}

/// Produces a point-in-time copy of a component's counters.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
