use std::sync::atomic::{AtomicU64, Ordering};

/// Counter that can be bumped through a shared reference.
///
/// Used for counters recorded on read paths (`peek`, `&self` limiter calls)
/// where only a shared borrow is available. Relaxed ordering: counters are
/// observational and never synchronize other memory.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(AtomicU64);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}
