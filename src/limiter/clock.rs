//! Injectable time sources for token buckets.
//!
//! Buckets never read the system clock directly. They ask a [`Clock`] for a
//! monotonic nanosecond reading, which lets tests drive time by hand.
//!
//! | Clock              | Use        | Reading                                |
//! |--------------------|------------|----------------------------------------|
//! | [`MonotonicClock`] | production | nanos since the clock was created      |
//! | [`ManualClock`]    | tests      | whatever the test last set or advanced |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps in nanoseconds.
///
/// Readings only need to be comparable with other readings from the same
/// clock. A reading that goes backwards is treated as "no time elapsed".
///
/// # Example
///
/// ```
/// use limitkit::limiter::{Clock, ManualClock};
/// use std::time::Duration;
///
/// fn elapsed_since<C: Clock>(clock: &C, start: u64) -> u64 {
///     clock.now_nanos().saturating_sub(start)
/// }
///
/// let clock = ManualClock::new();
/// let start = clock.now_nanos();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(elapsed_since(&clock, start), 250_000_000);
/// ```
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> u64;
}

/// Wall-independent clock backed by [`Instant`].
///
/// Readings are relative to the moment the clock was created, so they fit a
/// `u64` for roughly 584 years.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_nanos(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same reading, so a test can keep one handle while a
/// limiter owns another.
///
/// ```
/// use limitkit::limiter::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
///
/// handle.advance(Duration::from_secs(1));
/// assert_eq!(clock.now_nanos(), 1_000_000_000);
///
/// handle.set_nanos(5);
/// assert_eq!(clock.now_nanos(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Starts at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(nanos: u64) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(nanos)),
        }
    }

    /// Moves the clock forward, saturating at `u64::MAX`.
    pub fn advance(&self, by: Duration) {
        self.advance_nanos(u64::try_from(by.as_nanos()).unwrap_or(u64::MAX));
    }

    pub fn advance_nanos(&self, by: u64) {
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(by))
            });
    }

    /// Sets the reading. May move the clock backwards.
    pub fn set_nanos(&self, nanos: u64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_nanos(&self) -> u64 {
        (**self).now_nanos()
    }
}
