//! # Token bucket
//!
//! One bucket admits or rejects single units of work. It holds up to
//! `capacity` tokens and regains `tokens` every `period` of clock time.
//!
//! ```text
//!   try_consume_at(now)
//!
//!     elapsed   = now - last_refill            (0 if the clock went backwards)
//!     add       = floor(elapsed * tokens / period)
//!     if add > 0:
//!         count        = min(capacity, count + add)
//!         last_refill += ceil(add * period / tokens)   (≤ elapsed)
//!
//!     count > 0  ──► count -= 1, admit
//!     count == 0 ──► reject, nothing consumed
//! ```
//!
//! `last_refill` only advances by the time actually converted into tokens, so
//! the fractional remainder of a period carries over to the next call. Over
//! any span `T` a bucket never produces more than `floor(T * tokens / period)`
//! new tokens.
//!
//! Arithmetic is done in `u128`; every product of two `u64` values fits, so
//! no intermediate can overflow and the count saturates at `capacity`.
//!
//! ## Thread Safety
//!
//! Refill and consume run under one `parking_lot::Mutex`, so two callers can
//! never both take the last token.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::ConfigError;
use crate::limiter::clock::{Clock, MonotonicClock};

/// Refill speed: `tokens` new tokens every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefillRate {
    tokens: u64,
    period: Duration,
}

impl RefillRate {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `tokens` is zero or `period` is zero.
    pub fn new(tokens: u64, period: Duration) -> Result<Self, ConfigError> {
        if tokens == 0 {
            return Err(ConfigError::non_positive("refill_rate"));
        }
        if period.is_zero() {
            return Err(ConfigError::non_positive("refill_period"));
        }
        Ok(Self { tokens, period })
    }

    /// `tokens` new tokens per second.
    ///
    /// ```
    /// use limitkit::limiter::RefillRate;
    /// use std::time::Duration;
    ///
    /// let rate = RefillRate::per_second(2).unwrap();
    /// assert_eq!(rate.tokens(), 2);
    /// assert_eq!(rate.period(), Duration::from_secs(1));
    /// assert!(RefillRate::per_second(0).is_err());
    /// ```
    pub fn per_second(tokens: u64) -> Result<Self, ConfigError> {
        Self::new(tokens, Duration::from_secs(1))
    }

    /// Returns the number of tokens added per period.
    #[inline]
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Returns the length of one refill period.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    fn period_nanos(&self) -> u128 {
        self.period.as_nanos()
    }
}

#[derive(Debug, Clone, Copy)]
struct BucketState {
    tokens: u64,
    last_refill: u64,
}

impl BucketState {
    /// Credits tokens for the time elapsed since `last_refill`.
    /// Returns the number of tokens the elapsed time was worth.
    fn refill(&mut self, capacity: u64, rate: RefillRate, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.last_refill);
        if elapsed == 0 {
            return 0;
        }

        let per_period = u128::from(rate.tokens);
        let period = rate.period_nanos();
        let earned = u128::from(elapsed) * per_period / period;
        if earned == 0 {
            return 0;
        }

        // ceil(earned * period / per_period) ≤ elapsed, see module docs
        let spent = (earned * period + per_period - 1) / per_period;
        let spent = u64::try_from(spent).unwrap_or(elapsed).min(elapsed);

        let filled = (u128::from(self.tokens) + earned).min(u128::from(capacity));
        self.tokens = u64::try_from(filled).unwrap_or(capacity);
        self.last_refill += spent;

        u64::try_from(earned).unwrap_or(u64::MAX)
    }
}

/// A single token bucket.
///
/// # Example
///
/// ```
/// use limitkit::limiter::{ManualClock, RefillRate, TokenBucket};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let bucket =
///     TokenBucket::with_clock(2, RefillRate::per_second(1).unwrap(), clock.clone()).unwrap();
///
/// assert!(bucket.try_consume());
/// assert!(bucket.try_consume());
/// assert!(!bucket.try_consume());
///
/// clock.advance(Duration::from_secs(1));
/// assert!(bucket.try_consume());
/// ```
pub struct TokenBucket<C = MonotonicClock> {
    capacity: u64,
    rate: RefillRate,
    clock: C,
    state: Mutex<BucketState>,
}

impl TokenBucket<MonotonicClock> {
    /// Creates a full bucket on the process monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero.
    pub fn new(capacity: u64, rate: RefillRate) -> Result<Self, ConfigError> {
        Self::with_clock(capacity, rate, MonotonicClock::new())
    }
}

impl<C: Clock> TokenBucket<C> {
    /// Creates a full bucket reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero.
    pub fn with_clock(capacity: u64, rate: RefillRate, clock: C) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::non_positive("capacity"));
        }
        Ok(Self::from_parts(capacity, rate, clock))
    }

    /// `capacity` must already be validated.
    pub(crate) fn from_parts(capacity: u64, rate: RefillRate, clock: C) -> Self {
        debug_assert!(capacity > 0);
        let now = clock.now_nanos();
        Self {
            capacity,
            rate,
            clock,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Refills, then takes one token if any is available.
    #[inline]
    pub fn try_consume(&self) -> bool {
        self.try_consume_at(self.clock.now_nanos())
    }

    /// [`try_consume`](Self::try_consume) at an explicit clock reading.
    pub fn try_consume_at(&self, now: u64) -> bool {
        let mut state = self.state.lock();
        let earned = state.refill(self.capacity, self.rate, now);
        if earned > 0 {
            trace!(
                earned,
                tokens = state.tokens,
                capacity = self.capacity,
                "token bucket refilled"
            );
        }

        if state.tokens == 0 {
            return false;
        }
        state.tokens -= 1;
        true
    }

    /// Tokens that a call made now would see, without consuming or
    /// committing the refill.
    pub fn available_tokens(&self) -> u64 {
        self.available_tokens_at(self.clock.now_nanos())
    }

    /// [`available_tokens`](Self::available_tokens) at an explicit clock reading.
    pub fn available_tokens_at(&self, now: u64) -> u64 {
        let mut state = *self.state.lock();
        state.refill(self.capacity, self.rate, now);
        state.tokens
    }

    /// Returns the maximum number of tokens the bucket holds.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the rate the bucket refills at.
    #[inline]
    pub fn refill_rate(&self) -> RefillRate {
        self.rate
    }
}

impl<C> fmt::Debug for TokenBucket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.state.lock();
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity)
            .field("rate", &self.rate)
            .field("tokens", &state.tokens)
            .field("last_refill", &state.last_refill)
            .finish()
    }
}
