//! Token-bucket rate limiting.
//!
//! - [`TokenBucket`]: a single bucket with lazy refill.
//! - [`KeyedRateLimiter`]: one bucket per key, created on first request.
//! - [`Clock`]: time source; [`MonotonicClock`] in production,
//!   [`ManualClock`] when tests need to control time.

pub mod clock;
pub mod keyed;
pub mod token_bucket;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use keyed::{KeyedRateLimiter, LimiterConfig};
pub use token_bucket::{RefillRate, TokenBucket};
