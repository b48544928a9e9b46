#![no_main]

use libfuzzer_sys::fuzz_target;
use limitkit::limiter::{Clock, ManualClock, RefillRate, TokenBucket};
use std::time::Duration;

// Fuzz a token bucket with arbitrary clock movements
//
// Header bytes choose capacity, refill amount and period. Each following
// 9-byte record moves the clock (forward, backward or to an absolute value)
// and then attempts a few consumes. Admissions must stay within
// capacity + floor(forward_time * rate) and the count within [0, capacity].
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let capacity = u64::from(data[0]) + 1;
    let tokens = u64::from(data[1]) + 1;
    let period = Duration::from_micros(u64::from(u16::from_le_bytes([data[2], data[3]])) + 1);

    let clock = ManualClock::new();
    let rate = RefillRate::new(tokens, period).unwrap();
    let bucket = TokenBucket::with_clock(capacity, rate, clock.clone()).unwrap();

    // highest reading seen; refill can never credit time beyond it
    let mut high_water = 0u64;
    let mut admitted: u128 = 0;

    for record in data[4..].chunks_exact(9) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&record[1..9]);
        let amount = u64::from_le_bytes(raw);

        match record[0] % 3 {
            0 => clock.advance_nanos(amount % 10_000_000_000),
            1 => clock.set_nanos(clock.now_nanos().saturating_sub(amount % 1_000_000_000)),
            _ => clock.set_nanos(amount),
        }
        high_water = high_water.max(clock.now_nanos());

        for _ in 0..(record[0] % 5) {
            if bucket.try_consume() {
                admitted += 1;
            }
        }
        assert!(bucket.available_tokens() <= capacity);
    }

    let bound = u128::from(capacity)
        + u128::from(high_water) * u128::from(tokens) / period.as_nanos();
    assert!(admitted <= bound);
});
