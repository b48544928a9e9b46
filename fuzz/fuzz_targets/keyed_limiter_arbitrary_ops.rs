#![no_main]

use libfuzzer_sys::fuzz_target;
use limitkit::limiter::{KeyedRateLimiter, ManualClock, RefillRate};
use std::collections::HashMap;

// Fuzz KeyedRateLimiter with a frozen clock against a per-key counter model
//
// With time frozen every key admits exactly `capacity` requests until it is
// removed or the limiter is cleared.
fuzz_target!(|data: &[u8]| {
    let Some((&cap_byte, rest)) = data.split_first() else {
        return;
    };
    let capacity = u64::from(cap_byte % 16) + 1;
    let rate = RefillRate::per_second(1).unwrap();
    let limiter: KeyedRateLimiter<u8, ManualClock> =
        KeyedRateLimiter::with_clock(capacity, rate, ManualClock::new()).unwrap();
    let mut spent: HashMap<u8, u64> = HashMap::new();

    for pair in rest.chunks_exact(2) {
        let key = pair[1] % 32;
        match pair[0] % 8 {
            0 => {
                assert_eq!(limiter.remove(&key), spent.remove(&key).is_some());
            }
            1 => {
                if pair[1] == 0xFF {
                    limiter.clear();
                    spent.clear();
                }
            }
            _ => {
                let used = spent.entry(key).or_insert(0);
                let expected = *used < capacity;
                assert_eq!(limiter.allow_request(&key), expected);
                if expected {
                    *used += 1;
                }
            }
        }

        assert_eq!(limiter.len(), spent.len());
        let used = spent.get(&key).copied().unwrap_or(0);
        assert_eq!(limiter.available_tokens(&key), capacity - used);
    }
});
