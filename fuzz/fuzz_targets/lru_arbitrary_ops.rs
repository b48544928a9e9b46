#![no_main]

use libfuzzer_sys::fuzz_target;
use limitkit::policy::lru::LruCache;

// Fuzz arbitrary operation sequences on LruCache
//
// First byte picks the capacity, then each (op, key) byte pair drives one of
// put, get, peek, touch, remove, pop_lru, clear. The structure is checked
// after every operation.
fuzz_target!(|data: &[u8]| {
    let Some((&cap_byte, rest)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap_byte % 32) + 1;
    let mut cache: LruCache<u8, u32> = LruCache::new(capacity);

    for (step, pair) in rest.chunks_exact(2).enumerate() {
        let op = pair[0] % 8;
        let key = pair[1] % 64;
        let value = step as u32;

        match op {
            0 | 1 => {
                let was_present = cache.contains(&key);
                let full = cache.len() == capacity;
                let old_len = cache.len();
                cache.put(key, value);

                assert_eq!(cache.peek(&key), Some(&value));
                assert_eq!(cache.recency_rank(&key), Some(0));
                if was_present || full {
                    assert_eq!(cache.len(), old_len);
                } else {
                    assert_eq!(cache.len(), old_len + 1);
                }
            }
            2 => {
                if cache.get(&key).is_some() {
                    assert_eq!(cache.recency_rank(&key), Some(0));
                }
            }
            3 => {
                let before: Vec<u8> = cache.keys().copied().collect();
                let _ = cache.peek(&key);
                let after: Vec<u8> = cache.keys().copied().collect();
                assert_eq!(before, after);
            }
            4 => {
                let present = cache.contains(&key);
                assert_eq!(cache.touch(&key), present);
            }
            5 => {
                let present = cache.contains(&key);
                assert_eq!(cache.remove(&key).is_some(), present);
                assert!(!cache.contains(&key));
            }
            6 => {
                let expected = cache.peek_lru().map(|(k, v)| (*k, *v));
                assert_eq!(cache.pop_lru(), expected);
            }
            _ => {
                if step % 16 == 0 {
                    cache.clear();
                    assert!(cache.is_empty());
                }
            }
        }

        assert!(cache.len() <= capacity);
        assert!(cache.check_invariants().is_ok());
    }
});
