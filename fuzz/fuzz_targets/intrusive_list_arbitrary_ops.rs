#![no_main]

use libfuzzer_sys::fuzz_target;
use limitkit::ds::IntrusiveList;
use std::collections::VecDeque;

// Fuzz IntrusiveList against a VecDeque model
//
// Handles are tracked alongside the model so move_to_front and remove can
// target live nodes.
fuzz_target!(|data: &[u8]| {
    let mut list: IntrusiveList<u32> = IntrusiveList::new();
    let mut model: VecDeque<u32> = VecDeque::new();
    let mut live = Vec::new();
    let mut next = 0u32;

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 6;
        let pick = usize::from(pair[1]);

        match op {
            0 => {
                let id = list.push_front(next);
                model.push_front(next);
                live.push((id, next));
                next += 1;
            }
            1 => {
                let id = list.push_back(next);
                model.push_back(next);
                live.push((id, next));
                next += 1;
            }
            2 => {
                let popped = list.pop_front();
                assert_eq!(popped, model.pop_front());
                if let Some(v) = popped {
                    live.retain(|(_, lv)| *lv != v);
                }
            }
            3 => {
                let popped = list.pop_back();
                assert_eq!(popped, model.pop_back());
                if let Some(v) = popped {
                    live.retain(|(_, lv)| *lv != v);
                }
            }
            4 => {
                if !live.is_empty() {
                    let (id, v) = live[pick % live.len()];
                    assert!(list.move_to_front(id));
                    let pos = model.iter().position(|x| *x == v).unwrap();
                    model.remove(pos);
                    model.push_front(v);
                    assert_eq!(list.front(), Some(&v));
                }
            }
            _ => {
                if !live.is_empty() {
                    let (id, v) = live.swap_remove(pick % live.len());
                    assert_eq!(list.remove(id), Some(v));
                    let pos = model.iter().position(|x| *x == v).unwrap();
                    model.remove(pos);
                }
            }
        }

        assert_eq!(list.len(), model.len());
        assert!(list.iter().copied().eq(model.iter().copied()));
        assert!(list.check_invariants().is_ok());
    }
});
