//! Slot arena with stable index handles.
//!
//! Values live in a `Vec<Option<T>>`; freed slots are recycled through a free
//! list so a long-lived structure does not grow past its peak occupancy.
//! A [`SlotId`] is a plain index: it owns nothing, so structures built on the
//! arena (see [`IntrusiveList`](crate::ds::IntrusiveList)) can link nodes to
//! each other without reference cycles.
//!
//! ```text
//!   slots:     [ Some(a) | None | Some(c) | Some(d) ]
//!                  0        1       2         3
//!   free_list: [ 1 ]
//!
//!   insert(e) -> SlotId(1)   (reuses the freed slot)
//! ```
//!
//! A `SlotId` is only meaningful for the arena that issued it, and only until
//! the slot is removed. After removal the index may be handed out again.

/// Stable handle into a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of `T` addressed by [`SlotId`].
///
/// # Example
///
/// ```
/// use limitkit::ds::SlotArena;
///
/// let mut arena = SlotArena::new();
/// let a = arena.insert("a");
/// let b = arena.insert("b");
///
/// assert_eq!(arena.remove(a), Some("a"));
/// let c = arena.insert("c");
///
/// // The freed slot is recycled.
/// assert_eq!(a.index(), c.index());
/// assert_eq!(arena.get(b), Some(&"b"));
/// assert_eq!(arena.len(), 2);
/// ```
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx].is_none());
                self.slots[idx] = Some(value);
                idx
            },
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Frees the slot and returns its value, or `None` if it was already free.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    #[inline]
    pub fn contains(&self, id: SlotId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value. Previously issued handles become invalid.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    /// Iterates occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1u32);
        let b = arena.insert(2u32);

        assert_eq!(arena.get(a), Some(&1));
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = SlotArena::with_capacity(4);
        let ids: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();

        arena.remove(ids[1]);
        arena.remove(ids[2]);

        let x = arena.insert(10);
        let y = arena.insert(11);
        let mut reused = vec![x.index(), y.index()];
        reused.sort_unstable();
        assert_eq!(reused, vec![1, 2]);

        // No free slot left: next insert appends.
        assert_eq!(arena.insert(12).index(), 4);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut arena = SlotArena::new();
        let id = arena.insert(String::from("old"));
        if let Some(v) = arena.get_mut(id) {
            v.push_str("-new");
        }
        assert_eq!(arena.get(id).map(String::as_str), Some("old-new"));
    }

    #[test]
    fn out_of_range_handles_are_absent() {
        let mut arena: SlotArena<u8> = SlotArena::new();
        let bogus = SlotId(42);
        assert!(arena.get(bogus).is_none());
        assert!(arena.get_mut(bogus).is_none());
        assert!(arena.remove(bogus).is_none());
        assert!(!arena.contains(bogus));
    }

    #[test]
    fn clear_and_iter() {
        let mut arena = SlotArena::new();
        let a = arena.insert('a');
        arena.insert('b');
        arena.remove(a);

        let live: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec!['b']);

        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.iter().count(), 0);
        assert_eq!(arena.insert('c').index(), 0);
    }
}
