//! Doubly linked list whose nodes live in a [`SlotArena`].
//!
//! Nodes are linked by [`SlotId`] instead of pointers. The arena owns every
//! node; a node only stores the indices of its neighbours, so unlinking and
//! relinking are a handful of index writes and there is no `unsafe` and no
//! `Rc`/`RefCell` cycle.
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬──────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next }           │
//!   ├────────┼──────────────────────────────────────┤
//!   │ 0      │ { A, prev: None,    next: Some(2) }  │
//!   │ 1      │ { C, prev: Some(2), next: None    }  │
//!   │ 2      │ { B, prev: Some(0), next: Some(1) }  │
//!   └────────┴──────────────────────────────────────┘
//!
//!   head ─► [0] ◄──► [2] ◄──► [1] ◄── tail
//! ```
//!
//! | Operation                     | Cost |
//! |-------------------------------|------|
//! | `push_front` / `push_back`    | O(1) |
//! | `pop_front` / `pop_back`      | O(1) |
//! | `move_to_front` / `remove`    | O(1) |
//! | `iter` / `check_invariants`   | O(n) |

use std::collections::HashSet;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Arena-backed doubly linked list with O(1) splice operations.
///
/// # Example
///
/// ```
/// use limitkit::ds::IntrusiveList;
///
/// let mut list = IntrusiveList::new();
/// let a = list.push_front("a");
/// list.push_front("b");
/// list.push_front("c");
///
/// // c, b, a -> a, c, b
/// list.move_to_front(a);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["a", "c", "b"]);
/// assert_eq!(list.pop_back(), Some("b"));
/// ```
#[derive(Debug)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` refers to a live node.
    #[inline]
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    #[inline]
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    #[inline]
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Inserts `value` at the front and returns its handle.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: None,
            next: self.head,
        });
        match self.head.and_then(|old| self.arena.get_mut(old)) {
            Some(old_head) => old_head.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        id
    }

    /// Inserts `value` at the back and returns its handle.
    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail.and_then(|old| self.arena.get_mut(old)) {
            Some(old_tail) => old_tail.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.head?;
        self.remove(id)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Unlinks `id` and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.unlink(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Moves `id` to the front. Returns `false` if `id` is not a live node.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }
        self.unlink(id);
        self.link_front(id);
        true
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Values from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// `(SlotId, &T)` pairs from front to back.
    pub fn iter_entries(&self) -> EntryIter<'_, T> {
        EntryIter {
            list: self,
            current: self.head,
        }
    }

    /// Walks the list and checks that links, head/tail and length agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() {
                return Err(InvariantError::new("list head and tail disagree on emptiness"));
            }
            if !self.arena.is_empty() {
                return Err(InvariantError::new(format!(
                    "list has no head but arena holds {} nodes",
                    self.arena.len()
                )));
            }
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(self.len());
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(InvariantError::new(format!("cycle detected at slot {}", id.index())));
            }
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| {
                    InvariantError::new(format!("dangling link to slot {}", id.index()))
                })?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "slot {} has a stale prev link",
                    id.index()
                )));
            }
            if node.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new("last reachable node is not the tail"));
            }
            prev = Some(id);
            current = node.next;
        }

        if seen.len() != self.arena.len() {
            return Err(InvariantError::new(format!(
                "{} nodes reachable from head but arena holds {}",
                seen.len(),
                self.arena.len()
            )));
        }
        Ok(())
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev, node.next)
        };

        match prev.and_then(|p| self.arena.get_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.arena.get_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        let node = self.arena.get_mut(id)?;
        node.prev = None;
        node.next = None;
        Some(())
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        } else {
            return;
        }
        match old_head.and_then(|h| self.arena.get_mut(h)) {
            Some(head_node) => head_node.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.arena.get(self.current?)?;
        self.current = node.next;
        Some(&node.value)
    }
}

pub struct EntryIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for EntryIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some((id, &node.value))
    }
}
