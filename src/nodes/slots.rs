//! # Index-linked slot arena.
//!
//! [`LinkedSlots`] is a doubly linked list whose links are slot indices instead
//! of pointers. Nodes live in one dense `Vec`; erased slots go on a free list
//! and are reused by later inserts, so steady-state connect/disconnect does not
//! allocate.
//!
//! ```text
//!  slots: [ 0 ][ 1 ][ 2 ][ 3 ]        free: [2]
//!           │    ▲ │         ▲
//!  head ────┘    │ └─────────┘ tail
//!        next:0→1→3   prev:3→1→0
//! ```
//!
//! ## Rules
//! - Every occupied slot is reachable from `head` by following `next`.
//! - Removing a slot bumps its generation; keys taken before the removal stop
//!   resolving.
//! - Navigation (`next`/`prev`) from a stale key returns `None`.
//! - A slot whose generation reaches `u32::MAX` is retired instead of reused,
//!   so generations never wrap and a stale key can never alias a new node.
//! - The arena addresses at most `u32::MAX` slots (checked in debug builds).

use super::NodeKey;

struct Link<T> {
    value: T,
    prev: Option<u32>,
    next: Option<u32>,
}

struct Slot<T> {
    generation: u32,
    link: Option<Link<T>>,
}

/// Doubly linked list stored in a slot arena.
pub(crate) struct LinkedSlots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> LinkedSlots<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Links `value` in front of the current head.
    pub(crate) fn push_front(&mut self, value: T) -> NodeKey {
        let index = self.alloc(value);
        let old_head = self.head;
        if let Some(link) = self.link_mut(index) {
            link.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(link) = self.link_mut(h) {
                    link.prev = Some(index);
                }
            }
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
        self.key_at(index)
    }

    /// Links `value` after the current tail.
    pub(crate) fn push_back(&mut self, value: T) -> NodeKey {
        let index = self.alloc(value);
        let old_tail = self.tail;
        if let Some(link) = self.link_mut(index) {
            link.prev = old_tail;
        }
        match old_tail {
            Some(t) => {
                if let Some(link) = self.link_mut(t) {
                    link.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        self.key_at(index)
    }

    /// Links `value` immediately before `at`.
    ///
    /// Falls back to [`push_back`](Self::push_back) when `at` no longer resolves.
    pub(crate) fn insert_before(&mut self, at: NodeKey, value: T) -> NodeKey {
        let Some(at_index) = self.resolve(at) else {
            return self.push_back(value);
        };
        let prev = self.link(at_index).and_then(|l| l.prev);

        let index = self.alloc(value);
        if let Some(link) = self.link_mut(index) {
            link.prev = prev;
            link.next = Some(at_index);
        }
        if let Some(link) = self.link_mut(at_index) {
            link.prev = Some(index);
        }
        match prev {
            Some(p) => {
                if let Some(link) = self.link_mut(p) {
                    link.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.len += 1;
        self.key_at(index)
    }

    /// Unlinks the node addressed by `key` and returns its value.
    ///
    /// Returns `None` for stale or foreign keys.
    pub(crate) fn remove(&mut self, key: NodeKey) -> Option<T> {
        let index = self.resolve(key)?;
        let slot = &mut self.slots[index as usize];
        let link = slot.link.take()?;
        let reusable = match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                true
            }
            None => false,
        };

        match link.prev {
            Some(p) => {
                if let Some(prev) = self.link_mut(p) {
                    prev.next = link.next;
                }
            }
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => {
                if let Some(next) = self.link_mut(n) {
                    next.prev = link.prev;
                }
            }
            None => self.tail = link.prev,
        }

        if reusable {
            self.free.push(index);
        }
        self.len -= 1;
        Some(link.value)
    }

    pub(crate) fn get(&self, key: NodeKey) -> Option<&T> {
        self.resolve(key)
            .and_then(|i| self.link(i))
            .map(|l| &l.value)
    }

    #[inline]
    pub(crate) fn contains(&self, key: NodeKey) -> bool {
        self.resolve(key).is_some()
    }

    pub(crate) fn first(&self) -> Option<NodeKey> {
        self.head.map(|i| self.key_at(i))
    }

    pub(crate) fn last(&self) -> Option<NodeKey> {
        self.tail.map(|i| self.key_at(i))
    }

    pub(crate) fn next(&self, key: NodeKey) -> Option<NodeKey> {
        let index = self.resolve(key)?;
        self.link(index)?.next.map(|i| self.key_at(i))
    }

    pub(crate) fn prev(&self, key: NodeKey) -> Option<NodeKey> {
        let index = self.resolve(key)?;
        self.link(index)?.prev.map(|i| self.key_at(i))
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn alloc(&mut self, value: T) -> u32 {
        let link = Link {
            value,
            prev: None,
            next: None,
        };
        if let Some(index) = self.free.pop() {
            self.slots[index as usize].link = Some(link);
            return index;
        }
        debug_assert!(
            self.slots.len() < u32::MAX as usize,
            "slot arena exhausted: {} slots",
            self.slots.len()
        );
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            link: Some(link),
        });
        index
    }

    fn resolve(&self, key: NodeKey) -> Option<u32> {
        let slot = self.slots.get(key.index())?;
        (slot.generation == key.generation() && slot.link.is_some()).then_some(key.raw_index())
    }

    fn key_at(&self, index: u32) -> NodeKey {
        NodeKey::new(index, self.slots[index as usize].generation)
    }

    fn link(&self, index: u32) -> Option<&Link<T>> {
        self.slots.get(index as usize)?.link.as_ref()
    }

    fn link_mut(&mut self, index: u32) -> Option<&mut Link<T>> {
        self.slots.get_mut(index as usize)?.link.as_mut()
    }
}
