//! # HandlerContainer: one bus address.
//!
//! [`HandlerContainer`] owns the node storage of one address and exposes the
//! uniform surface used by the dispatch layer: `insert`, `erase`, `len`,
//! forward/reverse iteration, and the base's `add_ref`/`release`.
//!
//! ## Dispatch cursors
//! A dispatch cannot keep a borrow of the container while it calls handlers,
//! because handlers may connect or disconnect on the same address. Instead it
//! opens a cursor, which the container keeps up to date:
//!
//! ```text
//! open_cursor()          cursor.next = first
//! advance()  ─► (key, weak)   cursor.next = next(key)
//!   handler runs, calls erase(k):
//!     k == cursor.next   ─► cursor.next = next(k) before unlinking
//!     k == visited node  ─► nothing to do, cursor already moved on
//! close_cursor()
//! ```
//!
//! Inserting never moves a cursor. A node linked during a dispatch is visited
//! by that dispatch only if it lands behind the cursor's next node:
//! `Multiple` links at the front, so never; `Ordered` links by key, so only
//! when the new key sorts after the node the cursor visits next.
//!
//! ## Rules
//! - `Single`: a second insert and a mismatched erase are contract violations.
//! - `Multiple` / `Ordered`: erasing an unknown key is a silent no-op.
//! - Nothing here locks. Mutation of one container must be serialized by the
//!   caller; only the ref count is atomic.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::error::ContractViolation;
use crate::nodes::NodeKey;
use crate::policies::{ContractGuard, HandlerPolicy, ViolationMode};

use super::{ContainerBase, HandlerStorage};

/// Identifies a dispatch cursor opened on one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorId(usize);

#[derive(Clone, Copy, Debug)]
struct Cursor {
    next: Option<NodeKey>,
    reverse: bool,
}

/// Handlers connected to one bus address.
pub struct HandlerContainer<Id, H: ?Sized, S> {
    base: ContainerBase<Id>,
    storage: S,
    violation: ViolationMode,
    cursors: Vec<Option<Cursor>>,
    _handler: PhantomData<fn(&H)>,
}

impl<Id, H, S> HandlerContainer<Id, H, S>
where
    Id: fmt::Debug,
    H: ?Sized,
    S: HandlerStorage<H>,
{
    /// Creates an empty container with the default violation mode.
    pub fn new(bus_id: Id) -> Self {
        Self::with_options(bus_id, ViolationMode::default(), 0)
    }

    /// Creates an empty container.
    ///
    /// - `violation`: how broken preconditions are reported
    /// - `capacity`: node slots to reserve up front (`0` = grow on demand)
    pub fn with_options(bus_id: Id, violation: ViolationMode, capacity: usize) -> Self {
        Self {
            base: ContainerBase::new(bus_id),
            storage: S::with_capacity(capacity),
            violation,
            cursors: Vec::new(),
            _handler: PhantomData,
        }
    }

    /// Handler policy of the storage.
    #[inline]
    pub fn policy(&self) -> HandlerPolicy {
        S::POLICY
    }

    /// The bus id this container answers to.
    #[inline]
    pub fn bus_id(&self) -> &Id {
        self.base.bus_id()
    }

    /// Identity and ref count.
    #[inline]
    pub fn base(&self) -> &ContainerBase<Id> {
        &self.base
    }

    /// Underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ---------------------------
    // Ref counting
    // ---------------------------

    /// Registers one more external holder.
    #[inline]
    pub fn add_ref(&self) {
        self.base.add_ref();
    }

    /// Drops one external holder. Returns true when no holder remains.
    ///
    /// Releasing more often than `add_ref` was called is a contract violation;
    /// when tolerated the count stays at zero and `false` is returned.
    pub fn release(&self) -> bool {
        match self.base.release() {
            Some(remaining) => remaining == 0,
            None => {
                self.guard()
                    .check(false, |bus| ContractViolation::RefCountUnderflow { bus });
                false
            }
        }
    }

    /// Current number of external holders.
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.base.ref_count()
    }

    /// True if nobody holds the container and it has no handlers.
    ///
    /// Both conditions are tracked independently; an address table may only
    /// destroy the container once both hold.
    #[inline]
    pub fn is_retirable(&self) -> bool {
        self.ref_count() == 0 && self.is_empty()
    }

    // ---------------------------
    // Handlers
    // ---------------------------

    /// Connects `handler` and returns its node key.
    ///
    /// On a `Single` container that already has a handler this is a contract
    /// violation. If the violation is tolerated, the new handler replaces the
    /// old one and the old key goes stale.
    pub fn insert(&mut self, handler: &Arc<H>) -> NodeKey {
        let accepted = self.guard().check(self.storage.can_insert(), |bus| {
            ContractViolation::AlreadyConnected { bus }
        });
        if !accepted {
            if let Some(old) = self.storage.first() {
                self.unlink(old);
            }
        }
        let key = self.storage.insert(handler);
        tracing::trace!(bus = ?self.base.bus_id(), policy = S::POLICY.as_label(), ?key, "handler linked");
        key
    }

    /// Disconnects the handler stored under `key`. Returns true if a node was
    /// removed.
    ///
    /// Safe to call while dispatch cursors are open on this container,
    /// including for the node a cursor is about to visit.
    pub fn erase(&mut self, key: NodeKey) -> bool {
        if self.unlink(key) {
            tracing::trace!(bus = ?self.base.bus_id(), ?key, "handler unlinked");
            return true;
        }
        if S::POLICY.allows_many() {
            tracing::trace!(bus = ?self.base.bus_id(), ?key, "erase of unknown handler ignored");
        } else {
            self.guard()
                .check(false, |bus| ContractViolation::MismatchedErase { bus });
        }
        false
    }

    /// Number of linked handlers (expired ones included).
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// True if no handler is linked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// True if `key` addresses a linked handler.
    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.storage.get(key).is_some()
    }

    /// Handle stored under `key`.
    #[inline]
    pub fn get(&self, key: NodeKey) -> Option<&Weak<H>> {
        self.storage.get(key)
    }

    /// First key in dispatch order.
    #[inline]
    pub fn first(&self) -> Option<NodeKey> {
        self.storage.first()
    }

    /// Last key in dispatch order.
    #[inline]
    pub fn last(&self) -> Option<NodeKey> {
        self.storage.last()
    }

    /// Key after `key` in dispatch order.
    #[inline]
    pub fn next(&self, key: NodeKey) -> Option<NodeKey> {
        self.storage.next(key)
    }

    /// Key before `key` in dispatch order.
    #[inline]
    pub fn prev(&self, key: NodeKey) -> Option<NodeKey> {
        self.storage.prev(key)
    }

    /// Iterates `(key, handle)` pairs in dispatch order.
    ///
    /// Use `.rev()` for reverse dispatch order.
    pub fn iter(&self) -> Iter<'_, H, S> {
        Iter {
            storage: &self.storage,
            front: self.storage.first(),
            back: self.storage.last(),
            remaining: self.storage.len(),
            _handler: PhantomData,
        }
    }

    /// Iterates the live handlers in dispatch order, skipping expired ones.
    pub fn handlers(&self) -> impl DoubleEndedIterator<Item = Arc<H>> + '_ {
        self.iter().filter_map(|(_, weak)| weak.upgrade())
    }

    // ---------------------------
    // Dispatch cursors
    // ---------------------------

    /// Opens a cursor at the first (or, with `reverse`, the last) handler.
    pub fn open_cursor(&mut self, reverse: bool) -> CursorId {
        let start = if reverse {
            self.storage.last()
        } else {
            self.storage.first()
        };
        let cursor = Cursor {
            next: start,
            reverse,
        };
        match self.cursors.iter().position(Option::is_none) {
            Some(i) => {
                self.cursors[i] = Some(cursor);
                CursorId(i)
            }
            None => {
                self.cursors.push(Some(cursor));
                CursorId(self.cursors.len() - 1)
            }
        }
    }

    /// Returns the handler under the cursor and moves the cursor on.
    ///
    /// `None` once the cursor ran past the end or was closed.
    pub fn advance(&mut self, id: CursorId) -> Option<(NodeKey, Weak<H>)> {
        let cursor = self.cursors.get_mut(id.0)?.as_mut()?;
        let key = cursor.next?;
        let handler = self.storage.get(key)?.clone();
        cursor.next = if cursor.reverse {
            self.storage.prev(key)
        } else {
            self.storage.next(key)
        };
        Some((key, handler))
    }

    /// Closes a cursor opened with [`open_cursor`](Self::open_cursor).
    pub fn close_cursor(&mut self, id: CursorId) {
        if let Some(slot) = self.cursors.get_mut(id.0) {
            *slot = None;
        }
        while matches!(self.cursors.last(), Some(None)) {
            self.cursors.pop();
        }
    }

    /// Number of dispatches currently iterating this container.
    pub fn active_cursors(&self) -> usize {
        self.cursors.iter().flatten().count()
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn guard(&self) -> ContractGuard<'_> {
        ContractGuard::new(self.violation, self.base.bus_id())
    }

    /// Moves cursors off `key`, then unlinks it.
    fn unlink(&mut self, key: NodeKey) -> bool {
        if self.storage.get(key).is_none() {
            return false;
        }
        for cursor in self.cursors.iter_mut().flatten() {
            if cursor.next == Some(key) {
                cursor.next = if cursor.reverse {
                    self.storage.prev(key)
                } else {
                    self.storage.next(key)
                };
            }
        }
        self.storage.erase(key)
    }
}

impl<Id, H, S> fmt::Debug for HandlerContainer<Id, H, S>
where
    Id: fmt::Debug,
    H: ?Sized,
    S: HandlerStorage<H>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContainer")
            .field("bus_id", self.base.bus_id())
            .field("policy", &S::POLICY)
            .field("len", &self.len())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// Double-ended iterator over `(key, handle)` pairs of a container.
pub struct Iter<'a, H: ?Sized, S> {
    storage: &'a S,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
    _handler: PhantomData<fn(&H)>,
}

impl<'a, H: ?Sized + 'a, S: HandlerStorage<H>> Iterator for Iter<'a, H, S> {
    type Item = (NodeKey, &'a Weak<H>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let storage = self.storage;
        let key = self.front?;
        let handler = storage.get(key)?;
        self.front = storage.next(key);
        self.remaining -= 1;
        Some((key, handler))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, H: ?Sized + 'a, S: HandlerStorage<H>> DoubleEndedIterator for Iter<'a, H, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let storage = self.storage;
        let key = self.back?;
        let handler = storage.get(key)?;
        self.back = storage.prev(key);
        self.remaining -= 1;
        Some((key, handler))
    }
}

impl<'a, H: ?Sized + 'a, S: HandlerStorage<H>> ExactSizeIterator for Iter<'a, H, S> {}
