//! # Multi-handler storage.
//!
//! [`Multiple`] keeps handlers in an index-linked list and always links new
//! handlers at the **front**. A dispatch that already started holds a cursor
//! further down the list, so a handler connected from inside a handler is not
//! called for the message in flight, only for the next one.
//!
//! ```text
//! insert(h3) ─► [h3] ⇄ [h2] ⇄ [h1]
//!                ▲
//!               head (dispatch starts here)
//! ```
//!
//! ## Rules
//! - Insert and erase are O(1); freed slots are reused.
//! - Erasing an unknown or stale key is a no-op.
//! - No ordering promise beyond "newest first".

use std::fmt;
use std::sync::{Arc, Weak};

use crate::nodes::{LinkedSlots, NodeKey};
use crate::policies::HandlerPolicy;

use super::{sealed, HandlerStorage};

/// Storage for any number of handlers, newest first.
pub struct Multiple<H: ?Sized> {
    nodes: LinkedSlots<Weak<H>>,
}

impl<H: ?Sized> sealed::Sealed for Multiple<H> {}

impl<H: ?Sized> HandlerStorage<H> for Multiple<H> {
    const POLICY: HandlerPolicy = HandlerPolicy::Multiple;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: LinkedSlots::with_capacity(capacity),
        }
    }

    #[inline]
    fn can_insert(&self) -> bool {
        true
    }

    fn insert(&mut self, handler: &Arc<H>) -> NodeKey {
        self.nodes.push_front(Arc::downgrade(handler))
    }

    fn erase(&mut self, key: NodeKey) -> bool {
        self.nodes.remove(key).is_some()
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn get(&self, key: NodeKey) -> Option<&Weak<H>> {
        self.nodes.get(key)
    }

    fn first(&self) -> Option<NodeKey> {
        self.nodes.first()
    }

    fn last(&self) -> Option<NodeKey> {
        self.nodes.last()
    }

    fn next(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.next(key)
    }

    fn prev(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.prev(key)
    }
}

impl<H: ?Sized> fmt::Debug for Multiple<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiple")
            .field("len", &self.nodes.len())
            .finish()
    }
}
