//! # Ordered multi-handler storage.
//!
//! [`Ordered`] keeps handlers sorted by a comparator `C`. Each node stores the
//! weak handle plus the order key captured at insertion. Nodes are linked like
//! in [`Multiple`](super::Multiple) for O(1) navigation; a `BTreeMap` index
//! keyed by `(order key, insertion sequence)` finds the neighbour of a new node
//! and the index entry of an erased one in O(log n).
//!
//! ## Equal keys
//! Every insert takes the next sequence number and the index breaks ties on
//! it, so handlers that compare equal are visited in connection order (stable
//! FIFO).
//!
//! ```text
//! insert A(5), B(1), C(5)  ─►  [B(1)] ⇄ [A(5)] ⇄ [C(5)]
//! index: (1,#1)→B  (5,#0)→A  (5,#2)→C
//! ```
//!
//! ## Rules
//! - Iteration front to back is non-decreasing under `C::less`.
//! - Erasing an unknown or stale key is a no-op.
//! - The key is not refreshed; a handler whose priority changes must reconnect.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Bound;
use std::sync::{Arc, Weak};

use crate::nodes::{LinkedSlots, NodeKey};
use crate::policies::HandlerPolicy;

use super::{sealed, CompareDefault, HandlerCompare, HandlerStorage};

struct OrderedNode<H: ?Sized, K> {
    handler: Weak<H>,
    key: K,
    seq: u64,
}

/// Index entry: order key first (by `C::less`), insertion sequence second.
struct Position<H: ?Sized, C: HandlerCompare<H>> {
    key: C::Key,
    seq: u64,
    _compare: PhantomData<fn(&H) -> C>,
}

impl<H: ?Sized, C: HandlerCompare<H>> Position<H, C> {
    fn new(key: C::Key, seq: u64) -> Self {
        Self {
            key,
            seq,
            _compare: PhantomData,
        }
    }
}

impl<H: ?Sized, C: HandlerCompare<H>> Ord for Position<H, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        if C::less(&self.key, &other.key) {
            Ordering::Less
        } else if C::less(&other.key, &self.key) {
            Ordering::Greater
        } else {
            self.seq.cmp(&other.seq)
        }
    }
}

impl<H: ?Sized, C: HandlerCompare<H>> PartialOrd for Position<H, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<H: ?Sized, C: HandlerCompare<H>> PartialEq for Position<H, C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<H: ?Sized, C: HandlerCompare<H>> Eq for Position<H, C> {}

/// Storage for any number of handlers sorted by `C`.
pub struct Ordered<H: ?Sized, C: HandlerCompare<H> = CompareDefault> {
    nodes: LinkedSlots<OrderedNode<H, C::Key>>,
    index: BTreeMap<Position<H, C>, NodeKey>,
    next_seq: u64,
}

impl<H: ?Sized, C: HandlerCompare<H>> Ordered<H, C> {
    /// Order key captured when `key` was inserted.
    pub fn order_key(&self, key: NodeKey) -> Option<&C::Key> {
        self.nodes.get(key).map(|n| &n.key)
    }
}

impl<H: ?Sized, C: HandlerCompare<H>> sealed::Sealed for Ordered<H, C> {}

impl<H: ?Sized, C: HandlerCompare<H>> HandlerStorage<H> for Ordered<H, C> {
    const POLICY: HandlerPolicy = HandlerPolicy::MultipleAndOrdered;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: LinkedSlots::with_capacity(capacity),
            index: BTreeMap::new(),
            next_seq: 0,
        }
    }

    #[inline]
    fn can_insert(&self) -> bool {
        true
    }

    fn insert(&mut self, handler: &Arc<H>) -> NodeKey {
        let seq = self.next_seq;
        self.next_seq += 1;

        let position = Position::new(C::key(handler.as_ref()), seq);
        let successor = self
            .index
            .range((Bound::Excluded(&position), Bound::Unbounded))
            .next()
            .map(|(_, at)| *at);

        let node = OrderedNode {
            handler: Arc::downgrade(handler),
            key: position.key.clone(),
            seq,
        };
        let node_key = match successor {
            Some(at) => self.nodes.insert_before(at, node),
            None => self.nodes.push_back(node),
        };
        self.index.insert(position, node_key);
        node_key
    }

    fn erase(&mut self, key: NodeKey) -> bool {
        let Some(node) = self.nodes.remove(key) else {
            return false;
        };
        self.index.remove(&Position::new(node.key, node.seq));
        true
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn get(&self, key: NodeKey) -> Option<&Weak<H>> {
        self.nodes.get(key).map(|n| &n.handler)
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

impl<H: ?Sized, C: HandlerCompare<H>> fmt::Debug for Ordered<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ordered")
            .field("len", &self.nodes.len())
            .field("compare", &std::any::type_name::<C>())
            .finish()
    }
}
