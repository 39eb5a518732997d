//! # Handler containers.
//!
//! A handler container holds the handlers connected to **one** bus address.
//! It is made of two parts:
//!
//! - [`ContainerBase`]: bus id + atomic ref count, shared by every policy;
//! - a storage implementing [`HandlerStorage`]: [`Single`], [`Multiple`] or
//!   [`Ordered`], chosen at compile time.
//!
//! [`HandlerContainer`] glues them together, checks preconditions and keeps
//! track of in-flight dispatch cursors.
//!
//! ## Architecture
//! ```text
//! HandlerContainer<Id, H, S>
//!   ├─ ContainerBase<Id>      bus_id, ref_count (AtomicU32)
//!   ├─ S: HandlerStorage<H>
//!   │    ├─ Single<H>         Option<Weak<H>>          (0..=1)
//!   │    ├─ Multiple<H>       LinkedSlots<Weak<H>>     (newest first)
//!   │    └─ Ordered<H, C>     LinkedSlots<(Weak<H>, C::Key)> + sorted index
//!   └─ cursors                positions of dispatches in progress
//! ```
//!
//! ## Ownership
//! Containers store `Weak<H>` only. A handler owns itself; dropping it without
//! disconnecting leaves an expired node that iteration can skip.

mod base;
mod compare;
mod container;
mod multiple;
mod ordered;
mod single;

use std::sync::{Arc, Weak};

use crate::nodes::NodeKey;
use crate::policies::HandlerPolicy;

pub use base::{bus_id_eq, BusIdHash, ContainerBase};
pub use compare::{Compare, CompareDefault, HandlerCompare};
pub use container::{CursorId, HandlerContainer, Iter};
pub use multiple::Multiple;
pub use ordered::Ordered;
pub use single::Single;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Storage strategy behind a [`HandlerContainer`].
///
/// Sealed: the set of policies is closed ([`Single`], [`Multiple`],
/// [`Ordered`]). Navigation works on [`NodeKey`]s; a stale key resolves to
/// nothing.
pub trait HandlerStorage<H: ?Sized>: sealed::Sealed + Sized {
    /// Policy implemented by this storage.
    const POLICY: HandlerPolicy;

    /// Creates an empty storage. `capacity` is a slot reservation hint.
    fn with_capacity(capacity: usize) -> Self;

    /// False if inserting now would break the storage's handler limit.
    fn can_insert(&self) -> bool;

    /// Links `handler` and returns its key.
    fn insert(&mut self, handler: &Arc<H>) -> NodeKey;

    /// Unlinks the node addressed by `key`. Returns false if `key` is unknown.
    fn erase(&mut self, key: NodeKey) -> bool;

    /// Number of linked nodes, expired handlers included.
    fn len(&self) -> usize;

    /// Handle stored under `key`.
    fn get(&self, key: NodeKey) -> Option<&Weak<H>>;

    /// First node in dispatch order.
    fn first(&self) -> Option<NodeKey>;

    /// Last node in dispatch order.
    fn last(&self) -> Option<NodeKey>;

    /// Node after `key` in dispatch order.
    fn next(&self, key: NodeKey) -> Option<NodeKey>;

    /// Node before `key` in dispatch order.
    fn prev(&self, key: NodeKey) -> Option<NodeKey>;
}
