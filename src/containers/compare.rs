//! # Handler ordering for `Ordered` containers.
//!
//! An [`Ordered`](super::Ordered) container is parameterized by a comparator
//! type implementing [`HandlerCompare`]. The comparator is resolved at compile
//! time: each comparator gives a distinct container type.
//!
//! The order key is captured once, when the handler is inserted. Handlers are
//! stored as weak references, so the container never has to upgrade a handler
//! to find its position.
//!
//! [`CompareDefault`] is the sentinel comparator. It asks the handler itself
//! through the [`Compare`] trait and sorts ascending.
//!
//! ## Example
//! ```
//! use handlerbus::{Compare, HandlerCompare};
//!
//! trait Listener: Compare<Order = i32> {
//!     fn priority(&self) -> i32;
//! }
//!
//! /// Highest priority first.
//! struct ByPriorityDesc;
//!
//! impl HandlerCompare<dyn Listener> for ByPriorityDesc {
//!     type Key = i32;
//!     fn key(handler: &dyn Listener) -> i32 { handler.priority() }
//!     fn less(left: &i32, right: &i32) -> bool { left > right }
//! }
//! ```

/// Strict weak ordering over handlers of type `H`.
///
/// `less` must be irreflexive and transitive. A comparator that is not a
/// strict weak ordering leaves the dispatch order unspecified.
pub trait HandlerCompare<H: ?Sized> {
    /// Order key captured at insertion. Stored once in the node and once in
    /// the container's sorted index.
    type Key: Clone;

    /// Extracts the order key of `handler`.
    fn key(handler: &H) -> Self::Key;

    /// True if `left` must be dispatched before `right`.
    fn less(left: &Self::Key, right: &Self::Key) -> bool;
}

/// Ordering contract used by [`CompareDefault`].
///
/// Implement it on the handler trait object (usually as a supertrait) to get
/// ascending dispatch by `order()`.
pub trait Compare {
    /// Sort key of the handler.
    type Order: Ord + Clone;

    /// Current sort key; read once when the handler connects.
    fn order(&self) -> Self::Order;
}

/// Sentinel comparator: ascending by [`Compare::order`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CompareDefault;

impl<H: Compare + ?Sized> HandlerCompare<H> for CompareDefault {
    type Key = H::Order;

    #[inline]
    fn key(handler: &H) -> Self::Key {
        handler.order()
    }

    #[inline]
    fn less(left: &Self::Key, right: &Self::Key) -> bool {
        left < right
    }
}
