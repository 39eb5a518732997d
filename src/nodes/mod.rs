//! Handler node storage.
//!
//! Connected handlers are not boxed one by one. Each container keeps its nodes
//! in a slot arena and hands out a [`NodeKey`] per connection:
//!
//! - [`NodeKey`] generational handle held by the subscriber side
//! - `LinkedSlots` index-linked list with a free list (crate-internal)

mod key;
mod slots;

pub use key::NodeKey;
pub(crate) use slots::LinkedSlots;
