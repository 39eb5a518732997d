//! # Generational node handle.
//!
//! [`NodeKey`] is what a subscriber holds on to after connecting: an index into
//! the container's slot storage plus the generation the slot had at insertion.
//! Once the node is erased the slot's generation moves on, so an old key can
//! never address a handler that was connected later in the same slot.

/// Handle to a connected handler inside one container.
///
/// Keys are only meaningful for the container that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    index: u32,
    generation: u32,
}

impl NodeKey {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the container.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Slot generation captured when the handler was inserted.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) fn raw_index(&self) -> u32 {
        self.index
    }
}
