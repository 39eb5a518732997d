//! # Single-handler storage.
//!
//! [`Single`] holds at most one handler and no arena. The only state besides
//! the weak handle is a generation counter that advances on every insert and
//! erase, so a key taken for a previous connection never matches again.
//!
//! ## Rules
//! - `len()` is derived from slot occupancy (0 or 1); there is no counter.
//! - Inserting while occupied is a precondition violation, checked by the
//!   owning [`HandlerContainer`](super::HandlerContainer).
//! - Erasing a key that is not the connected handler leaves state untouched.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::nodes::NodeKey;
use crate::policies::HandlerPolicy;

use super::{sealed, HandlerStorage};

/// Storage for at most one handler.
pub struct Single<H: ?Sized> {
    handler: Option<Weak<H>>,
    generation: u32,
}

impl<H: ?Sized> Single<H> {
    #[inline]
    fn current_key(&self) -> NodeKey {
        NodeKey::new(0, self.generation)
    }
}

impl<H: ?Sized> sealed::Sealed for Single<H> {}

impl<H: ?Sized> HandlerStorage<H> for Single<H> {
    const POLICY: HandlerPolicy = HandlerPolicy::Single;

    fn with_capacity(_capacity: usize) -> Self {
        Self {
            handler: None,
            generation: 0,
        }
    }

    #[inline]
    fn can_insert(&self) -> bool {
        self.handler.is_none()
    }

    fn insert(&mut self, handler: &Arc<H>) -> NodeKey {
        self.generation = self.generation.wrapping_add(1);
        self.handler = Some(Arc::downgrade(handler));
        self.current_key()
    }

    fn erase(&mut self, key: NodeKey) -> bool {
        if self.get(key).is_none() {
            return false;
        }
        self.handler = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    #[inline]
    fn len(&self) -> usize {
        usize::from(self.handler.is_some())
    }

    fn get(&self, key: NodeKey) -> Option<&Weak<H>> {
        self.handler.as_ref().filter(|_| key == self.current_key())
    }

    fn first(&self) -> Option<NodeKey> {
        self.handler.as_ref().map(|_| self.current_key())
    }

    fn last(&self) -> Option<NodeKey> {
        self.first()
    }

    fn next(&self, _key: NodeKey) -> Option<NodeKey> {
        None
    }

    fn prev(&self, _key: NodeKey) -> Option<NodeKey> {
        None
    }
}

impl<H: ?Sized> fmt::Debug for Single<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Single")
            .field("connected", &self.handler.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_erase_empties() {
        let h = Arc::new(1u8);
        let mut s = Single::<u8>::with_capacity(0);
        assert!(s.can_insert());

        let key = s.insert(&h);
        assert_eq!(s.len(), 1);
        assert!(!s.can_insert());
        assert_eq!(s.first(), Some(key));
        assert_eq!(s.last(), Some(key));
        assert!(s.next(key).is_none());

        assert!(s.erase(key));
        assert_eq!(s.len(), 0);
        assert!(s.first().is_none());
    }

    #[test]
    fn test_old_key_never_matches_new_connection() {
        let h = Arc::new(1u8);
        let mut s = Single::<u8>::with_capacity(0);
        let old = s.insert(&h);
        s.erase(old);
        let new = s.insert(&h);

        assert_ne!(old, new);
        assert!(s.get(old).is_none());
        assert!(!s.erase(old));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_erase_on_empty_is_rejected() {
        let mut s = Single::<u8>::with_capacity(0);
        assert!(!s.erase(NodeKey::new(0, 0)));
    }
}
