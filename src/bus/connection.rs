//! # Handler connections.
//!
//! A [`Connection`] is returned by [`Bus::connect`](crate::Bus::connect) and
//! plays the role of the node a subscriber embeds: it remembers the node key
//! and keeps the address alive through a [`BusPtr`]. Dropping it disconnects.

use std::fmt;

use crate::nodes::NodeKey;

use super::ptr::BusPtr;
use super::traits::BusTraits;

/// Link between one handler and one bus address.
pub struct Connection<T: BusTraits> {
    ptr: Option<BusPtr<T>>,
    key: NodeKey,
}

impl<T: BusTraits> Connection<T> {
    pub(crate) fn new(ptr: BusPtr<T>, key: NodeKey) -> Self {
        Self {
            ptr: Some(ptr),
            key,
        }
    }

    /// True while the handler is still linked on its address.
    ///
    /// Turns false after [`disconnect`](Self::disconnect), and also when a
    /// tolerated double connect on a `Single` address replaced this handler.
    pub fn is_connected(&self) -> bool {
        self.ptr
            .as_ref()
            .is_some_and(|ptr| ptr.container().borrow().contains(self.key))
    }

    /// Id of the address, `None` once disconnected.
    pub fn bus_id(&self) -> Option<T::BusId> {
        self.ptr.as_ref().map(BusPtr::bus_id)
    }

    /// Node key of the handler on its address.
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Unlinks the handler and releases the address. Idempotent.
    ///
    /// Safe to call from inside a handler while the address is dispatching.
    pub fn disconnect(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        {
            let mut container = ptr.container().borrow_mut();
            if container.contains(self.key) {
                container.erase(self.key);
            }
        }
        tracing::trace!(id = ?ptr.bus_id(), key = ?self.key, "handler disconnected");
    }
}

impl<T: BusTraits> Drop for Connection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T: BusTraits> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("bus_id", &self.bus_id())
            .field("key", &self.key)
            .field("connected", &self.is_connected())
            .finish()
    }
}
