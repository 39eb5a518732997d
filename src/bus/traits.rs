//! # Compile-time bus configuration.
//!
//! [`BusTraits`] describes one kind of bus: the handler interface, how
//! addresses are identified and laid out, and which storage each address
//! uses. Everything here is resolved at compile time; a `Bus<T>` for a given
//! `T` has no runtime policy branching.
//!
//! ## Example
//! ```
//! use std::cmp::Ordering;
//! use handlerbus::{AddressPolicy, BusTraits, Multiple};
//!
//! trait AssetEvents {
//!     fn on_loaded(&self, path: &str);
//! }
//!
//! struct AssetBus;
//!
//! impl BusTraits for AssetBus {
//!     type Handler = dyn AssetEvents;
//!     type BusId = u64;
//!     type Storage = Multiple<dyn AssetEvents>;
//!     const ADDRESS_POLICY: AddressPolicy = AddressPolicy::ByIdAndOrdered;
//!
//!     fn bus_id_order(left: &u64, right: &u64) -> Ordering {
//!         left.cmp(right)
//!     }
//! }
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use crate::containers::{HandlerContainer, HandlerStorage};
use crate::policies::{AddressPolicy, HandlerPolicy};

/// Static description of a bus.
pub trait BusTraits: Sized + 'static {
    /// Handler interface, usually a trait object (`dyn MyEvents`).
    type Handler: ?Sized + 'static;

    /// Address identity. Use `()` with [`AddressPolicy::Single`].
    type BusId: Clone + Eq + Hash + fmt::Debug + 'static;

    /// Storage of each address; selects the [`HandlerPolicy`].
    type Storage: HandlerStorage<Self::Handler> + 'static;

    /// Layout of addresses.
    const ADDRESS_POLICY: AddressPolicy = AddressPolicy::Single;

    /// Order of addresses in broadcasts when the address policy is
    /// [`AddressPolicy::ByIdAndOrdered`]. `Less` is visited first.
    fn bus_id_order(left: &Self::BusId, right: &Self::BusId) -> Ordering {
        let _ = (left, right);
        Ordering::Equal
    }

    /// Handler policy implied by [`Storage`](Self::Storage).
    fn handler_policy() -> HandlerPolicy {
        <Self::Storage as HandlerStorage<Self::Handler>>::POLICY
    }
}

/// Container type used for every address of bus `T`.
pub type BusContainer<T> =
    HandlerContainer<<T as BusTraits>::BusId, <T as BusTraits>::Handler, <T as BusTraits>::Storage>;
