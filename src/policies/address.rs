//! # Address policies.
//!
//! [`AddressPolicy`] describes how many addresses a bus has:
//!
//! - [`AddressPolicy::Single`] one global address; the bus id is `()`.
//! - [`AddressPolicy::ById`] one container per bus id; broadcast order is unspecified.
//! - [`AddressPolicy::ByIdAndOrdered`] like `ById`, but broadcasts visit addresses
//!   sorted by `BusTraits::bus_id_order`.

/// How addresses on a bus are organized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressPolicy {
    /// A single global address.
    Single,
    /// Addresses are looked up by id.
    ById,
    /// Addresses are looked up by id and broadcast in id order.
    ByIdAndOrdered,
}

impl Default for AddressPolicy {
    /// Returns [`AddressPolicy::Single`].
    fn default() -> Self {
        AddressPolicy::Single
    }
}

impl AddressPolicy {
    /// True if handlers connect to a specific id rather than the global address.
    #[inline]
    pub fn has_id(&self) -> bool {
        !matches!(self, AddressPolicy::Single)
    }

    /// True if broadcasts must respect the bus id ordering.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        matches!(self, AddressPolicy::ByIdAndOrdered)
    }
}
