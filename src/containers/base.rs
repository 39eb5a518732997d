//! # Container identity and reference counting.
//!
//! [`ContainerBase`] is shared by every handler policy. It stores the bus id the
//! container answers to and an atomic count of external holders (bus pointers,
//! connections, in-flight dispatches).
//!
//! ## Lookup adapters
//! Address tables look containers up either by a raw id or by another
//! container. Both shapes must agree:
//! - [`BusIdHash`] hashes anything that `Borrow<Id>`s to the same value;
//! - [`bus_id_eq`] compares any two `Borrow<Id>` values;
//! - `Hash`/`Eq` on [`ContainerBase`] only look at the id.
//!
//! ## Rules
//! - The bus id never changes after construction.
//! - The ref count never wraps: `release` on zero reports `None`.
//! - [`take`](ContainerBase::take) moves the count out and leaves the source at zero.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identity and ref count of one container.
pub struct ContainerBase<Id> {
    bus_id: Id,
    ref_count: AtomicU32,
}

impl<Id> ContainerBase<Id> {
    /// Creates a base for `bus_id` with a ref count of zero.
    pub fn new(bus_id: Id) -> Self {
        Self {
            bus_id,
            ref_count: AtomicU32::new(0),
        }
    }

    /// The bus id this container answers to.
    #[inline]
    pub fn bus_id(&self) -> &Id {
        &self.bus_id
    }

    /// Consumes the base and returns its bus id.
    #[inline]
    pub fn into_bus_id(self) -> Id {
        self.bus_id
    }

    /// Current number of external holders.
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Registers one more external holder.
    #[inline]
    pub fn add_ref(&self) {
        self.ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops one external holder and returns how many remain.
    ///
    /// Returns `None` (and leaves the count at zero) if there was no holder to
    /// release. The caller decides whether a remaining count of `0` retires the
    /// container; that also depends on the container holding no handlers.
    pub fn release(&self) -> Option<u32> {
        self.ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|prev| prev - 1)
    }

    /// Moves the identity and the ref count into a new base.
    ///
    /// The source keeps its bus id but its count is reset to zero, so dropping
    /// or releasing the moved-from husk cannot affect the live counter.
    pub fn take(&mut self) -> Self
    where
        Id: Clone,
    {
        let count = self.ref_count.swap(0, Ordering::AcqRel);
        Self {
            bus_id: self.bus_id.clone(),
            ref_count: AtomicU32::new(count),
        }
    }
}

impl<Id: Clone> Clone for ContainerBase<Id> {
    /// Copies the bus id. The copy is not referenced by anyone and starts at zero.
    fn clone(&self) -> Self {
        Self::new(self.bus_id.clone())
    }
}

impl<Id: fmt::Debug> fmt::Debug for ContainerBase<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBase")
            .field("bus_id", &self.bus_id)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl<Id> Borrow<Id> for ContainerBase<Id> {
    #[inline]
    fn borrow(&self) -> &Id {
        &self.bus_id
    }
}

impl<Id: Hash> Hash for ContainerBase<Id> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.bus_id.hash(state);
    }
}

impl<Id: PartialEq> PartialEq for ContainerBase<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.bus_id == other.bus_id
    }
}

impl<Id: Eq> Eq for ContainerBase<Id> {}

/// Hashes raw bus ids and containers to the same value.
///
/// ```
/// use handlerbus::{BusIdHash, ContainerBase};
///
/// let hash = BusIdHash::<u32>::new();
/// let base = ContainerBase::new(7u32);
/// assert_eq!(hash.hash(&7u32), hash.hash(&base));
/// ```
pub struct BusIdHash<Id: ?Sized, S = RandomState> {
    state: S,
    _id: PhantomData<fn(&Id)>,
}

impl<Id: ?Sized> BusIdHash<Id, RandomState> {
    /// Creates a hasher with a fresh random state.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<Id: ?Sized> Default for BusIdHash<Id, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: ?Sized, S: BuildHasher> BusIdHash<Id, S> {
    /// Creates a hasher on top of an existing build hasher.
    pub fn with_hasher(state: S) -> Self {
        Self {
            state,
            _id: PhantomData,
        }
    }

    /// Hashes the bus id behind `key`.
    pub fn hash<K>(&self, key: &K) -> u64
    where
        Id: Hash,
        K: Borrow<Id> + ?Sized,
    {
        self.state.hash_one(key.borrow())
    }
}

/// Compares the bus ids behind any two keys (raw ids or containers).
///
/// ```
/// use handlerbus::{bus_id_eq, ContainerBase};
///
/// let a = ContainerBase::new(3u8);
/// assert!(bus_id_eq::<u8, _, _>(&a, &3u8));
/// assert!(bus_id_eq::<u8, _, _>(&3u8, &a));
/// ```
pub fn bus_id_eq<Id, A, B>(left: &A, right: &B) -> bool
where
    Id: PartialEq + ?Sized,
    A: Borrow<Id> + ?Sized,
    B: Borrow<Id> + ?Sized,
{
    left.borrow() == right.borrow()
}
