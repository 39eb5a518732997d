//! # Address table and bus pointers.
//!
//! The address table maps each bus id to exactly one container. A bus whose
//! address policy is `Single` has one address at most; every id resolves to
//! it, and binding it under a different id is a contract violation. A [`BusPtr`]
//! is a counted reference to one of those containers: creating or cloning it
//! calls `add_ref`, dropping it calls `release`. When the last pointer goes
//! away and the container holds no handlers, the container is retired from
//! the table.
//!
//! ```text
//! BusPtr::drop
//!   └─ release() == last holder?
//!        ├─ no  ─► keep
//!        └─ yes ─► container empty? ─► yes ─► remove from table (same Rc only)
//!                                    └─ no  ─► keep
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::containers::HandlerContainer;
use crate::error::ContractViolation;
use crate::policies::{ContractGuard, HandlerPolicy};

use super::config::BusConfig;
use super::traits::{BusContainer, BusTraits};

pub(crate) type Shared<T> = Rc<RefCell<BusContainer<T>>>;

/// Address table shared by a bus and all pointers it handed out.
pub(crate) struct Context<T: BusTraits> {
    pub(crate) config: BusConfig,
    buses: RefCell<HashMap<T::BusId, Shared<T>>>,
    dispatching: RefCell<Vec<T::BusId>>,
}

impl<T: BusTraits> Context<T> {
    pub(crate) fn new(config: BusConfig) -> Self {
        Self {
            config,
            buses: RefCell::new(HashMap::new()),
            dispatching: RefCell::new(Vec::new()),
        }
    }

    /// Container answering to `id`. Without addressing every id resolves to
    /// the one global address.
    pub(crate) fn find(&self, id: &T::BusId) -> Option<Shared<T>> {
        let buses = self.buses.borrow();
        if T::ADDRESS_POLICY.has_id() {
            buses.get(id).cloned()
        } else {
            buses.values().next().cloned()
        }
    }

    pub(crate) fn find_or_create(&self, id: T::BusId) -> Shared<T> {
        if let Some(existing) = self.find(&id) {
            if !T::ADDRESS_POLICY.has_id() {
                let container = existing.borrow();
                let current = container.bus_id();
                ContractGuard::new(self.config.violation, current).check(*current == id, |bus| {
                    ContractViolation::SingleAddress {
                        bus,
                        id: format!("{id:?}"),
                    }
                });
            }
            return existing;
        }

        let container = Rc::new(RefCell::new(HandlerContainer::with_options(
            id.clone(),
            self.config.violation,
            self.config.slot_reservation().unwrap_or(0),
        )));
        tracing::debug!(
            bus = self.config.name,
            id = ?id,
            policy = T::handler_policy().as_label(),
            "address created"
        );
        self.buses.borrow_mut().insert(id, Rc::clone(&container));
        container
    }

    /// Snapshot of all containers, in broadcast order.
    pub(crate) fn snapshot(&self) -> Vec<Shared<T>> {
        let mut all: Vec<Shared<T>> = self.buses.borrow().values().cloned().collect();
        if T::ADDRESS_POLICY.is_ordered() {
            all.sort_by(|a, b| T::bus_id_order(a.borrow().bus_id(), b.borrow().bus_id()));
        }
        all
    }

    pub(crate) fn enter_dispatch(&self, id: T::BusId) {
        self.dispatching.borrow_mut().push(id);
    }

    pub(crate) fn leave_dispatch(&self) {
        self.dispatching.borrow_mut().pop();
    }

    /// Innermost address being dispatched.
    pub(crate) fn current_dispatch(&self) -> Option<T::BusId> {
        self.dispatching.borrow().last().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.buses.borrow().len()
    }

    /// Removes `container` from the table if it is retirable and still the
    /// registered container for its id.
    pub(crate) fn retire(&self, container: &Shared<T>) {
        let removed = {
            let c = container.borrow();
            if !c.is_retirable() {
                return;
            }
            let mut buses = self.buses.borrow_mut();
            let registered = buses
                .get(c.bus_id())
                .is_some_and(|existing| Rc::ptr_eq(existing, container));
            if registered {
                buses.remove(c.bus_id())
            } else {
                None
            }
        };
        if removed.is_some() {
            tracing::debug!(
                bus = self.config.name,
                id = ?container.borrow().bus_id(),
                "address retired"
            );
        }
    }
}

/// Counted reference to one bus address.
///
/// Holding a `BusPtr` keeps the address alive even when it has no handlers.
/// Dispatching through a cached pointer skips the id lookup.
pub struct BusPtr<T: BusTraits> {
    container: Shared<T>,
    context: Weak<Context<T>>,
}

impl<T: BusTraits> BusPtr<T> {
    pub(crate) fn acquire(container: Shared<T>, context: &Rc<Context<T>>) -> Self {
        container.borrow().add_ref();
        Self {
            container,
            context: Rc::downgrade(context),
        }
    }

    pub(crate) fn container(&self) -> &Shared<T> {
        &self.container
    }

    /// Id of the address.
    pub fn bus_id(&self) -> T::BusId {
        self.container.borrow().bus_id().clone()
    }

    /// Handler policy of the address.
    pub fn policy(&self) -> HandlerPolicy {
        self.container.borrow().policy()
    }

    /// Number of handlers linked on the address.
    pub fn handler_count(&self) -> usize {
        self.container.borrow().len()
    }

    /// Number of holders of the address (this pointer included).
    pub fn ref_count(&self) -> u32 {
        self.container.borrow().ref_count()
    }

    /// True if both pointers reference the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.container, &other.container)
    }
}

impl<T: BusTraits> Clone for BusPtr<T> {
    fn clone(&self) -> Self {
        self.container.borrow().add_ref();
        Self {
            container: Rc::clone(&self.container),
            context: Weak::clone(&self.context),
        }
    }
}

impl<T: BusTraits> Drop for BusPtr<T> {
    fn drop(&mut self) {
        let last = self.container.borrow().release();
        if last {
            if let Some(context) = self.context.upgrade() {
                context.retire(&self.container);
            }
        }
    }
}

impl<T: BusTraits> fmt::Debug for BusPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BusPtr")
            .field(&*self.container.borrow())
            .finish()
    }
}
