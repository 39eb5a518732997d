//! # Bus facade over handler containers.
//!
//! [`Bus`] owns the address table (bus id → [`HandlerContainer`](crate::HandlerContainer))
//! and drives dispatch over it. It is deliberately thin: storage, ordering and
//! reentrancy rules live in the containers.
//!
//! ## Architecture
//! ```text
//! Bus<T>
//!  └─ Rc<Context<T>>
//!       ├─ BusConfig
//!       └─ HashMap<BusId, Rc<RefCell<HandlerContainer>>>
//!                         ▲
//!   BusPtr ───────────────┤  add_ref on create/clone, release on drop
//!   Connection { BusPtr, NodeKey } ── drop ─► erase + release
//! ```
//!
//! ## Dispatch
//! ```text
//! event(id, f)
//!   ├─ find(id) ─► BusPtr (holds the address for the whole dispatch)
//!   ├─ open cursor
//!   ├─ loop: advance ─► upgrade weak ─► f(&handler)   (no borrow held)
//!   └─ close cursor, drop BusPtr ─► retire address if empty
//! ```
//!
//! ## Rules
//! - Handlers may connect and disconnect (themselves or others) from inside `f`.
//! - On `Multiple` addresses a handler connected during dispatch is called from
//!   the next message on. On `Ordered` addresses it is called by the running
//!   dispatch only if it sorts after the handler about to be visited.
//! - [`Bus::is_in_dispatch`] and [`Bus::current_bus_id`] report the innermost
//!   running dispatch.
//! - Expired handlers (dropped without disconnecting) are skipped.
//! - `Bus` is `!Send`/`!Sync`: one thread mutates a bus; nothing here locks.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use handlerbus::{Bus, BusConfig, BusTraits, Multiple};
//!
//! trait Tick {
//!     fn tick(&self, dt: f32);
//! }
//!
//! struct Clock;
//! impl BusTraits for Clock {
//!     type Handler = dyn Tick;
//!     type BusId = ();
//!     type Storage = Multiple<dyn Tick>;
//! }
//!
//! struct Printer;
//! impl Tick for Printer {
//!     fn tick(&self, dt: f32) { assert!(dt > 0.0); }
//! }
//!
//! let bus = Bus::<Clock>::new(BusConfig::named("clock"));
//! let printer: Arc<dyn Tick> = Arc::new(Printer);
//! let conn = bus.connect((), &printer);
//!
//! bus.broadcast(|h| h.tick(0.016));
//! assert!(conn.is_connected());
//!
//! drop(conn);
//! assert!(!bus.has_handlers());
//! ```

mod config;
mod connection;
mod ptr;
mod traits;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::containers::CursorId;

pub use config::BusConfig;
pub use connection::Connection;
pub use ptr::BusPtr;
pub use traits::{BusContainer, BusTraits};

use ptr::Context;

/// Single-threaded event bus over handler containers.
///
/// Cheap to clone; clones share the same address table.
pub struct Bus<T: BusTraits> {
    context: Rc<Context<T>>,
}

impl<T: BusTraits> Bus<T> {
    /// Creates an empty bus.
    pub fn new(config: BusConfig) -> Self {
        Self {
            context: Rc::new(Context::new(config)),
        }
    }

    /// Configuration of this bus.
    pub fn config(&self) -> &BusConfig {
        &self.context.config
    }

    // ---------------------------
    // Addresses
    // ---------------------------

    /// Returns a pointer to the address `id`, creating the address if needed.
    ///
    /// The address stays alive (even without handlers) while the pointer does.
    pub fn bind(&self, id: T::BusId) -> BusPtr<T> {
        BusPtr::acquire(self.context.find_or_create(id), &self.context)
    }

    /// Returns a pointer to the address `id` if it exists.
    pub fn find(&self, id: &T::BusId) -> Option<BusPtr<T>> {
        self.context
            .find(id)
            .map(|container| BusPtr::acquire(container, &self.context))
    }

    /// Number of live addresses.
    pub fn bus_count(&self) -> usize {
        self.context.len()
    }

    // ---------------------------
    // Connections
    // ---------------------------

    /// Connects `handler` to the address `id`.
    ///
    /// The bus keeps a weak reference only; the returned [`Connection`]
    /// disconnects when dropped.
    pub fn connect(&self, id: T::BusId, handler: &Arc<T::Handler>) -> Connection<T> {
        let ptr = self.bind(id);
        let key = ptr.container().borrow_mut().insert(handler);
        tracing::trace!(bus = self.context.config.name, id = ?ptr.bus_id(), ?key, "handler connected");
        Connection::new(ptr, key)
    }

    /// True if any address has at least one linked handler.
    pub fn has_handlers(&self) -> bool {
        self.context
            .snapshot()
            .iter()
            .any(|container| !container.borrow().is_empty())
    }

    /// True if the address `id` has at least one linked handler.
    pub fn has_handlers_id(&self, id: &T::BusId) -> bool {
        self.handler_count(id) > 0
    }

    /// Number of handlers linked on the address `id`.
    pub fn handler_count(&self, id: &T::BusId) -> usize {
        self.context
            .find(id)
            .map_or(0, |container| container.borrow().len())
    }

    /// Number of handlers linked across all addresses.
    pub fn total_handlers(&self) -> usize {
        self.context
            .snapshot()
            .iter()
            .map(|container| container.borrow().len())
            .sum()
    }

    /// First live handler on the address `id`, in dispatch order.
    pub fn find_first_handler(&self, id: &T::BusId) -> Option<Arc<T::Handler>> {
        let container = self.context.find(id)?;
        let first = container.borrow().handlers().next();
        first
    }

    // ---------------------------
    // Dispatch
    // ---------------------------

    /// Calls `f` on every handler of the address `id`.
    pub fn event(&self, id: &T::BusId, mut f: impl FnMut(&T::Handler)) {
        if let Some(ptr) = self.find(id) {
            dispatch(&self.context, &ptr, false, &mut |h| {
                f(h);
                true
            });
        }
    }

    /// Calls `f` on every handler of the address `id`, last to first.
    pub fn event_reverse(&self, id: &T::BusId, mut f: impl FnMut(&T::Handler)) {
        if let Some(ptr) = self.find(id) {
            dispatch(&self.context, &ptr, true, &mut |h| {
                f(h);
                true
            });
        }
    }

    /// Calls `f` on every handler of a cached address.
    pub fn event_ptr(&self, ptr: &BusPtr<T>, mut f: impl FnMut(&T::Handler)) {
        dispatch(&self.context, ptr, false, &mut |h| {
            f(h);
            true
        });
    }

    /// Calls `f` on every handler of the address `id` and returns the result
    /// of the last handler called.
    pub fn event_result<R>(&self, id: &T::BusId, mut f: impl FnMut(&T::Handler) -> R) -> Option<R> {
        let ptr = self.find(id)?;
        let mut last = None;
        dispatch(&self.context, &ptr, false, &mut |h| {
            last = Some(f(h));
            true
        });
        last
    }

    /// Like [`event_result`](Self::event_result), last handler to first.
    pub fn event_result_reverse<R>(
        &self,
        id: &T::BusId,
        mut f: impl FnMut(&T::Handler) -> R,
    ) -> Option<R> {
        let ptr = self.find(id)?;
        let mut last = None;
        dispatch(&self.context, &ptr, true, &mut |h| {
            last = Some(f(h));
            true
        });
        last
    }

    /// Like [`event_result`](Self::event_result), on a cached address.
    pub fn event_result_ptr<R>(&self, ptr: &BusPtr<T>, mut f: impl FnMut(&T::Handler) -> R) -> Option<R> {
        let mut last = None;
        dispatch(&self.context, ptr, false, &mut |h| {
            last = Some(f(h));
            true
        });
        last
    }

    /// Calls `f` on every handler of every address.
    ///
    /// With [`AddressPolicy::ByIdAndOrdered`](crate::AddressPolicy::ByIdAndOrdered)
    /// addresses are visited in `bus_id_order`; otherwise in unspecified order.
    pub fn broadcast(&self, mut f: impl FnMut(&T::Handler)) {
        for ptr in self.addresses(false) {
            dispatch(&self.context, &ptr, false, &mut |h| {
                f(h);
                true
            });
        }
    }

    /// Broadcasts `f` and returns the result of the last handler called.
    pub fn broadcast_result<R>(&self, mut f: impl FnMut(&T::Handler) -> R) -> Option<R> {
        let mut last = None;
        for ptr in self.addresses(false) {
            dispatch(&self.context, &ptr, false, &mut |h| {
                last = Some(f(h));
                true
            });
        }
        last
    }

    /// Like [`broadcast`](Self::broadcast), with addresses and handlers in
    /// reverse order.
    pub fn broadcast_reverse(&self, mut f: impl FnMut(&T::Handler)) {
        for ptr in self.addresses(true) {
            dispatch(&self.context, &ptr, true, &mut |h| {
                f(h);
                true
            });
        }
    }

    /// Calls `f` on handlers of every address until it returns `false`.
    ///
    /// Returns `false` if the enumeration was stopped early.
    pub fn enumerate_handlers(&self, mut f: impl FnMut(&T::Handler) -> bool) -> bool {
        for ptr in self.addresses(false) {
            if !dispatch(&self.context, &ptr, false, &mut f) {
                return false;
            }
        }
        true
    }

    /// Calls `f` on handlers of the address `id` until it returns `false`.
    ///
    /// Returns `false` if the enumeration was stopped early.
    pub fn enumerate_handlers_id(&self, id: &T::BusId, mut f: impl FnMut(&T::Handler) -> bool) -> bool {
        match self.find(id) {
            Some(ptr) => dispatch(&self.context, &ptr, false, &mut f),
            None => true,
        }
    }

    /// True while a handler of this bus is being called.
    pub fn is_in_dispatch(&self) -> bool {
        self.context.current_dispatch().is_some()
    }

    /// Id of the address whose handler is running, innermost dispatch first.
    ///
    /// `None` outside of a dispatch.
    pub fn current_bus_id(&self) -> Option<T::BusId> {
        self.context.current_dispatch()
    }

    /// Pointers to all addresses, in broadcast order.
    ///
    /// Every address is referenced before the first handler runs, so none of
    /// them can be retired mid-broadcast.
    fn addresses(&self, reverse: bool) -> Vec<BusPtr<T>> {
        let mut ptrs: Vec<BusPtr<T>> = self
            .context
            .snapshot()
            .into_iter()
            .map(|container| BusPtr::acquire(container, &self.context))
            .collect();
        if reverse {
            ptrs.reverse();
        }
        ptrs
    }
}

impl<T: BusTraits> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            context: Rc::clone(&self.context),
        }
    }
}

impl<T: BusTraits> Default for Bus<T> {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl<T: BusTraits> fmt::Debug for Bus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.context.config.name)
            .field("addresses", &self.bus_count())
            .finish()
    }
}

/// Open dispatch cursor; closed on drop, also when a handler panics.
///
/// While open, the address id sits on the bus's dispatch stack.
struct CursorGuard<'a, T: BusTraits> {
    context: &'a Context<T>,
    container: &'a RefCell<BusContainer<T>>,
    id: CursorId,
}

impl<'a, T: BusTraits> CursorGuard<'a, T> {
    fn open(context: &'a Context<T>, container: &'a RefCell<BusContainer<T>>, reverse: bool) -> Self {
        let (id, bus_id) = {
            let mut c = container.borrow_mut();
            (c.open_cursor(reverse), c.bus_id().clone())
        };
        context.enter_dispatch(bus_id);
        Self {
            context,
            container,
            id,
        }
    }

    /// Next live handler; expired handles are skipped.
    fn next_live(&self) -> Option<Arc<T::Handler>> {
        loop {
            let (key, weak) = self.container.borrow_mut().advance(self.id)?;
            match weak.upgrade() {
                Some(handler) => return Some(handler),
                None => tracing::trace!(?key, "skipping expired handler"),
            }
        }
    }
}

impl<'a, T: BusTraits> Drop for CursorGuard<'a, T> {
    fn drop(&mut self) {
        self.context.leave_dispatch();
        self.container.borrow_mut().close_cursor(self.id);
    }
}

/// Walks one address. Returns false if `visit` asked to stop.
fn dispatch<T: BusTraits>(
    context: &Context<T>,
    ptr: &BusPtr<T>,
    reverse: bool,
    visit: &mut dyn FnMut(&T::Handler) -> bool,
) -> bool {
    let cursor = CursorGuard::<T>::open(context, ptr.container(), reverse);
    while let Some(handler) = cursor.next_live() {
        if !visit(&*handler) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{Compare, Multiple, Ordered, Single};
    use crate::policies::{AddressPolicy, HandlerPolicy, ViolationMode};
    use std::cell::Cell;
    use std::cmp::Ordering;

    type Log = Rc<RefCell<Vec<&'static str>>>;
    type Slot<T> = Rc<RefCell<Option<Connection<T>>>>;

    trait Events: Compare<Order = i32> {
        fn ping(&self);
        fn name(&self) -> &'static str;
    }

    struct Recorder {
        name: &'static str,
        priority: i32,
        log: Log,
        hook: RefCell<Option<Box<dyn FnMut()>>>,
    }

    impl Compare for Recorder {
        type Order = i32;
        fn order(&self) -> i32 {
            self.priority
        }
    }

    impl Events for Recorder {
        fn ping(&self) {
            self.log.borrow_mut().push(self.name);
            if let Some(hook) = self.hook.borrow_mut().as_mut() {
                hook();
            }
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn recorder(name: &'static str, priority: i32, log: &Log) -> Arc<dyn Events> {
        Arc::new(Recorder {
            name,
            priority,
            log: Rc::clone(log),
            hook: RefCell::new(None),
        })
    }

    fn recorder_with(
        name: &'static str,
        priority: i32,
        log: &Log,
        hook: impl FnMut() + 'static,
    ) -> Arc<dyn Events> {
        Arc::new(Recorder {
            name,
            priority,
            log: Rc::clone(log),
            hook: RefCell::new(Some(Box::new(hook))),
        })
    }

    fn taken(log: &Log) -> Vec<&'static str> {
        std::mem::take(&mut *log.borrow_mut())
    }

    fn strict() -> BusConfig {
        BusConfig {
            violation: ViolationMode::Panic,
            ..BusConfig::named("test")
        }
    }

    struct Global;
    impl BusTraits for Global {
        type Handler = dyn Events;
        type BusId = ();
        type Storage = Multiple<dyn Events>;
    }

    struct GlobalOrdered;
    impl BusTraits for GlobalOrdered {
        type Handler = dyn Events;
        type BusId = ();
        type Storage = Ordered<dyn Events>;
    }

    struct ById;
    impl BusTraits for ById {
        type Handler = dyn Events;
        type BusId = u32;
        type Storage = Multiple<dyn Events>;
        const ADDRESS_POLICY: AddressPolicy = AddressPolicy::ById;
    }

    struct SingleById;
    impl BusTraits for SingleById {
        type Handler = dyn Events;
        type BusId = u32;
        type Storage = Single<dyn Events>;
        const ADDRESS_POLICY: AddressPolicy = AddressPolicy::ById;
    }

    struct Unaddressed;
    impl BusTraits for Unaddressed {
        type Handler = dyn Events;
        type BusId = u32;
        type Storage = Multiple<dyn Events>;
    }

    struct OrderedIds;
    impl BusTraits for OrderedIds {
        type Handler = dyn Events;
        type BusId = u32;
        type Storage = Ordered<dyn Events>;
        const ADDRESS_POLICY: AddressPolicy = AddressPolicy::ByIdAndOrdered;

        fn bus_id_order(left: &u32, right: &u32) -> Ordering {
            left.cmp(right)
        }
    }

    #[test]
    fn test_connect_event_disconnect() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let ca = bus.connect((), &a);
        let mut cb = bus.connect((), &b);
        assert_eq!(bus.handler_count(&()), 2);
        assert_eq!(Global::handler_policy(), HandlerPolicy::Multiple);

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["b", "a"]);

        bus.event_reverse(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["a", "b"]);

        cb.disconnect();
        assert!(!cb.is_connected());
        assert!(cb.bus_id().is_none());
        cb.disconnect();

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["a"]);

        drop(ca);
        assert!(!bus.has_handlers());
        assert_eq!(bus.bus_count(), 0);
    }

    #[test]
    fn test_connect_during_dispatch_waits_for_next_message() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let child = recorder("child", 0, &log);
        let child_conn: Slot<Global> = Rc::default();

        let parent = {
            let bus = bus.clone();
            let child = Arc::clone(&child);
            let slot = Rc::clone(&child_conn);
            recorder_with("parent", 0, &log, move || {
                if slot.borrow().is_none() {
                    *slot.borrow_mut() = Some(bus.connect((), &child));
                }
            })
        };
        let _parent_conn = bus.connect((), &parent);

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["parent"]);
        assert_eq!(bus.handler_count(&()), 2);

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["child", "parent"]);
    }

    #[test]
    fn test_disconnect_all_during_dispatch() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let conns: Rc<RefCell<Vec<Connection<Global>>>> = Rc::default();

        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);
        let killer = {
            let conns = Rc::clone(&conns);
            recorder_with("killer", 0, &log, move || conns.borrow_mut().clear())
        };

        conns.borrow_mut().push(bus.connect((), &a));
        conns.borrow_mut().push(bus.connect((), &b));
        conns.borrow_mut().push(bus.connect((), &killer));

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["killer"]);
        assert!(!bus.has_handlers());
        assert_eq!(bus.bus_count(), 0);
    }

    #[test]
    fn test_self_disconnect_defers_retirement_until_dispatch_ends() {
        let log = Log::default();
        let bus = Bus::<ById>::new(strict());
        let slot: Slot<ById> = Rc::default();
        let seen = Rc::new(Cell::new(usize::MAX));

        let h = {
            let bus = bus.clone();
            let slot = Rc::clone(&slot);
            let seen = Rc::clone(&seen);
            recorder_with("self", 0, &log, move || {
                slot.borrow_mut().take();
                seen.set(bus.bus_count());
            })
        };
        *slot.borrow_mut() = Some(bus.connect(7, &h));

        let observer = {
            let ptr = bus.find(&7).expect("address exists");
            Rc::downgrade(ptr.container())
        };

        bus.event(&7, |h| h.ping());
        assert_eq!(taken(&log), vec!["self"]);
        assert_eq!(seen.get(), 1, "address must survive while dispatch holds it");
        assert_eq!(bus.bus_count(), 0);
        assert!(observer.upgrade().is_none(), "retired container is destroyed");
    }

    #[test]
    fn test_every_handler_disconnecting_itself_is_visited_once() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let mut handlers = Vec::new();

        for name in ["x", "y", "z"] {
            let slot: Slot<Global> = Rc::default();
            let h = {
                let slot = Rc::clone(&slot);
                recorder_with(name, 0, &log, move || {
                    slot.borrow_mut().take();
                })
            };
            *slot.borrow_mut() = Some(bus.connect((), &h));
            handlers.push((h, slot));
        }

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["z", "y", "x"]);
        assert_eq!(bus.total_handlers(), 0);
    }

    #[test]
    fn test_bound_pointer_keeps_empty_address() {
        let log = Log::default();
        let bus = Bus::<ById>::new(strict());
        let h = recorder("h", 0, &log);

        let ptr = bus.bind(3);
        assert_eq!(ptr.ref_count(), 1);
        assert_eq!(ptr.policy(), HandlerPolicy::Multiple);
        assert!(!bus.has_handlers());
        assert!(!bus.has_handlers_id(&3));
        assert_eq!(bus.bus_count(), 1);

        let conn = bus.connect(3, &h);
        assert_eq!(ptr.ref_count(), 2);
        assert!(bus.find(&3).expect("address exists").ptr_eq(&ptr));
        assert_eq!(conn.bus_id(), Some(3));

        bus.event_ptr(&ptr, |h| h.ping());
        assert_eq!(taken(&log), vec!["h"]);

        drop(conn);
        assert_eq!(bus.bus_count(), 1, "pointer still holds the address");
        assert_eq!(ptr.ref_count(), 1);

        let copy = ptr.clone();
        assert_eq!(copy.ref_count(), 2);
        drop(copy);
        drop(ptr);
        assert_eq!(bus.bus_count(), 0);
    }

    #[test]
    fn test_addresses_are_independent() {
        let log = Log::default();
        let bus = Bus::<ById>::new(strict());
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let _ca = bus.connect(1, &a);
        let _cb = bus.connect(2, &b);
        assert_eq!(bus.bus_count(), 2);

        bus.event(&1, |h| h.ping());
        assert_eq!(taken(&log), vec!["a"]);

        bus.event(&3, |h| h.ping());
        assert!(taken(&log).is_empty());
        assert_eq!(bus.bus_count(), 2, "event on a missing id creates nothing");

        let mut all = {
            bus.broadcast(|h| h.ping());
            taken(&log)
        };
        all.sort_unstable();
        assert_eq!(all, vec!["a", "b"]);
        assert_eq!(bus.total_handlers(), 2);
    }

    #[test]
    #[should_panic(expected = "already connected")]
    fn test_single_address_rejects_second_handler() {
        let log = Log::default();
        let bus = Bus::<SingleById>::new(strict());
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let _ca = bus.connect(1, &a);
        let _cb = bus.connect(1, &b);
    }

    #[test]
    fn test_single_address_tolerated_replacement() {
        let log = Log::default();
        let bus = Bus::<SingleById>::new(BusConfig {
            violation: ViolationMode::Ignore,
            ..BusConfig::default()
        });
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let ca = bus.connect(1, &a);
        let cb = bus.connect(1, &b);
        assert!(!ca.is_connected());
        assert!(cb.is_connected());

        bus.event(&1, |h| h.ping());
        assert_eq!(taken(&log), vec!["b"]);

        // stale connection must not unlink the replacement
        drop(ca);
        assert_eq!(bus.handler_count(&1), 1);
        drop(cb);
        assert_eq!(bus.bus_count(), 0);
    }

    #[test]
    fn test_single_addresses_by_id() {
        let log = Log::default();
        let bus = Bus::<SingleById>::new(strict());
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let _ca = bus.connect(1, &a);
        let _cb = bus.connect(2, &b);
        assert_eq!(bus.handler_count(&1), 1);
        assert_eq!(bus.handler_count(&2), 1);
        assert_eq!(bus.find_first_handler(&2).map(|h| h.name()), Some("b"));
    }

    #[test]
    fn test_ordered_handlers_priority_scenario() {
        let log = Log::default();
        let bus = Bus::<GlobalOrdered>::new(strict());
        let a = recorder("A", 5, &log);
        let b = recorder("B", 1, &log);
        let c = recorder("C", 5, &log);

        let _conns = [bus.connect((), &a), bus.connect((), &b), bus.connect((), &c)];

        bus.event(&(), |h| h.ping());
        let order = taken(&log);
        assert_eq!(order[0], "B");
        assert!(order[1..].contains(&"A") && order[1..].contains(&"C"));
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_ordered_addresses_broadcast_in_id_order() {
        let log = Log::default();
        let bus = Bus::<OrderedIds>::new(strict());
        let b20 = recorder("b20", 1, &log);
        let a10 = recorder("a10", 2, &log);
        let z10 = recorder("z10", 1, &log);
        let c30 = recorder("c30", 0, &log);

        let _conns = [
            bus.connect(20, &b20),
            bus.connect(10, &a10),
            bus.connect(30, &c30),
            bus.connect(10, &z10),
        ];

        bus.broadcast(|h| h.ping());
        assert_eq!(taken(&log), vec!["z10", "a10", "b20", "c30"]);

        bus.broadcast_reverse(|h| h.ping());
        assert_eq!(taken(&log), vec!["c30", "b20", "a10", "z10"]);
    }

    #[test]
    fn test_disconnect_whole_address_during_broadcast() {
        let log = Log::default();
        let bus = Bus::<OrderedIds>::new(strict());
        let conns10: Rc<RefCell<Vec<Connection<OrderedIds>>>> = Rc::default();

        let x = {
            let conns = Rc::clone(&conns10);
            recorder_with("x", 0, &log, move || conns.borrow_mut().clear())
        };
        let y = recorder("y", 1, &log);
        let z = recorder("z", 0, &log);

        conns10.borrow_mut().push(bus.connect(10, &x));
        conns10.borrow_mut().push(bus.connect(10, &y));
        let _cz = bus.connect(20, &z);

        bus.broadcast(|h| h.ping());
        assert_eq!(taken(&log), vec!["x", "z"]);
        assert_eq!(bus.bus_count(), 1);
        assert_eq!(bus.total_handlers(), 1);
    }

    #[test]
    fn test_event_result_enumerate_and_find_first() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);
        let _ca = bus.connect((), &a);
        let _cb = bus.connect((), &b);

        assert_eq!(bus.event_result(&(), |h| h.name()), Some("a"));
        assert_eq!(bus.find_first_handler(&()).map(|h| h.name()), Some("b"));

        let mut visited = 0;
        let finished = bus.enumerate_handlers(|_| {
            visited += 1;
            false
        });
        assert!(!finished);
        assert_eq!(visited, 1);

        let mut names = Vec::new();
        assert!(bus.enumerate_handlers_id(&(), |h| {
            names.push(h.name());
            true
        }));
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_event_result_without_address_is_none() {
        let bus = Bus::<ById>::default();
        assert_eq!(bus.event_result(&1, |h| h.name()), None);
        assert!(bus.enumerate_handlers_id(&1, |_| false));
    }

    #[test]
    fn test_dropped_handler_is_skipped() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let keep = recorder("keep", 0, &log);
        let temp = recorder("temp", 0, &log);

        let _ck = bus.connect((), &keep);
        let conn = bus.connect((), &temp);
        drop(temp);

        bus.event(&(), |h| h.ping());
        assert_eq!(taken(&log), vec!["keep"]);
        assert_eq!(bus.handler_count(&()), 2, "node stays until disconnected");

        drop(conn);
        assert_eq!(bus.handler_count(&()), 1);
    }

    #[test]
    fn test_cursor_closed_when_handler_panics() {
        let log = Log::default();
        let bus = Bus::<Global>::new(strict());
        let boom = recorder_with("boom", 0, &log, || panic!("handler failed"));
        let _c = bus.connect((), &boom);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.event(&(), |h| h.ping());
        }));
        assert!(result.is_err());

        let ptr = bus.find(&()).expect("address exists");
        assert_eq!(ptr.container().borrow().active_cursors(), 0);
        assert_eq!(ptr.ref_count(), 2, "dispatch pointer was released");
    }

    #[test]
    fn test_single_address_policy_routes_every_id_to_one_address() {
        let log = Log::default();
        let bus = Bus::<Unaddressed>::new(BusConfig {
            violation: ViolationMode::Ignore,
            ..BusConfig::named("global")
        });
        let a = recorder("a", 0, &log);
        let b = recorder("b", 0, &log);

        let ca = bus.connect(1, &a);
        let cb = bus.connect(2, &b);
        assert_eq!(bus.bus_count(), 1);
        assert_eq!(cb.bus_id(), Some(1));
        assert_eq!(bus.handler_count(&2), 2);

        bus.event(&7, |h| h.ping());
        assert_eq!(taken(&log), vec!["b", "a"]);

        drop((ca, cb));
        assert_eq!(bus.bus_count(), 0);
    }

    #[test]
    #[should_panic(expected = "single address")]
    fn test_single_address_policy_rejects_second_id() {
        let log = Log::default();
        let bus = Bus::<Unaddressed>::new(strict());
        let a = recorder("a", 0, &log);

        let _first = bus.connect(1, &a);
        let _same = bus.connect(1, &a);
        let _other = bus.bind(2);
    }

    #[test]
    fn test_dispatch_introspection_tracks_nested_addresses() {
        let log = Log::default();
        let bus = Bus::<ById>::new(strict());
        let seen: Rc<RefCell<Vec<(bool, Option<u32>)>>> = Rc::default();

        let inner = {
            let bus = bus.clone();
            let seen = Rc::clone(&seen);
            recorder_with("inner", 0, &log, move || {
                seen.borrow_mut().push((bus.is_in_dispatch(), bus.current_bus_id()));
            })
        };
        let outer = {
            let bus = bus.clone();
            let seen = Rc::clone(&seen);
            recorder_with("outer", 0, &log, move || {
                seen.borrow_mut().push((bus.is_in_dispatch(), bus.current_bus_id()));
                bus.event(&2, |h| h.ping());
                seen.borrow_mut().push((bus.is_in_dispatch(), bus.current_bus_id()));
            })
        };
        let _co = bus.connect(1, &outer);
        let _ci = bus.connect(2, &inner);

        assert!(!bus.is_in_dispatch());
        assert_eq!(bus.current_bus_id(), None);

        bus.event(&1, |h| h.ping());
        assert_eq!(taken(&log), vec!["outer", "inner"]);
        assert_eq!(
            *seen.borrow(),
            vec![(true, Some(1)), (true, Some(2)), (true, Some(1))]
        );
        assert!(!bus.is_in_dispatch());
        assert_eq!(bus.current_bus_id(), None);
    }

    #[test]
    fn test_dispatch_stack_unwinds_on_panic() {
        let log = Log::default();
        let bus = Bus::<ById>::new(strict());
        let boom = recorder_with("boom", 0, &log, || panic!("handler failed"));
        let _c = bus.connect(4, &boom);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.event(&4, |h| h.ping());
        }));
        assert!(result.is_err());
        assert!(!bus.is_in_dispatch());
    }

    #[test]
    fn test_result_variants_return_last_handler_called() {
        let log = Log::default();
        let bus = Bus::<OrderedIds>::new(strict());
        let lo = recorder("lo", 0, &log);
        let hi = recorder("hi", 9, &log);
        let other = recorder("other", 0, &log);

        let _conns = [bus.connect(1, &hi), bus.connect(1, &lo), bus.connect(5, &other)];

        assert_eq!(bus.event_result(&1, |h| h.name()), Some("hi"));
        assert_eq!(bus.event_result_reverse(&1, |h| h.name()), Some("lo"));
        assert_eq!(bus.event_result_reverse(&3, |h| h.name()), None);

        let ptr = bus.bind(1);
        assert_eq!(bus.event_result_ptr(&ptr, |h| h.name()), Some("hi"));

        assert_eq!(bus.broadcast_result(|h| h.name()), Some("other"));
        let mut calls = 0;
        assert_eq!(
            bus.broadcast_result(|_| {
                calls += 1;
                calls
            }),
            Some(3)
        );
    }

    #[test]
    fn test_broadcast_result_on_empty_bus_is_none() {
        let bus = Bus::<Global>::default();
        assert_eq!(bus.broadcast_result(|h| h.name()), None);
    }
}
