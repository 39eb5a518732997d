//! # handlerbus
//!
//! **handlerbus** provides the handler containers behind an in-process event
//! bus: one container per bus address, holding the handlers connected to it.
//!
//! Containers are the storage layer only. They link and unlink handlers, keep
//! a deterministic dispatch order, count external references so an address
//! can be retired once nobody uses it, and tolerate handlers that connect or
//! disconnect while a dispatch is iterating them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bus<T: BusTraits>                                          │
//! │  - address table: BusId ─► Rc<RefCell<HandlerContainer>>    │
//! │  - bind / connect / event / broadcast / enumerate           │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │ Container #1 │      │ Container #2 │      │ Container #3 │
//! │ ContainerBase│      │ ContainerBase│      │ ContainerBase│
//! │  bus_id, rc  │      │  bus_id, rc  │      │  bus_id, rc  │
//! │ Single       │      │ Multiple     │      │ Ordered<C>   │
//! │  (0..=1)     │      │  newest first│      │  by C::less  │
//! └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!        ▼                     ▼                     ▼
//!    Weak<H>            Weak<H> ─ Weak<H>     Weak<H> ─ Weak<H>
//! ```
//!
//! ### Lifecycle of an address
//! ```text
//! bind(id) / connect(id, h) ──► find_or_create ──► add_ref
//!
//!   dispatch:  BusPtr held ─► open cursor ─► advance ─► handler runs
//!                                              ▲            │
//!                                              └────────────┘ (erase fixes cursors)
//!
//! drop(BusPtr) / drop(Connection) ──► release
//!   └─ ref_count == 0 && no handlers ──► retire from the table
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                                  |
//! |-----------------|----------------------------------------------------------|-----------------------------------------------------|
//! | **Containers**  | Per-address handler storage with fixed dispatch order.   | [`HandlerContainer`], [`HandlerStorage`]            |
//! | **Policies**    | One handler, many handlers, or many in comparator order. | [`Single`], [`Multiple`], [`Ordered`]               |
//! | **Ordering**    | Comparator adapters over a handler-supplied key.         | [`HandlerCompare`], [`Compare`], [`CompareDefault`] |
//! | **Identity**    | Bus id plus atomic ref count; hash/eq by id.             | [`ContainerBase`], [`BusIdHash`], [`bus_id_eq`]     |
//! | **Bus**         | Address table, connections and dispatch.                 | [`Bus`], [`BusTraits`], [`BusPtr`], [`Connection`]  |
//! | **Errors**      | Contract violations and how they are reported.           | [`ContractViolation`], [`ViolationMode`]            |
//! | **Config**      | Runtime settings applied to each new address.            | [`BusConfig`]                                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use handlerbus::{AddressPolicy, Bus, BusConfig, BusTraits, Compare, Ordered};
//!
//! trait Input: Compare<Order = i32> {
//!     fn key(&self, code: u32) -> bool;
//! }
//!
//! struct InputBus;
//! impl BusTraits for InputBus {
//!     type Handler = dyn Input;
//!     type BusId = ();
//!     type Storage = Ordered<dyn Input>;
//!     const ADDRESS_POLICY: AddressPolicy = AddressPolicy::Single;
//! }
//!
//! struct Layer(i32);
//! impl Compare for Layer {
//!     type Order = i32;
//!     fn order(&self) -> i32 { self.0 }
//! }
//! impl Input for Layer {
//!     fn key(&self, _code: u32) -> bool { self.0 == 0 }
//! }
//!
//! let bus = Bus::<InputBus>::new(BusConfig::named("input"));
//! let menu: Arc<dyn Input> = Arc::new(Layer(0));
//! let game: Arc<dyn Input> = Arc::new(Layer(10));
//! let _game = bus.connect((), &game);
//! let _menu = bus.connect((), &menu);
//!
//! // The menu layer sorts first and consumes the key.
//! let consumed = !bus.enumerate_handlers(|h| !h.key(27));
//! assert!(consumed);
//! ```
mod bus;
mod containers;
mod error;
mod nodes;
mod policies;

// ---- Public re-exports ----

pub use bus::{Bus, BusConfig, BusContainer, BusPtr, BusTraits, Connection};
pub use containers::{
    bus_id_eq, BusIdHash, Compare, CompareDefault, ContainerBase, CursorId, HandlerCompare,
    HandlerContainer, HandlerStorage, Iter, Multiple, Ordered, Single,
};
pub use error::ContractViolation;
pub use nodes::NodeKey;
pub use policies::{AddressPolicy, HandlerPolicy, ViolationMode};
