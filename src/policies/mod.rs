//! Bus policies.
//!
//! This module groups the knobs that decide **how many** handlers an address
//! can hold, **how** addresses are laid out, and **what happens** when a caller
//! breaks a container precondition.
//!
//! ## Contents
//! - [`HandlerPolicy`]  one handler / many handlers / many handlers in order
//! - [`AddressPolicy`]  one global address / addresses by id / addresses by id in order
//! - [`ViolationMode`]  panic / log / ignore on contract violations
//!
//! ## Quick wiring
//! ```text
//! BusTraits { type Storage, const ADDRESS_POLICY }
//!      └─► Storage::POLICY           reports the HandlerPolicy (compile time)
//!      └─► Bus uses ADDRESS_POLICY   to order broadcasts across addresses
//! BusConfig { violation }
//!      └─► every container created by the bus reports violations through it
//! ```
//!
//! ## Defaults
//! - `HandlerPolicy::Multiple` / `AddressPolicy::Single` (a plain global bus).
//! - `ViolationMode::Panic` in debug builds, `ViolationMode::Log` otherwise.

mod address;
mod handler;
mod violation;

pub use address::AddressPolicy;
pub use handler::HandlerPolicy;
pub(crate) use violation::ContractGuard;
pub use violation::ViolationMode;
