//! # Runtime bus configuration.
//!
//! Provides [`BusConfig`], the settings a [`Bus`](crate::Bus) applies to every
//! address it creates.
//!
//! ## Sentinel values
//! - `slot_capacity = 0` → node slots grow on demand (no reservation)

use crate::policies::ViolationMode;

/// Settings for a bus instance.
///
/// ## Field semantics
/// - `name`: label attached to log events of this bus
/// - `violation`: how container contract violations are reported
/// - `slot_capacity`: node slots reserved per new address (`0` = on demand)
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Label used in log events.
    pub name: &'static str,

    /// Reporting of contract violations (double connect, mismatched erase,
    /// ref count underflow).
    pub violation: ViolationMode,

    /// Node slots reserved when an address is created.
    ///
    /// - `0` = no reservation
    /// - `n > 0` = the first `n` connections on an address do not allocate
    pub slot_capacity: usize,
}

impl BusConfig {
    /// Default configuration with a custom log label.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Returns the slot reservation as an `Option`.
    ///
    /// - `None` → grow on demand
    /// - `Some(n)` → reserve `n` slots per address
    #[inline]
    pub fn slot_reservation(&self) -> Option<usize> {
        if self.slot_capacity == 0 {
            None
        } else {
            Some(self.slot_capacity)
        }
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `name = "bus"`
    /// - `violation = ViolationMode::default()` (panic in debug, log in release)
    /// - `slot_capacity = 0` (grow on demand)
    fn default() -> Self {
        Self {
            name: "bus",
            violation: ViolationMode::default(),
            slot_capacity: 0,
        }
    }
}
