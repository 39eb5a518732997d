//! # Contract violation handling.
//!
//! Container preconditions (single handler per `Single` address, matching
//! erase, balanced ref counting) are programmer errors. They are never
//! returned to the caller. Instead each container checks them through a
//! [`ContractGuard`] which applies the bus-wide [`ViolationMode`]:
//!
//! ```text
//! check(ok = false, violation)
//!   ├─ Panic  ─► panic!("{violation}")
//!   ├─ Log    ─► tracing::error!(label, bus, ...) and carry on
//!   └─ Ignore ─► carry on
//! ```

use std::fmt;

use crate::error::ContractViolation;

/// What to do when a container precondition is broken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationMode {
    /// Fail fast. Matches an assertion in a debug build.
    Panic,
    /// Emit an `error` event through `tracing` and tolerate the violation.
    Log,
    /// Tolerate the violation silently.
    Ignore,
}

impl Default for ViolationMode {
    /// Returns [`ViolationMode::Panic`] when debug assertions are enabled,
    /// [`ViolationMode::Log`] otherwise.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ViolationMode::Panic
        } else {
            ViolationMode::Log
        }
    }
}

/// Precondition checker bound to one container.
pub(crate) struct ContractGuard<'a> {
    mode: ViolationMode,
    bus: &'a dyn fmt::Debug,
}

impl<'a> ContractGuard<'a> {
    pub(crate) fn new(mode: ViolationMode, bus: &'a dyn fmt::Debug) -> Self {
        Self { mode, bus }
    }

    /// Returns `ok`. When `ok` is false the violation built by `violation` is
    /// reported according to the mode.
    pub(crate) fn check(
        &self,
        ok: bool,
        violation: impl FnOnce(String) -> ContractViolation,
    ) -> bool {
        if ok {
            return true;
        }
        let violation = violation(format!("{:?}", self.bus));
        match self.mode {
            ViolationMode::Panic => panic!("{violation}"),
            ViolationMode::Log => {
                tracing::error!(
                    label = violation.as_label(),
                    bus = ?self.bus,
                    "{}",
                    violation.as_message()
                );
            }
            ViolationMode::Ignore => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        let guard = ContractGuard::new(ViolationMode::Panic, &7u32);
        assert!(guard.check(true, |bus| ContractViolation::AlreadyConnected { bus }));
    }

    #[test]
    #[should_panic(expected = "already connected")]
    fn test_panic_mode_panics() {
        let guard = ContractGuard::new(ViolationMode::Panic, &7u32);
        guard.check(false, |bus| ContractViolation::AlreadyConnected { bus });
    }

    #[test]
    fn test_log_and_ignore_tolerate() {
        for mode in [ViolationMode::Log, ViolationMode::Ignore] {
            let guard = ContractGuard::new(mode, &"addr");
            assert!(!guard.check(false, |bus| ContractViolation::MismatchedErase { bus }));
        }
    }

    #[test]
    fn test_violation_carries_bus_id() {
        let guard = ContractGuard::new(ViolationMode::Ignore, &42u32);
        let mut seen = String::new();
        guard.check(false, |bus| {
            seen = bus.clone();
            ContractViolation::RefCountUnderflow { bus }
        });
        assert_eq!(seen, "42");
    }
}
