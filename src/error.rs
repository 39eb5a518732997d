//! Error types used by handler containers.
//!
//! Containers never return errors to their callers. Broken preconditions are
//! programmer errors and are described by [`ContractViolation`], which is
//! handed to the bus-wide [`ViolationMode`](crate::ViolationMode) to panic,
//! log or ignore.
//!
//! The type provides helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Container precondition violations.
///
/// Each variant carries the `Debug` rendering of the bus id the violation
/// happened on.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A second handler was inserted into a `Single` container.
    #[error("bus {bus} is already connected")]
    AlreadyConnected {
        /// Bus id of the container.
        bus: String,
    },

    /// The erased node is not the handler stored in a `Single` container.
    #[error("erased handler does not match the handler connected to bus {bus}")]
    MismatchedErase {
        /// Bus id of the container.
        bus: String,
    },

    /// A bus with a single address was bound with an id other than the one its
    /// address already answers to.
    #[error("bus {bus} has a single address and cannot be bound as {id}")]
    SingleAddress {
        /// Bus id of the existing address.
        bus: String,
        /// Id that was requested.
        id: String,
    },

    /// `release` was called more often than `add_ref`.
    #[error("reference count underflow on bus {bus}")]
    RefCountUnderflow {
        /// Bus id of the container.
        bus: String,
    },
}

impl ContractViolation {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use handlerbus::ContractViolation;
    ///
    /// let err = ContractViolation::AlreadyConnected { bus: "7".into() };
    /// assert_eq!(err.as_label(), "bus_already_connected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ContractViolation::AlreadyConnected { .. } => "bus_already_connected",
            ContractViolation::MismatchedErase { .. } => "bus_mismatched_erase",
            ContractViolation::SingleAddress { .. } => "bus_single_address",
            ContractViolation::RefCountUnderflow { .. } => "bus_ref_count_underflow",
        }
    }

    /// Returns a human-readable message with details about the violation.
    pub fn as_message(&self) -> String {
        match self {
            ContractViolation::AlreadyConnected { bus } => {
                format!("connect on bus={bus} rejected: a handler is already connected")
            }
            ContractViolation::MismatchedErase { bus } => {
                format!("erase on bus={bus} does not match the connected handler")
            }
            ContractViolation::SingleAddress { bus, id } => {
                format!("bind of id={id} routed to the only address bus={bus}")
            }
            ContractViolation::RefCountUnderflow { bus } => {
                format!("release on bus={bus} without a matching add_ref")
            }
        }
    }

    /// Bus id the violation was detected on.
    pub fn bus(&self) -> &str {
        match self {
            ContractViolation::AlreadyConnected { bus }
            | ContractViolation::MismatchedErase { bus }
            | ContractViolation::SingleAddress { bus, .. }
            | ContractViolation::RefCountUnderflow { bus } => bus,
        }
    }
}
