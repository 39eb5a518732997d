//! # Handler policies.
//!
//! [`HandlerPolicy`] names the three storage strategies a bus address can use.
//! The strategy itself is picked at compile time through the storage type
//! (`Single`, `Multiple`, `Ordered`); the enum is what those types report.
//!
//! | Policy                | Storage            | Handlers | Dispatch order               |
//! |-----------------------|--------------------|----------|------------------------------|
//! | `Single`              | `Single<H>`        | 0 or 1   | trivial                      |
//! | `Multiple`            | `Multiple<H>`      | any      | newest first                 |
//! | `MultipleAndOrdered`  | `Ordered<H, C>`    | any      | comparator, FIFO among equal |

/// How many handlers one address holds, and in which order they are visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerPolicy {
    /// At most one handler. Connecting a second one is a programmer error.
    Single,
    /// Any number of handlers; new handlers are linked in front.
    Multiple,
    /// Any number of handlers kept sorted by a comparator.
    MultipleAndOrdered,
}

impl Default for HandlerPolicy {
    /// Returns [`HandlerPolicy::Multiple`].
    fn default() -> Self {
        HandlerPolicy::Multiple
    }
}

impl HandlerPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerPolicy::Single => "single",
            HandlerPolicy::Multiple => "multiple",
            HandlerPolicy::MultipleAndOrdered => "multiple_and_ordered",
        }
    }

    /// True if more than one handler may be connected at the same time.
    #[inline]
    pub fn allows_many(&self) -> bool {
        !matches!(self, HandlerPolicy::Single)
    }
}
