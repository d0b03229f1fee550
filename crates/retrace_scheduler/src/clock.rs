//! Read-only access to simulation time.

use retrace_foundation::Time;

/// A source of the current simulation time.
///
/// Separates the read side of the scheduler from scheduling: components
/// that only need to know "now" (tracked state, loggers) depend on this
/// trait rather than on the full [`Scheduler`](crate::Scheduler).
pub trait Clock: Send + Sync {
    /// Returns the current simulation time.
    fn now(&self) -> Time;
}
