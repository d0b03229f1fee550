//! Run lifecycle signals.
//!
//! A scheduler drives exactly one run: it starts, events execute, it ends.
//! Components that must react to those transitions (the history manager's
//! periodic pruning and teardown, measurement collectors) subscribe as
//! [`RunListener`]s and are notified by the scheduler, not polled.

use retrace_foundation::{Result, Time};

/// The phase of the scheduler's single run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// The run has not started; events may be pre-loaded.
    Pending,
    /// The run is in progress.
    Running {
        /// When the run started.
        started_at: Time,
    },
    /// The run has ended; no further scheduling is accepted.
    Ended {
        /// When the run ended.
        ended_at: Time,
    },
}

impl RunPhase {
    /// Returns true if the run is in progress.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Returns true if the run has ended.
    #[must_use]
    pub const fn has_ended(self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}

/// Observer of run lifecycle transitions.
///
/// Listeners are held weakly by the scheduler: dropping the subscribing
/// component unsubscribes it.
pub trait RunListener: Send + Sync {
    /// Called when the run starts.
    ///
    /// An error here is fatal to the run and propagates out of
    /// [`EventScheduler::start_run`](crate::EventScheduler::start_run); a
    /// listener that cannot establish its periodic work must not let the
    /// run proceed.
    fn run_started(&self) -> Result<()> {
        Ok(())
    }

    /// Called when the run ends. Teardown must not fail.
    fn run_ended(&self) {}
}
