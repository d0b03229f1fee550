//! Error types for the Retrace system.
//!
//! Uses `thiserror` for ergonomic error definition. Precondition violations
//! (out-of-order appends, non-empty snapshot buffers) are caller bugs and
//! panic instead; these variants cover the genuinely fallible surface, which
//! is scheduling and run lifecycle.

use thiserror::Error;

use crate::time::{Duration, Time};

/// The main error type for Retrace operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A negative delay was passed to the scheduler.
    #[error("cannot schedule {delay} from {now}: delay is negative")]
    ScheduleInPast {
        /// The scheduler's current time.
        now: Time,
        /// The offending delay.
        delay: Duration,
    },

    /// An operation arrived after the run ended.
    #[error("run already ended at {ended_at}")]
    RunEnded {
        /// When the run ended.
        ended_at: Time,
    },

    /// The run was started a second time.
    #[error("run already started at {started_at}")]
    RunAlreadyStarted {
        /// When the run started.
        started_at: Time,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a negative-delay scheduling error.
    #[must_use]
    pub fn schedule_in_past(now: Time, delay: Duration) -> Self {
        Self::ScheduleInPast { now, delay }
    }

    /// Creates a run-ended error.
    #[must_use]
    pub fn run_ended(ended_at: Time) -> Self {
        Self::RunEnded { ended_at }
    }

    /// Creates a run-already-started error.
    #[must_use]
    pub fn run_already_started(started_at: Time) -> Self {
        Self::RunAlreadyStarted { started_at }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
