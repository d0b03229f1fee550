//! Discrete-event scheduler.
//!
//! Maintains the current simulation time and an ordered queue of scheduled
//! actions. Actions execute in time order; actions at equal times execute
//! in scheduling order (FIFO, via a wrapping sequence number). The queue is
//! driven externally through [`EventScheduler::step`] and
//! [`EventScheduler::run_until`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use retrace_foundation::{Duration, Error, Result, Time};
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::lifecycle::{RunListener, RunPhase};
use crate::task::{RepeatingTask, TaskOutcome};

// =============================================================================
// Scheduler Trait
// =============================================================================

/// Scheduling and lifecycle surface consumed by simulation components.
///
/// The read side lives on the [`Clock`] supertrait; this adds the ability
/// to enqueue work and to observe run lifecycle transitions.
pub trait Scheduler: Clock {
    /// Schedules `action` to execute `delay` after the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if `delay` is negative or the run has ended.
    fn schedule_after(&self, delay: Duration, action: Box<dyn FnOnce() + Send>) -> Result<()>;

    /// Registers a repeating task, first firing `initial_delay` from now and
    /// then every `interval` until the task reports [`TaskOutcome::Stop`].
    ///
    /// # Errors
    ///
    /// Returns an error if `initial_delay` is negative or the run has ended.
    fn schedule_repeating(
        &self,
        initial_delay: Duration,
        interval: Duration,
        task: Arc<dyn RepeatingTask>,
    ) -> Result<()>;

    /// Subscribes a run lifecycle listener.
    ///
    /// Listeners are held weakly; a dropped listener is silently removed.
    fn subscribe(&self, listener: Weak<dyn RunListener>);
}

// =============================================================================
// Scheduled Actions
// =============================================================================

enum ActionKind {
    /// A one-shot action.
    Once(Box<dyn FnOnce() + Send>),
    /// A repeating task; the scheduler re-enqueues it after each firing.
    Repeating {
        interval: Duration,
        task: Arc<dyn RepeatingTask>,
    },
}

struct ScheduledAction {
    time: Time,
    seq: u64,
    kind: ActionKind,
}

impl PartialEq for ScheduledAction {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledAction {}

impl PartialOrd for ScheduledAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledAction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the earliest (time, seq) sits at the heap top.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// =============================================================================
// Event Scheduler
// =============================================================================

struct QueueState {
    now: Time,
    next_seq: u64,
    phase: RunPhase,
    queue: BinaryHeap<ScheduledAction>,
}

impl QueueState {
    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }
}

/// Discrete-event scheduler: current time, event queue, run lifecycle.
pub struct EventScheduler {
    state: Mutex<QueueState>,
    listeners: Mutex<Vec<Weak<dyn RunListener>>>,
}

impl EventScheduler {
    /// Creates a scheduler at time zero with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                now: Time::ZERO,
                next_seq: 0,
                phase: RunPhase::Pending,
                queue: BinaryHeap::new(),
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    // Mutators validate their arguments before touching guarded state, so a
    // poisoned guard still holds a consistent queue.
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the run phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.state().phase
    }

    /// Returns the number of queued actions.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.state().queue.len()
    }

    /// Returns the time of the next queued action, if any.
    #[must_use]
    pub fn next_action_time(&self) -> Option<Time> {
        self.state().queue.peek().map(|action| action.time)
    }

    /// Schedules a closure to execute `delay` after the current time.
    ///
    /// Convenience form of [`Scheduler::schedule_after`].
    ///
    /// # Errors
    ///
    /// Returns an error if `delay` is negative or the run has ended.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_after(delay, Box::new(action))
    }

    /// Starts the run, notifying subscribed listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the run already started or ended, or if a
    /// listener fails to establish its periodic work; such a failure is
    /// fatal to the run and must reach the simulation driver.
    pub fn start_run(&self) -> Result<()> {
        let started_at = {
            let mut state = self.state();
            match state.phase {
                RunPhase::Running { started_at } => {
                    return Err(Error::run_already_started(started_at));
                }
                RunPhase::Ended { ended_at } => return Err(Error::run_ended(ended_at)),
                RunPhase::Pending => {}
            }
            let now = state.now;
            state.phase = RunPhase::Running { started_at: now };
            now
        };
        debug!(at = started_at.seconds(), "run started");
        for listener in self.live_listeners() {
            listener.run_started()?;
        }
        Ok(())
    }

    /// Ends the run, notifying subscribed listeners.
    ///
    /// Idempotent; a run that never started still tears down. Queued
    /// actions are left in place; the driver stops stepping, so they
    /// simply never execute.
    pub fn end_run(&self) {
        let ended_at = {
            let mut state = self.state();
            if let RunPhase::Ended { .. } = state.phase {
                return;
            }
            let now = state.now;
            state.phase = RunPhase::Ended { ended_at: now };
            now
        };
        debug!(at = ended_at.seconds(), "run ended");
        for listener in self.live_listeners() {
            listener.run_ended();
        }
    }

    /// Executes the next queued action, advancing the clock to its time.
    ///
    /// Returns false if the queue is empty.
    pub fn step(&self) -> bool {
        self.execute_next(None)
    }

    /// Executes queued actions in order until none remain at or before
    /// `until`, then advances the clock to `until`.
    pub fn run_until(&self, until: Time) {
        while self.execute_next(Some(until)) {}
        let mut state = self.state();
        state.now = state.now.max(until);
    }

    /// Runs for `span` from the current time.
    ///
    /// # Panics
    ///
    /// Panics if `span` is negative.
    pub fn run_for(&self, span: Duration) {
        assert!(!span.is_negative(), "cannot run for a negative span");
        let until = self.now() + span;
        self.run_until(until);
    }

    fn execute_next(&self, until: Option<Time>) -> bool {
        let (time, kind) = {
            let mut state = self.state();
            let Some(next) = state.queue.peek() else {
                return false;
            };
            if until.is_some_and(|limit| next.time > limit) {
                return false;
            }
            let next = state.queue.pop().expect("peek then pop");
            state.now = state.now.max(next.time);
            (next.time, next.kind)
        };

        // The action runs without the queue lock so it can schedule
        // follow-up work and read the clock.
        match kind {
            ActionKind::Once(action) => action(),
            ActionKind::Repeating { interval, task } => match task.fire() {
                TaskOutcome::Continue => {
                    let mut state = self.state();
                    let seq = state.take_seq();
                    state.queue.push(ScheduledAction {
                        time: time + interval,
                        seq,
                        kind: ActionKind::Repeating { interval, task },
                    });
                }
                TaskOutcome::Stop => trace!(at = time.seconds(), "repeating task retired"),
            },
        }
        true
    }

    fn live_listeners(&self) -> Vec<Arc<dyn RunListener>> {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|listener| listener.strong_count() > 0);
        listeners
            .iter()
            .filter_map(std::sync::Weak::upgrade)
            .collect()
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for EventScheduler {
    fn now(&self) -> Time {
        self.state().now
    }
}

impl Scheduler for EventScheduler {
    fn schedule_after(&self, delay: Duration, action: Box<dyn FnOnce() + Send>) -> Result<()> {
        let mut state = self.state();
        if let RunPhase::Ended { ended_at } = state.phase {
            return Err(Error::run_ended(ended_at));
        }
        if delay.is_negative() {
            return Err(Error::schedule_in_past(state.now, delay));
        }
        let time = state.now + delay;
        let seq = state.take_seq();
        trace!(at = time.seconds(), seq, "scheduled action");
        state.queue.push(ScheduledAction {
            time,
            seq,
            kind: ActionKind::Once(action),
        });
        Ok(())
    }

    fn schedule_repeating(
        &self,
        initial_delay: Duration,
        interval: Duration,
        task: Arc<dyn RepeatingTask>,
    ) -> Result<()> {
        assert!(
            interval > Duration::ZERO,
            "repeating interval must be positive"
        );
        let mut state = self.state();
        if let RunPhase::Ended { ended_at } = state.phase {
            return Err(Error::run_ended(ended_at));
        }
        if initial_delay.is_negative() {
            return Err(Error::schedule_in_past(state.now, initial_delay));
        }
        let time = state.now + initial_delay;
        let seq = state.take_seq();
        trace!(
            at = time.seconds(),
            every = interval.seconds(),
            "scheduled repeating task"
        );
        state.queue.push(ScheduledAction {
            time,
            seq,
            kind: ActionKind::Repeating { interval, task },
        });
        Ok(())
    }

    fn subscribe(&self, listener: Weak<dyn RunListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

// =============================================================================
// Tests
// =============================================================================
