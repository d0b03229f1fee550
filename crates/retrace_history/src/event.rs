//! Timestamped event logs.
//!
//! The engine under every historical specialization: an ordered sequence of
//! timestamped events per tracked object, answering "events since T" and
//! "event in effect at T" queries, with horizon-based pruning. Live state is
//! never derived from the log; it exists purely to answer *past* queries.

use std::collections::VecDeque;

use retrace_foundation::Time;

// =============================================================================
// Timed Event
// =============================================================================

/// A timestamped change record.
///
/// The payload is specialization-specific: a bare value for scalars, an
/// add/remove tag for collections, a key and displaced value for parameter
/// maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedEvent<P> {
    /// When the change took effect.
    pub time: Time,
    /// What changed.
    pub payload: P,
}

impl<P> TimedEvent<P> {
    /// Creates an event at the given time.
    #[must_use]
    pub const fn new(time: Time, payload: P) -> Self {
        Self { time, payload }
    }
}

// =============================================================================
// Event Log
// =============================================================================

/// Ordered log of timestamped events, non-decreasing in time.
///
/// Once the log has ever received an event, pruning keeps at least the
/// newest one, so past queries degrade to the oldest retained state instead
/// of failing.
#[derive(Clone, Debug, Default)]
pub struct EventLog<P> {
    events: VecDeque<TimedEvent<P>>,
}

impl<P> EventLog<P> {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has ever been logged (or everything was
    /// dropped by a fresh log).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the oldest retained event.
    #[must_use]
    pub fn first(&self) -> Option<&TimedEvent<P>> {
        self.events.front()
    }

    /// Returns the newest event.
    #[must_use]
    pub fn last(&self) -> Option<&TimedEvent<P>> {
        self.events.back()
    }

    /// Returns the retained time window as `(oldest, newest)`.
    ///
    /// Queries earlier than `oldest` answer with the oldest retained state;
    /// callers that must distinguish "unchanged since before the window"
    /// from "evicted" can compare against this span.
    #[must_use]
    pub fn span(&self) -> Option<(Time, Time)> {
        match (self.events.front(), self.events.back()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Appends an event.
    ///
    /// # Panics
    ///
    /// Panics if `event.time` precedes the newest logged time. Timestamps
    /// come from the simulation clock, which never runs backwards; an
    /// out-of-order append is a caller bug.
    pub fn append(&mut self, event: TimedEvent<P>) {
        if let Some(last) = self.events.back() {
            assert!(
                event.time >= last.time,
                "event at {} precedes the newest logged event at {}",
                event.time,
                last.time
            );
        }
        self.events.push_back(event);
    }

    /// Replaces the newest event's payload in place.
    ///
    /// Used to collapse repeated writes within one simulation instant into
    /// a single retained event.
    ///
    /// # Panics
    ///
    /// Panics if the log is empty.
    pub fn replace_last(&mut self, payload: P) {
        let last = self.events.back_mut().expect("log has an event to replace");
        last.payload = payload;
    }

    /// Returns the events strictly after `time`, most recent first.
    ///
    /// This is the replay order for undoing back to `time`: apply each
    /// event's inverse newest-to-oldest.
    pub fn events_after(&self, time: Time) -> impl Iterator<Item = &TimedEvent<P>> {
        self.events
            .iter()
            .rev()
            .take_while(move |event| event.time > time)
    }

    /// Returns the latest event whose timestamp is at or before `time`.
    ///
    /// If `time` precedes every retained event, returns the oldest retained
    /// event: the documented accuracy trade-off of bounded retention.
    /// Returns `None` only when the log is empty.
    #[must_use]
    pub fn at_or_before(&self, time: Time) -> Option<&TimedEvent<P>> {
        self.events
            .iter()
            .rev()
            .find(|event| event.time <= time)
            .or_else(|| self.events.front())
    }

    /// Drops the oldest event while more than one remains and the next
    /// event is itself at or before `horizon`.
    ///
    /// The newest event at or before the horizon is always kept: it is the
    /// event in effect at the edge of the retention window, so queries
    /// there still answer exactly. Everything older is unreachable.
    pub fn prune(&mut self, horizon: Time) {
        while self.events.len() > 1
            && self
                .events
                .get(1)
                .is_some_and(|next| next.time <= horizon)
        {
            self.events.pop_front();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
