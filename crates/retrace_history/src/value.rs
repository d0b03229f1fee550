//! Historical scalar values.
//!
//! [`HistoricalValue`] tracks a single value with an O(1) current read: the
//! live value is cached directly and the event log is consulted only for
//! past queries. [`CurrentValue`] is the zero-overhead stand-in with the
//! same interface and no history, so domain code stays polymorphic over
//! whether history tracking is enabled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use retrace_foundation::{Time, TrackedId};

use crate::event::{EventLog, TimedEvent};
use crate::manager::{HistoryManager, Prunable};

// =============================================================================
// Historical Trait
// =============================================================================

/// A value readable at the current instant or at a past one.
///
/// `None` is the absence sentinel: nothing has been written yet.
pub trait Historical<T> {
    /// Sets the current value, effective now.
    fn set(&self, value: T);

    /// Returns the current value.
    fn get(&self) -> Option<T>;

    /// Returns the value in effect at `time`.
    ///
    /// For times before the retained window this degrades to the oldest
    /// retained value rather than failing.
    fn at(&self, time: Time) -> Option<T>;
}

// =============================================================================
// Historical Value
// =============================================================================

struct ValueState<T> {
    log: EventLog<T>,
    current: Option<T>,
}

struct ValueShared<T> {
    state: Mutex<ValueState<T>>,
}

impl<T> ValueShared<T> {
    // Mutators validate before touching guarded state, so a poisoned guard
    // still holds a consistent log.
    fn lock(&self) -> MutexGuard<'_, ValueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send> Prunable for ValueShared<T> {
    fn prune(&self, horizon: Time) {
        self.lock().log.prune(horizon);
    }
}

/// A scalar value with bounded history.
///
/// Bound to exactly one [`HistoryManager`] at construction; registers
/// itself for periodic pruning and deregisters when dropped.
pub struct HistoricalValue<T> {
    manager: HistoryManager,
    shared: Arc<ValueShared<T>>,
    id: TrackedId,
}

impl<T> HistoricalValue<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty tracked value bound to `manager`.
    #[must_use]
    pub fn new(manager: &HistoryManager) -> Self {
        let shared = Arc::new(ValueShared {
            state: Mutex::new(ValueState {
                log: EventLog::new(),
                current: None,
            }),
        });
        let id = manager.register(Arc::downgrade(&shared) as Weak<dyn Prunable>);
        Self {
            manager: manager.clone(),
            shared,
            id,
        }
    }

    /// Creates a tracked value holding `value` as of the current time.
    #[must_use]
    pub fn with_initial(manager: &HistoryManager, value: T) -> Self {
        let historical = Self::new(manager);
        historical.set(value);
        historical
    }

    /// Sets the current value, effective now.
    ///
    /// Repeated writes within one simulation instant collapse into a single
    /// retained event holding the last value.
    pub fn set(&self, value: T) {
        let now = self.manager.now();
        let mut state = self.shared.lock();
        if state.log.last().map(|event| event.time) == Some(now) {
            state.log.replace_last(value.clone());
        } else {
            state.log.append(TimedEvent::new(now, value.clone()));
        }
        state.current = Some(value);
    }

    /// Returns the current value without touching the log.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.shared.lock().current.clone()
    }

    /// Returns the value in effect at `time`, degrading to the oldest
    /// retained value for times before the window.
    #[must_use]
    pub fn at(&self, time: Time) -> Option<T> {
        self.shared
            .lock()
            .log
            .at_or_before(time)
            .map(|event| event.payload.clone())
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.shared.lock().log.len()
    }

    /// Returns the retained time window as `(oldest, newest)`.
    #[must_use]
    pub fn retained_span(&self) -> Option<(Time, Time)> {
        self.shared.lock().log.span()
    }
}

impl<T> Historical<T> for HistoricalValue<T>
where
    T: Clone + Send + 'static,
{
    fn set(&self, value: T) {
        Self::set(self, value);
    }

    fn get(&self) -> Option<T> {
        Self::get(self)
    }

    fn at(&self, time: Time) -> Option<T> {
        Self::at(self, time)
    }
}

impl<T> Drop for HistoricalValue<T> {
    fn drop(&mut self) {
        self.manager.deregister(self.id);
    }
}

// =============================================================================
// Current Value
// =============================================================================

/// A value with the historical interface and no history.
///
/// `at(time)` answers with the current value unconditionally and nothing is
/// registered with any manager.
pub struct CurrentValue<T> {
    state: Mutex<Option<T>>,
}

impl<T: Clone> CurrentValue<T> {
    /// Creates an empty value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Creates a value already holding `value`.
    #[must_use]
    pub fn with_initial(value: T) -> Self {
        Self {
            state: Mutex::new(Some(value)),
        }
    }

    /// Overwrites the value.
    pub fn set(&self, value: T) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// Returns the value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone> Default for CurrentValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Historical<T> for CurrentValue<T> {
    fn set(&self, value: T) {
        Self::set(self, value);
    }

    fn get(&self) -> Option<T> {
        Self::get(self)
    }

    fn at(&self, _time: Time) -> Option<T> {
        Self::get(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
