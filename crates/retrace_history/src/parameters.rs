//! Historical parameter sets.
//!
//! The collection undo-log pattern applied to a key→value map: before a
//! write mutates the live map, the log records the key and the value it
//! displaces (or its absence). Direct reads consult only the live map and
//! are O(1); `parameters_at` reconstructs a past map by undoing later
//! events newest-to-oldest.

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use retrace_foundation::{Time, TrackedId};

use crate::event::{EventLog, TimedEvent};
use crate::manager::{HistoryManager, Prunable};

// =============================================================================
// Parameter Events
// =============================================================================

/// One map write: the key and whatever it displaced.
///
/// `previous: None` means the key was absent; undoing the write removes it
/// again.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ParameterEvent<K, V> {
    key: K,
    previous: Option<V>,
}

// =============================================================================
// Historical Parameters
// =============================================================================

struct ParametersState<K, V> {
    log: EventLog<ParameterEvent<K, V>>,
    live: im::HashMap<K, V>,
    defaults: im::HashMap<K, V>,
}

struct ParametersShared<K, V> {
    state: Mutex<ParametersState<K, V>>,
}

impl<K, V> ParametersShared<K, V> {
    // Mutators validate before touching guarded state, so a poisoned guard
    // still holds a consistent log.
    fn lock(&self) -> MutexGuard<'_, ParametersState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Send + Sync, V: Send + Sync> Prunable for ParametersShared<K, V> {
    fn prune(&self, horizon: Time) {
        self.lock().log.prune(horizon);
    }
}

/// A key→value parameter set with bounded history and a defaults table.
pub struct HistoricalParameters<K, V> {
    manager: HistoryManager,
    shared: Arc<ParametersShared<K, V>>,
    id: TrackedId,
}

impl<K, V> HistoricalParameters<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty parameter set with no defaults.
    #[must_use]
    pub fn new(manager: &HistoryManager) -> Self {
        Self::with_defaults(manager, im::HashMap::new())
    }

    /// Creates an empty parameter set with a defaults table.
    ///
    /// Defaults are fixed for the object's lifetime; they answer
    /// [`get_or_default`](Self::get_or_default) and
    /// [`reset_to_default`](Self::reset_to_default).
    #[must_use]
    pub fn with_defaults(manager: &HistoryManager, defaults: im::HashMap<K, V>) -> Self {
        let shared = Arc::new(ParametersShared {
            state: Mutex::new(ParametersState {
                log: EventLog::new(),
                live: im::HashMap::new(),
                defaults,
            }),
        });
        let id = manager.register(Arc::downgrade(&shared) as Weak<dyn Prunable>);
        Self {
            manager: manager.clone(),
            shared,
            id,
        }
    }

    /// Sets a parameter, effective now.
    pub fn set(&self, key: K, value: V) {
        let now = self.manager.now();
        let mut state = self.shared.lock();
        let previous = state.live.get(&key).cloned();
        state.log.append(TimedEvent::new(
            now,
            ParameterEvent {
                key: key.clone(),
                previous,
            },
        ));
        state.live.insert(key, value);
    }

    /// Restores a parameter to its default, effective now.
    ///
    /// With no default on record the key is removed instead. Returns true
    /// if the live map changed.
    pub fn reset_to_default(&self, key: &K) -> bool {
        let now = self.manager.now();
        let mut state = self.shared.lock();
        let previous = state.live.get(key).cloned();
        match state.defaults.get(key).cloned() {
            Some(default) => {
                state.log.append(TimedEvent::new(
                    now,
                    ParameterEvent {
                        key: key.clone(),
                        previous,
                    },
                ));
                state.live.insert(key.clone(), default);
                true
            }
            None => {
                if previous.is_none() {
                    return false;
                }
                state.log.append(TimedEvent::new(
                    now,
                    ParameterEvent {
                        key: key.clone(),
                        previous,
                    },
                ));
                state.live.remove(key);
                true
            }
        }
    }

    /// Returns the current value of a parameter.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.shared.lock().live.get(key).cloned()
    }

    /// Returns the current value, falling back to the defaults table.
    #[must_use]
    pub fn get_or_default(&self, key: &K) -> Option<V> {
        let state = self.shared.lock();
        state
            .live
            .get(key)
            .or_else(|| state.defaults.get(key))
            .cloned()
    }

    /// Returns the default for a key, if one exists.
    #[must_use]
    pub fn default_of(&self, key: &K) -> Option<V> {
        self.shared.lock().defaults.get(key).cloned()
    }

    /// Returns true if the live map contains the key.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.shared.lock().live.contains_key(key)
    }

    /// Returns the number of live parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().live.len()
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().live.is_empty()
    }

    /// Returns a copy of the live map.
    #[must_use]
    pub fn parameters(&self) -> im::HashMap<K, V> {
        self.shared.lock().live.clone()
    }

    /// Returns the parameter map as of `time`.
    ///
    /// Starts from a copy of the live map and undoes every event after
    /// `time`, newest first: each undo reinstates the displaced value, or
    /// removes the key if the write introduced it.
    #[must_use]
    pub fn parameters_at(&self, time: Time) -> im::HashMap<K, V> {
        let state = self.shared.lock();
        let mut map = state.live.clone();
        for event in state.log.events_after(time) {
            match &event.payload.previous {
                Some(value) => {
                    map.insert(event.payload.key.clone(), value.clone());
                }
                None => {
                    map.remove(&event.payload.key);
                }
            }
        }
        map
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.shared.lock().log.len()
    }
}

impl<K, V> Drop for HistoricalParameters<K, V> {
    fn drop(&mut self) {
        self.manager.deregister(self.id);
    }
}

// =============================================================================
// Tests
// =============================================================================
