//! Historical collections.
//!
//! Tracks a live collection plus an undo log of add/remove operations.
//! A past snapshot starts from a copy of the *live* collection and applies
//! the inverse of each later event newest-to-oldest: O(events since the
//! target time), not O(all history). The live collection types are the
//! `im` persistent collections, so the starting copy is O(1).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use retrace_foundation::{Time, TrackedId};

use crate::event::{EventLog, TimedEvent};
use crate::manager::{HistoryManager, Prunable};

// =============================================================================
// Undoable Collections
// =============================================================================

/// A live collection that supports value-keyed insertion and removal.
///
/// Implementations report whether the collection actually changed; only
/// real changes enter the undo log. Reconstruction guarantees membership
/// and multiplicity; for sequence backends it does not guarantee element
/// order.
pub trait UndoableCollection<T>: Clone + Default {
    /// Inserts a value, returning true if the collection changed.
    fn insert(&mut self, value: T) -> bool;

    /// Removes one occurrence of a value, returning true if the collection
    /// changed.
    fn remove(&mut self, value: &T) -> bool;

    /// Returns true if the collection contains the value.
    fn contains(&self, value: &T) -> bool;

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns true if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> UndoableCollection<T> for im::HashSet<T>
where
    T: std::hash::Hash + Eq + Clone,
{
    fn insert(&mut self, value: T) -> bool {
        Self::insert(self, value).is_none()
    }

    fn remove(&mut self, value: &T) -> bool {
        Self::remove(self, value).is_some()
    }

    fn contains(&self, value: &T) -> bool {
        Self::contains(self, value)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}

impl<T> UndoableCollection<T> for im::OrdSet<T>
where
    T: Ord + Clone,
{
    fn insert(&mut self, value: T) -> bool {
        Self::insert(self, value).is_none()
    }

    fn remove(&mut self, value: &T) -> bool {
        Self::remove(self, value).is_some()
    }

    fn contains(&self, value: &T) -> bool {
        Self::contains(self, value)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}

impl<T> UndoableCollection<T> for im::Vector<T>
where
    T: Clone + PartialEq,
{
    fn insert(&mut self, value: T) -> bool {
        self.push_back(value);
        true
    }

    fn remove(&mut self, value: &T) -> bool {
        match self.index_of(value) {
            Some(index) => {
                Self::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn contains(&self, value: &T) -> bool {
        Self::contains(self, value)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}

// =============================================================================
// Collection Events
// =============================================================================

/// One membership change, tagged with the operation that entered the log.
///
/// The inverse operation reconstructs the pre-mutation state: undoing an
/// add removes the value, undoing a remove reinserts it.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CollectionEvent<T> {
    Added(T),
    Removed(T),
}

impl<T: Clone> CollectionEvent<T> {
    fn undo<C: UndoableCollection<T>>(&self, target: &mut C) {
        match self {
            Self::Added(value) => {
                target.remove(value);
            }
            Self::Removed(value) => {
                target.insert(value.clone());
            }
        }
    }
}

// =============================================================================
// Historical Collection
// =============================================================================

struct CollectionState<T, C> {
    log: EventLog<CollectionEvent<T>>,
    live: C,
}

struct CollectionShared<T, C> {
    state: Mutex<CollectionState<T, C>>,
}

impl<T, C> CollectionShared<T, C> {
    // Mutators validate before touching guarded state, so a poisoned guard
    // still holds a consistent log.
    fn lock(&self) -> MutexGuard<'_, CollectionState<T, C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send, C: Send> Prunable for CollectionShared<T, C> {
    fn prune(&self, horizon: Time) {
        self.lock().log.prune(horizon);
    }
}

/// A collection with bounded history, generic over the live backend.
///
/// See [`HistoricalSet`], [`HistoricalOrdSet`], and [`HistoricalList`] for
/// the usual instantiations.
pub struct HistoricalCollection<T, C> {
    manager: HistoryManager,
    shared: Arc<CollectionShared<T, C>>,
    id: TrackedId,
}

/// A hash-set with bounded history.
pub type HistoricalSet<T> = HistoricalCollection<T, im::HashSet<T>>;

/// An ordered set with bounded history.
pub type HistoricalOrdSet<T> = HistoricalCollection<T, im::OrdSet<T>>;

/// A sequence with bounded history.
///
/// Snapshots reconstruct membership and multiplicity; element order is not
/// reconstructed.
pub type HistoricalList<T> = HistoricalCollection<T, im::Vector<T>>;

impl<T, C> HistoricalCollection<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: UndoableCollection<T> + Send + Sync + 'static,
{
    /// Creates an empty tracked collection bound to `manager`.
    #[must_use]
    pub fn new(manager: &HistoryManager) -> Self {
        let shared = Arc::new(CollectionShared {
            state: Mutex::new(CollectionState {
                log: EventLog::new(),
                live: C::default(),
            }),
        });
        let id = manager.register(Arc::downgrade(&shared) as Weak<dyn Prunable>);
        Self {
            manager: manager.clone(),
            shared,
            id,
        }
    }

    /// Adds a value to the live collection, effective now.
    ///
    /// Returns true if the collection changed; only real changes are
    /// logged.
    pub fn add(&self, value: T) -> bool {
        let now = self.manager.now();
        let mut state = self.shared.lock();
        if state.live.insert(value.clone()) {
            state
                .log
                .append(TimedEvent::new(now, CollectionEvent::Added(value)));
            true
        } else {
            false
        }
    }

    /// Removes a value from the live collection, effective now.
    ///
    /// Returns true if the collection changed; only real changes are
    /// logged.
    pub fn remove(&self, value: &T) -> bool {
        let now = self.manager.now();
        let mut state = self.shared.lock();
        if state.live.remove(value) {
            state
                .log
                .append(TimedEvent::new(now, CollectionEvent::Removed(value.clone())));
            true
        } else {
            false
        }
    }

    /// Returns true if the live collection contains the value.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.shared.lock().live.contains(value)
    }

    /// Returns the number of elements in the live collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().live.len()
    }

    /// Returns true if the live collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().live.is_empty()
    }

    /// Fills `out` with a copy of the live collection.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not empty; passing a dirty output buffer is a
    /// caller bug.
    pub fn snapshot_now_into(&self, out: &mut C) {
        assert!(out.is_empty(), "snapshot output collection must be empty");
        *out = self.shared.lock().live.clone();
    }

    /// Fills `out` with the collection contents as of `time`.
    ///
    /// Starts from a copy of the live collection and undoes every event
    /// after `time`, newest first.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not empty; passing a dirty output buffer is a
    /// caller bug.
    pub fn snapshot_at_into(&self, time: Time, out: &mut C) {
        assert!(out.is_empty(), "snapshot output collection must be empty");
        let state = self.shared.lock();
        let mut copy = state.live.clone();
        for event in state.log.events_after(time) {
            event.payload.undo(&mut copy);
        }
        *out = copy;
    }

    /// Returns a copy of the live collection.
    #[must_use]
    pub fn snapshot_now(&self) -> C {
        let mut out = C::default();
        self.snapshot_now_into(&mut out);
        out
    }

    /// Returns the collection contents as of `time`.
    #[must_use]
    pub fn snapshot_at(&self, time: Time) -> C {
        let mut out = C::default();
        self.snapshot_at_into(time, &mut out);
        out
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.shared.lock().log.len()
    }
}

impl<T, C> Drop for HistoricalCollection<T, C> {
    fn drop(&mut self) {
        self.manager.deregister(self.id);
    }
}

// =============================================================================
// Tests
// =============================================================================
