//! History manager: registry, periodic pruning, and run teardown.
//!
//! One manager owns the tracked-object registry for one simulation run. It
//! subscribes to the scheduler's lifecycle signals: on run start it engages
//! a repeating pruning task, and on run end it drains every tracked log and
//! clears the registry. Disposal is deterministic, with nothing left for a
//! collector to find.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use retrace_foundation::{Duration, Error, Result, Time, TrackedId};
use retrace_scheduler::{Clock, RepeatingTask, RunListener, Scheduler, TaskOutcome};
use tracing::{debug, trace};

// =============================================================================
// Prune Capability
// =============================================================================

/// The lifecycle capability every tracked object exposes to its manager.
///
/// Invoked only by the manager: periodically with `now - retention`, and
/// with `now` itself at run end (a full drop down to the newest event).
pub trait Prunable: Send + Sync {
    /// Drops events recorded before `horizon`, always keeping the newest.
    fn prune(&self, horizon: Time);
}

// =============================================================================
// Registry
// =============================================================================

struct Slot {
    generation: u32,
    entry: Option<Weak<dyn Prunable>>,
}

/// Generational slot arena of non-owning references to tracked objects.
///
/// Entries are held weakly: the registry exists for lifecycle coordination
/// and never keeps a tracked object alive. A handle kept past removal fails
/// its generation check and is skipped, never dereferenced.
struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Registry {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, entry: Weak<dyn Prunable>) -> TrackedId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            TrackedId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("registry outgrew u32 indices");
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            TrackedId::new(index, 0)
        }
    }

    fn remove(&mut self, id: TrackedId) -> bool {
        if id.is_null() {
            return false;
        }
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.entry.is_none() {
            return false;
        }
        self.free_slot(id.index);
        true
    }

    fn free_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Upgrades every occupied entry, freeing slots whose object is gone.
    fn live_entries(&mut self) -> Vec<Arc<dyn Prunable>> {
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(entry) = &slot.entry else { continue };
            match entry.upgrade() {
                Some(strong) => live.push(strong),
                None => dead.push(u32::try_from(index).expect("registry outgrew u32 indices")),
            }
        }
        for index in dead {
            self.free_slot(index);
        }
        live
    }

    fn clear(&mut self) {
        let occupied: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entry.is_some())
            .map(|(index, _)| u32::try_from(index).expect("registry outgrew u32 indices"))
            .collect();
        for index in occupied {
            self.free_slot(index);
        }
    }
}

// =============================================================================
// History Manager
// =============================================================================

/// The manager's lifecycle over one simulation run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ManagerPhase {
    /// Constructed; the run has not started.
    Idle,
    /// The run started; periodic pruning is engaged.
    Active,
    /// The run ended; the registry is cleared and pruning retired.
    Drained,
}

struct ManagerState {
    phase: ManagerPhase,
    registry: Registry,
}

struct ManagerShared {
    weak_self: Weak<ManagerShared>,
    scheduler: Arc<dyn Scheduler>,
    retention: Duration,
    prune_interval: Duration,
    state: Mutex<ManagerState>,
}

impl ManagerShared {
    // Mutators validate before touching guarded state, so a poisoned guard
    // still holds a consistent registry.
    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(&self) -> TaskOutcome {
        let (horizon, entries) = {
            let mut state = self.lock();
            if state.phase == ManagerPhase::Drained {
                return TaskOutcome::Stop;
            }
            let horizon = self.scheduler.now() - self.retention;
            (horizon, state.registry.live_entries())
        };
        trace!(
            tracked = entries.len(),
            horizon = horizon.seconds(),
            "prune sweep"
        );
        for entry in &entries {
            entry.prune(horizon);
        }
        TaskOutcome::Continue
    }

    fn drain(&self) {
        let entries = {
            let mut state = self.lock();
            if state.phase == ManagerPhase::Drained {
                return;
            }
            state.phase = ManagerPhase::Drained;
            state.registry.live_entries()
        };
        let horizon = self.scheduler.now();
        debug!(
            tracked = entries.len(),
            at = horizon.seconds(),
            "draining history at run end"
        );
        for entry in &entries {
            entry.prune(horizon);
        }
        self.lock().registry.clear();
    }
}

impl RunListener for ManagerShared {
    fn run_started(&self) -> Result<()> {
        {
            let mut state = self.lock();
            if state.phase != ManagerPhase::Idle {
                return Ok(());
            }
            state.phase = ManagerPhase::Active;
        }
        let task = self
            .weak_self
            .upgrade()
            .ok_or_else(|| Error::internal("history manager dropped during run start"))?;
        self.scheduler
            .schedule_repeating(self.prune_interval, self.prune_interval, task)?;
        debug!(
            every = self.prune_interval.seconds(),
            retention = self.retention.seconds(),
            "periodic pruning engaged"
        );
        Ok(())
    }

    fn run_ended(&self) {
        self.drain();
    }
}

impl RepeatingTask for ManagerShared {
    fn fire(&self) -> TaskOutcome {
        self.sweep()
    }
}

/// Owner of the tracked-object registry for one simulation run.
///
/// Cheap to clone; every tracked object holds a clone for clock access and
/// deregistration. Construct the manager before the run starts: periodic
/// pruning is engaged on the run-started signal.
#[derive(Clone)]
pub struct HistoryManager {
    shared: Arc<ManagerShared>,
}

impl HistoryManager {
    /// Default interval between pruning sweeps.
    pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::new(10.0);

    /// Creates a manager with the given retention window and pruning
    /// interval, subscribed to the scheduler's lifecycle signals.
    ///
    /// # Panics
    ///
    /// Panics if `retention` is negative or `prune_interval` is not
    /// positive.
    pub fn new<S>(scheduler: Arc<S>, retention: Duration, prune_interval: Duration) -> Self
    where
        S: Scheduler + 'static,
    {
        assert!(!retention.is_negative(), "retention must not be negative");
        assert!(
            prune_interval > Duration::ZERO,
            "prune interval must be positive"
        );
        let scheduler: Arc<dyn Scheduler> = scheduler;
        let shared = Arc::new_cyclic(|weak_self| ManagerShared {
            weak_self: weak_self.clone(),
            scheduler,
            retention,
            prune_interval,
            state: Mutex::new(ManagerState {
                phase: ManagerPhase::Idle,
                registry: Registry::new(),
            }),
        });
        shared
            .scheduler
            .subscribe(shared.weak_self.clone() as Weak<dyn RunListener>);
        Self { shared }
    }

    /// Creates a manager that keeps no history (retention zero) with
    /// scheduling still engaged.
    ///
    /// For simulations that need the interface but not the memory cost:
    /// every sweep drops each log down to its newest event.
    pub fn no_history<S>(scheduler: Arc<S>) -> Self
    where
        S: Scheduler + 'static,
    {
        Self::new(scheduler, Duration::ZERO, Self::DEFAULT_PRUNE_INTERVAL)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn now(&self) -> Time {
        self.shared.scheduler.now()
    }

    /// Returns the retention window.
    #[must_use]
    pub fn retention(&self) -> Duration {
        self.shared.retention
    }

    /// Returns the interval between pruning sweeps.
    #[must_use]
    pub fn prune_interval(&self) -> Duration {
        self.shared.prune_interval
    }

    /// Returns the manager's lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ManagerPhase {
        self.shared.lock().phase
    }

    /// Returns the number of registered tracked objects.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Registers a tracked object's prune capability.
    ///
    /// Tolerates an already-dead reference: nothing is registered and the
    /// null handle is returned.
    pub fn register(&self, entry: Weak<dyn Prunable>) -> TrackedId {
        if entry.strong_count() == 0 {
            return TrackedId::null();
        }
        self.shared.lock().registry.insert(entry)
    }

    /// Removes a registry entry.
    ///
    /// Null, stale, and already-removed handles are ignored.
    pub fn deregister(&self, id: TrackedId) {
        self.shared.lock().registry.remove(id);
    }
}

// =============================================================================
// Tests
// =============================================================================
