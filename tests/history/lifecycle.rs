//! Manager lifecycle: periodic pruning, drain, deterministic teardown.

use std::sync::Arc;

use retrace_foundation::Time;
use retrace_history::{HistoricalValue, HistoryManager, ManagerPhase};
use retrace_scheduler::EventScheduler;

use crate::fixture;

#[test]
fn manager_walks_idle_active_drained() {
    let (scheduler, manager) = fixture(4.0, 5.0);
    assert_eq!(manager.phase(), ManagerPhase::Idle);

    scheduler.start_run().unwrap();
    assert_eq!(manager.phase(), ManagerPhase::Active);

    scheduler.run_until(Time::new(12.0));
    scheduler.end_run();
    assert_eq!(manager.phase(), ManagerPhase::Drained);
}

#[test]
fn periodic_pruning_bounds_the_log() {
    let (scheduler, manager) = fixture(4.0, 5.0);
    let value = Arc::new(HistoricalValue::new(&manager));

    scheduler.start_run().unwrap();
    for step in 0..30 {
        let v = Arc::clone(&value);
        scheduler
            .schedule(
                retrace_foundation::Duration::new(f64::from(step)),
                move || v.set(step),
            )
            .unwrap();
    }

    scheduler.run_until(Time::new(30.0));

    // The sweep at t=30 kept the window [26, 30] plus its covering event.
    let (oldest, newest) = value.retained_span().unwrap();
    assert_eq!(newest, Time::new(29.0));
    assert!(oldest >= Time::new(25.0));
    assert!(value.event_count() <= 6);

    // Current state and in-window history still answer.
    assert_eq!(value.get(), Some(29));
    assert_eq!(value.at(Time::new(27.5)), Some(27));
}

#[test]
fn run_end_prunes_fully_and_clears_the_registry() {
    let (scheduler, manager) = fixture(100.0, 5.0);
    let value = HistoricalValue::new(&manager);

    scheduler.start_run().unwrap();
    value.set(1);
    scheduler.run_until(Time::new(3.0));
    value.set(2);
    scheduler.run_until(Time::new(7.0));

    assert_eq!(manager.tracked_count(), 1);
    scheduler.end_run();

    // Deterministic teardown: registry emptied, logs dropped to one event.
    assert_eq!(manager.tracked_count(), 0);
    assert_eq!(value.event_count(), 1);
    assert_eq!(value.get(), Some(2));
}

#[test]
fn no_history_mode_keeps_the_interface_without_the_memory() {
    let scheduler = Arc::new(EventScheduler::new());
    let manager = HistoryManager::no_history(Arc::clone(&scheduler));
    let value = Arc::new(HistoricalValue::new(&manager));

    scheduler.start_run().unwrap();
    for step in 0..25 {
        let v = Arc::clone(&value);
        scheduler
            .schedule(
                retrace_foundation::Duration::new(f64::from(step)),
                move || v.set(step),
            )
            .unwrap();
    }
    scheduler.run_until(Time::new(25.0));

    // Sweeps at t=10 and t=20 dropped everything behind the newest event.
    assert!(value.event_count() <= 6);
    assert_eq!(value.get(), Some(24));
}

#[test]
fn dropped_objects_vanish_from_the_registry() {
    let (scheduler, manager) = fixture(4.0, 5.0);
    let kept = HistoricalValue::with_initial(&manager, 1);
    let dropped = HistoricalValue::with_initial(&manager, 2);
    assert_eq!(manager.tracked_count(), 2);

    drop(dropped);
    assert_eq!(manager.tracked_count(), 1);

    // The survivor still prunes normally.
    scheduler.start_run().unwrap();
    scheduler.run_until(Time::new(10.0));
    assert_eq!(kept.get(), Some(1));
}

#[test]
fn late_registration_is_tolerated() {
    let (scheduler, manager) = fixture(4.0, 5.0);

    scheduler.start_run().unwrap();
    scheduler.run_until(Time::new(3.0));
    scheduler.end_run();
    assert_eq!(manager.phase(), ManagerPhase::Drained);

    // Creating a tracked value after drain works; it just sees no sweeps.
    let value = HistoricalValue::with_initial(&manager, 9);
    assert_eq!(value.get(), Some(9));
}
