//! Collection undo correctness.

use retrace_foundation::Time;
use retrace_history::{HistoricalCollection, HistoricalList, HistoricalSet};

use crate::fixture;

#[test]
fn membership_follows_the_timeline() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let set: HistoricalSet<&str> = HistoricalCollection::new(&manager);

    set.add("a"); // t=0
    scheduler.run_until(Time::new(6.0));
    set.remove(&"a"); // t=6

    // t0 <= t < t1: present
    for t in [0.0, 3.0, 5.9] {
        assert!(set.snapshot_at(Time::new(t)).contains(&"a"), "at t={t}");
    }
    // t >= t1: absent
    for t in [6.0, 10.0] {
        assert!(!set.snapshot_at(Time::new(t)).contains(&"a"), "at t={t}");
    }
}

#[test]
fn interleaved_membership_of_many_values() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let set: HistoricalSet<u32> = HistoricalCollection::new(&manager);

    // Value k lives on [k, k+3).
    for t in 0..8u32 {
        scheduler.run_until(Time::new(f64::from(t)));
        set.add(t);
        if t >= 3 {
            set.remove(&(t - 3));
        }
    }

    let at_four = set.snapshot_at(Time::new(4.0));
    assert_eq!(
        {
            let mut members: Vec<_> = at_four.iter().copied().collect();
            members.sort_unstable();
            members
        },
        vec![2, 3, 4]
    );
}

#[test]
fn snapshot_out_parameter_form() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let set: HistoricalSet<i32> = HistoricalCollection::new(&manager);

    set.add(1);
    scheduler.run_until(Time::new(2.0));
    set.add(2);

    let mut now = im::HashSet::new();
    set.snapshot_now_into(&mut now);
    assert_eq!(now.len(), 2);

    let mut then = im::HashSet::new();
    set.snapshot_at_into(Time::new(1.0), &mut then);
    assert_eq!(then.len(), 1);
    assert!(then.contains(&1));
}

#[test]
fn list_multiplicity_is_reconstructed() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let list: HistoricalList<&str> = HistoricalCollection::new(&manager);

    list.add("x");
    list.add("x");
    list.add("y");
    scheduler.run_until(Time::new(5.0));
    list.remove(&"x");

    assert_eq!(list.len(), 2);

    let earlier = list.snapshot_at(Time::new(1.0));
    assert_eq!(earlier.iter().filter(|&&v| v == "x").count(), 2);
    assert_eq!(earlier.iter().filter(|&&v| v == "y").count(), 1);
}

#[test]
fn snapshots_do_not_disturb_live_state() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let set: HistoricalSet<i32> = HistoricalCollection::new(&manager);

    set.add(1);
    scheduler.run_until(Time::new(2.0));
    set.add(2);

    let _ = set.snapshot_at(Time::ZERO);
    let _ = set.snapshot_at(Time::new(1.0));

    assert_eq!(set.len(), 2);
    assert!(set.contains(&1));
    assert!(set.contains(&2));
    assert_eq!(set.event_count(), 2);
}
