//! Keyed-parameter history.

use retrace_foundation::Time;
use retrace_history::HistoricalParameters;

use crate::fixture;

#[test]
fn parameter_scenario() {
    // set(X,1) at t=0; set(X,2) at t=5;
    // parametersAt(2).get(X)==1; parametersAt(7).get(X)==2.
    let (scheduler, manager) = fixture(100.0, 10.0);
    let params: HistoricalParameters<&str, i64> = HistoricalParameters::new(&manager);

    params.set("X", 1);
    scheduler.run_until(Time::new(5.0));
    params.set("X", 2);

    assert_eq!(params.parameters_at(Time::new(2.0)).get(&"X"), Some(&1));
    assert_eq!(params.parameters_at(Time::new(7.0)).get(&"X"), Some(&2));
}

#[test]
fn direct_reads_are_current_time_only() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let params: HistoricalParameters<&str, i64> = HistoricalParameters::new(&manager);

    params.set("a", 1);
    scheduler.run_until(Time::new(5.0));
    params.set("a", 2);
    params.set("b", 9);

    assert_eq!(params.get(&"a"), Some(2));
    assert!(params.contains(&"b"));
    assert_eq!(params.len(), 2);
}

#[test]
fn reconstruction_covers_inserts_updates_and_resets() {
    let (scheduler, manager) = fixture(100.0, 10.0);
    let defaults = im::HashMap::unit("speed", 30);
    let params = HistoricalParameters::with_defaults(&manager, defaults);

    params.set("speed", 50); // t=0
    scheduler.run_until(Time::new(4.0));
    params.set("limit", 100); // t=4, introduced
    scheduler.run_until(Time::new(8.0));
    params.reset_to_default(&"speed"); // t=8, back to 30

    let at_two = params.parameters_at(Time::new(2.0));
    assert_eq!(at_two.get(&"speed"), Some(&50));
    assert!(at_two.get(&"limit").is_none());

    let at_six = params.parameters_at(Time::new(6.0));
    assert_eq!(at_six.get(&"speed"), Some(&50));
    assert_eq!(at_six.get(&"limit"), Some(&100));

    assert_eq!(params.get(&"speed"), Some(30));
    assert_eq!(params.get_or_default(&"speed"), Some(30));
}
