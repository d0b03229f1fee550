//! Time and Duration arithmetic across the public API.

use retrace_foundation::{Duration, Time};

#[test]
fn time_advances_by_duration() {
    let t = Time::ZERO + Duration::new(2.5);
    assert_eq!(t, Time::new(2.5));
    assert_eq!(t.seconds(), 2.5);
}

#[test]
fn time_difference_is_a_duration() {
    let span = Time::new(10.0) - Time::new(4.0);
    assert_eq!(span, Duration::new(6.0));

    let negative = Time::new(4.0) - Time::new(10.0);
    assert!(negative.is_negative());
}

#[test]
fn retention_horizon_arithmetic() {
    // now - retention: the shape every pruning sweep computes.
    let horizon = Time::new(10.0) - Duration::new(4.0);
    assert_eq!(horizon, Time::new(6.0));

    // Zero retention puts the horizon at now.
    let horizon = Time::new(10.0) - Duration::ZERO;
    assert_eq!(horizon, Time::new(10.0));
}

#[test]
fn ordering_is_usable_for_sorting() {
    let mut times = vec![Time::new(5.0), Time::ZERO, Time::new(-1.0)];
    times.sort();
    assert_eq!(times, vec![Time::new(-1.0), Time::ZERO, Time::new(5.0)]);
}

#[test]
fn compound_assignment() {
    let mut t = Time::ZERO;
    t += Duration::new(3.0);
    t -= Duration::new(1.0);
    assert_eq!(t, Time::new(2.0));
}
