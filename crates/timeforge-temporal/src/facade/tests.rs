//! Tests for the temporal facade.

use super::*;

fn facade() -> TemporalFacade {
    TemporalFacade::new(100)
}

#[test]
fn test_interval_with_windows() {
    let mut tdb = facade();
    let i = tdb
        .create_interval_with(
            Some(Bounds::new(10, 20)),
            Some(Bounds::new(0, 35)),
            Bounds::new(15, 30),
            true,
        )
        .unwrap();
    let schedule = tdb.schedule(i).unwrap();
    assert_eq!(schedule.start, Bounds::new(10, 20));
    assert_eq!(schedule.end, Bounds::new(25, 35));
    assert_eq!(schedule.duration, Bounds::new(15, 25));
}

#[test]
fn test_infeasible_interval_leaves_no_time_points() {
    let mut tdb = facade();
    let before = tdb.network().time_point_count();
    let err = tdb
        .create_interval_with(
            Some(Bounds::new(50, 60)),
            Some(Bounds::new(0, 55)),
            Bounds::new(10, 10),
            true,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TimeforgeError::InconsistentDistanceConstraint(_)
    ));
    assert_eq!(tdb.network().time_point_count(), before);
    assert_eq!(tdb.interval_count(), 0);
}

#[test]
fn test_before_and_distance_query() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    let b = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    tdb.propagate(
        TemporalConstraintType::Before,
        a,
        b,
        &[Bounds::new(5, 15)],
    )
    .unwrap();
    assert_eq!(tdb.distance(a, b).unwrap(), Bounds::new(5, 15));
    assert_eq!(tdb.schedule(b).unwrap().start, Bounds::new(15, 90));
}

#[test]
fn test_queries_do_not_mutate() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(5, 10), true).unwrap();
    let b = tdb.create_interval(Bounds::new(5, 10), true).unwrap();
    let snapshot = format!("{:?}", tdb.network());
    let _ = tdb.distance(a, b).unwrap();
    let _ = tdb.can_overlap(a, b).unwrap();
    let _ = tdb.schedule(a).unwrap();
    let _ = tdb.makespan();
    assert_eq!(format!("{:?}", tdb.network()), snapshot);
}

#[test]
fn test_inconsistent_constraint_rejected_atomically() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    let b = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    tdb.propagate(TemporalConstraintType::Meets, a, b, &[])
        .unwrap();
    let constraints = tdb.constraint_count();

    // b during a cannot hold when b starts when a ends
    let err = tdb
        .propagate(
            TemporalConstraintType::During,
            b,
            a,
            &[Bounds::new(0, 100), Bounds::new(0, 100)],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TimeforgeError::InconsistentDistanceConstraint(_)
    ));
    assert_eq!(tdb.constraint_count(), constraints);
    assert!(tdb.verify().is_ok());
}

#[test]
fn test_delete_interval_drops_its_constraints() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    let b = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    let h = tdb
        .propagate(TemporalConstraintType::Meets, a, b, &[])
        .unwrap();
    tdb.delete_interval(b).unwrap();
    assert!(!tdb.is_propagated(h));
    assert_eq!(tdb.schedule(a).unwrap().start, Bounds::new(0, 90));
    assert!(tdb.interval(b).is_err());
}

#[test]
fn test_pseudo_controllability_reports_squeezed_interval() {
    let mut tdb = facade();
    let contingent = tdb.create_interval(Bounds::new(5, 10), false).unwrap();
    let other = tdb.create_interval(Bounds::new(1, 1), true).unwrap();
    assert!(tdb.check_pseudo_controllability().is_empty());

    tdb.fix_start(contingent, Bounds::point(0)).unwrap();
    tdb.fix_end(contingent, Bounds::new(0, 7)).unwrap();
    assert_eq!(tdb.check_pseudo_controllability(), vec![contingent]);
    // squeezing is data, not an inconsistency
    assert!(tdb.verify().is_ok());
    assert!(tdb.interval(other).is_ok());
}

#[test]
fn test_makespan_uses_controllable_intervals() {
    let mut tdb = facade();
    let a = tdb
        .create_interval_with(Some(Bounds::point(0)), None, Bounds::new(20, 20), true)
        .unwrap();
    let b = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
    tdb.propagate(TemporalConstraintType::Meets, a, b, &[])
        .unwrap();
    let makespan = tdb.makespan();
    assert_eq!(makespan.min, 30);
    assert_eq!(makespan.max, 100);
}

#[test]
fn test_equals_aligns_both_ends() {
    let mut tdb = facade();
    let a = tdb
        .create_interval_with(Some(Bounds::point(10)), None, Bounds::new(5, 50), true)
        .unwrap();
    let b = tdb.create_interval(Bounds::new(20, 20), true).unwrap();
    tdb.propagate(TemporalConstraintType::Equals, a, b, &[])
        .unwrap();
    assert_eq!(tdb.schedule(a).unwrap().end, Bounds::point(30));
    assert_eq!(tdb.schedule(b).unwrap().start, Bounds::point(10));
}

#[test]
fn test_fix_window_narrows_and_retracts() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(5, 10), true).unwrap();
    let h = tdb
        .fix_window(a, Some(Bounds::point(20)), None, Some(Bounds::point(7)))
        .unwrap();
    let schedule = tdb.schedule(a).unwrap();
    assert_eq!(schedule.start, Bounds::point(20));
    assert_eq!(schedule.end, Bounds::point(27));

    tdb.retract(h).unwrap();
    assert_eq!(tdb.schedule(a).unwrap().start, Bounds::new(0, 95));
}

#[test]
fn test_fix_window_is_atomic() {
    let mut tdb = facade();
    let a = tdb.create_interval(Bounds::new(5, 10), true).unwrap();
    let constraints = tdb.constraint_count();

    // start 20 with duration 5 cannot end at 40
    let err = tdb
        .fix_window(
            a,
            Some(Bounds::point(20)),
            Some(Bounds::point(40)),
            Some(Bounds::point(5)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TimeforgeError::InconsistentDistanceConstraint(_)
    ));
    assert_eq!(tdb.constraint_count(), constraints);
    assert_eq!(tdb.schedule(a).unwrap().start, Bounds::new(0, 95));
    assert!(tdb.fix_window(a, None, None, None).is_err());
}
