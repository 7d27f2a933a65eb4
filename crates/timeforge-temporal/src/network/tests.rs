//! Tests for the temporal network.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

#[test]
fn test_origin_and_horizon_are_fixed() {
    let tn = TemporalNetwork::new(100);
    assert_eq!(tn.time_point(tn.origin()).unwrap().bounds(), Bounds::point(0));
    assert_eq!(
        tn.time_point(tn.horizon_point()).unwrap().bounds(),
        Bounds::point(100)
    );
    assert_eq!(tn.time_point_count(), 2);
}

#[test]
fn test_free_time_point_spans_horizon() {
    let mut tn = TemporalNetwork::new(50);
    let tp = tn.add_time_point().unwrap();
    assert_eq!(tn.time_point(tp).unwrap().bounds(), Bounds::new(0, 50));
}

#[test]
fn test_time_point_at() {
    let mut tn = TemporalNetwork::new(50);
    let tp = tn.add_time_point_at(12).unwrap();
    assert_eq!(tn.time_point(tp).unwrap().bounds(), Bounds::point(12));
}

#[test]
fn test_infeasible_time_point_bounds_rejected() {
    let mut tn = TemporalNetwork::new(50);
    let before = tn.time_point_count();
    assert!(matches!(
        tn.add_time_point_with_bounds(10, 5),
        Err(TimeforgeError::InconsistentDistanceConstraint(_))
    ));
    assert!(matches!(
        tn.add_time_point_with_bounds(40, 60),
        Err(TimeforgeError::InconsistentDistanceConstraint(_))
    ));
    assert_eq!(tn.time_point_count(), before);
}

#[test]
fn test_constraint_tightens_both_ends() {
    let mut tn = TemporalNetwork::new(100);
    let a = tn.add_time_point_with_bounds(0, 30).unwrap();
    let b = tn.add_time_point().unwrap();
    tn.add_constraint(a, b, Bounds::new(10, 20), true).unwrap();

    assert_eq!(tn.time_point(b).unwrap().bounds(), Bounds::new(10, 50));
    assert_eq!(tn.distance(a, b).unwrap(), Bounds::new(10, 20));
    assert_eq!(tn.distance(b, a).unwrap(), Bounds::new(-20, -10));
}

#[test]
fn test_negative_cycle_leaves_network_unchanged() {
    let mut tn = TemporalNetwork::new(100);
    let a = tn.add_time_point().unwrap();
    let b = tn.add_time_point().unwrap();
    tn.add_constraint(a, b, Bounds::new(10, 20), true).unwrap();
    let count = tn.constraint_count();
    let a_before = tn.time_point(a).unwrap();
    let b_before = tn.time_point(b).unwrap();

    let err = tn.add_constraint(b, a, Bounds::new(0, 5), true).unwrap_err();
    assert!(matches!(err, TimeforgeError::InconsistentDistanceConstraint(_)));
    assert_eq!(tn.constraint_count(), count);
    assert_eq!(tn.time_point(a).unwrap(), a_before);
    assert_eq!(tn.time_point(b).unwrap(), b_before);
    assert!(tn.check_consistency().is_ok());
    assert!(tn.audit().is_ok());
}

#[test]
fn test_group_insertion_is_atomic() {
    let mut tn = TemporalNetwork::new(100);
    let a = tn.add_time_point().unwrap();
    let b = tn.add_time_point().unwrap();
    let edges = [
        Edge::new(a, b, Bounds::new(5, 5)),
        Edge::new(b, a, Bounds::new(5, 5)),
    ];
    assert!(tn.add_constraints(&edges).is_err());
    assert_eq!(tn.constraint_count(), 0);
    assert_eq!(tn.time_point(a).unwrap().bounds(), Bounds::new(0, 100));
    assert_eq!(tn.time_point(b).unwrap().bounds(), Bounds::new(0, 100));
}

#[test]
fn test_remove_constraint_restores_bounds() {
    let mut tn = TemporalNetwork::new(100);
    let a = tn.add_time_point().unwrap();
    let b = tn.add_time_point().unwrap();
    let c = tn.add_constraint(a, b, Bounds::new(30, 40), true).unwrap();
    assert_eq!(tn.time_point(b).unwrap().bounds(), Bounds::new(30, 100));

    tn.remove_constraint(c).unwrap();
    assert_eq!(tn.time_point(b).unwrap().bounds(), Bounds::new(0, 100));
    assert!(tn.remove_constraint(c).is_err());
}

#[test]
fn test_remove_time_point_recycles_slot() {
    let mut tn = TemporalNetwork::new(100);
    let a = tn.add_time_point().unwrap();
    let b = tn.add_time_point().unwrap();
    tn.add_constraint(a, b, Bounds::new(60, 60), true).unwrap();
    assert_eq!(tn.time_point(a).unwrap().bounds(), Bounds::new(0, 40));

    tn.remove_time_point(b).unwrap();
    assert_eq!(tn.constraint_count(), 0);
    assert_eq!(tn.time_point(a).unwrap().bounds(), Bounds::new(0, 100));

    let c = tn.add_time_point().unwrap();
    assert_eq!(c, b);
    assert_eq!(tn.time_point(c).unwrap().bounds(), Bounds::new(0, 100));
    assert!(tn.audit().is_ok());
}

#[test]
fn test_origin_cannot_be_removed() {
    let mut tn = TemporalNetwork::new(10);
    assert!(tn.remove_time_point(tn.origin()).is_err());
    assert!(tn.remove_time_point(tn.horizon_point()).is_err());
}

#[test]
fn test_squeezed_contingent_constraint_reported() {
    let mut tn = TemporalNetwork::new(100);
    let start = tn.add_time_point().unwrap();
    let end = tn.add_time_point().unwrap();
    let contingent = tn
        .add_constraint(start, end, Bounds::new(5, 10), false)
        .unwrap();
    assert!(tn.squeezed_contingent_constraints().is_empty());

    // a deadline on the end squeezes the contingent duration
    tn.add_constraint(tn.origin(), start, Bounds::new(0, 0), true)
        .unwrap();
    tn.add_constraint(tn.origin(), end, Bounds::new(0, 8), true)
        .unwrap();
    assert_eq!(tn.squeezed_contingent_constraints(), vec![contingent]);
}

#[test]
fn test_incremental_matches_recomputation_under_random_operations() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tn = TemporalNetwork::new(200);
    let points: Vec<_> = (0..8).map(|_| tn.add_time_point().unwrap()).collect();
    let mut live = Vec::new();

    for _ in 0..300 {
        if !live.is_empty() && rng.random_bool(0.3) {
            let idx = rng.random_range(0..live.len());
            let id = live.swap_remove(idx);
            tn.remove_constraint(id).unwrap();
        } else {
            let from = points[rng.random_range(0..points.len())];
            let to = points[rng.random_range(0..points.len())];
            if from == to {
                continue;
            }
            let lb = rng.random_range(-40..40);
            let ub = lb + rng.random_range(0..60);
            if let Ok(id) = tn.add_constraint(from, to, Bounds::new(lb, ub), true) {
                live.push(id);
            }
        }
        assert!(tn.check_consistency().is_ok());
        assert!(tn.audit().is_ok());
    }
}
