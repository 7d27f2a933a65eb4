//! Tests for the domain parameter store.

use super::*;
use timeforge_core::Bounds;

fn rooms() -> ParameterDomain {
    ParameterDomain::enumeration("room", ["a", "b", "c"])
}

#[test]
fn test_bind_and_retract_restores_domain() {
    let mut store = DomainParameterStore::new();
    let d = rooms();
    let x = store.create_parameter(&d);
    let c = store
        .propagate(ParameterConstraint::Bind {
            parameter: x,
            value: "b".into(),
        })
        .unwrap();
    assert_eq!(d.render(&store.values(x).unwrap()), "b");
    store.retract(c).unwrap();
    assert_eq!(store.values(x).unwrap(), d.initial_values());
}

#[test]
fn test_equal_propagates_binding() {
    let mut store = DomainParameterStore::new();
    let d = rooms();
    let x = store.create_parameter(&d);
    let y = store.create_parameter(&d);
    store.propagate(ParameterConstraint::Equal(x, y)).unwrap();
    store
        .propagate(ParameterConstraint::Bind {
            parameter: y,
            value: "c".into(),
        })
        .unwrap();
    assert_eq!(d.render(&store.values(x).unwrap()), "c");
}

#[test]
fn test_failed_propagation_leaves_store_unchanged() {
    let mut store = DomainParameterStore::new();
    let d = rooms();
    let x = store.create_parameter(&d);
    let y = store.create_parameter(&d);
    store
        .propagate(ParameterConstraint::Bind {
            parameter: x,
            value: "a".into(),
        })
        .unwrap();
    store
        .propagate(ParameterConstraint::Bind {
            parameter: y,
            value: "a".into(),
        })
        .unwrap();
    let before = store.constraint_count();

    let err = store
        .propagate(ParameterConstraint::NotEqual(x, y))
        .unwrap_err();
    assert!(matches!(err, TimeforgeError::ParameterPropagation(_)));
    assert_eq!(store.constraint_count(), before);
    assert!(store.check_consistency().is_ok());
}

#[test]
fn test_numeric_equal_intersects_ranges() {
    let mut store = DomainParameterStore::new();
    let amount = ParameterDomain::numeric("amount", 0, 100);
    let x = store.create_parameter(&amount);
    let y = store.create_parameter(&amount);
    store
        .propagate(ParameterConstraint::Bind {
            parameter: x,
            value: "5".into(),
        })
        .unwrap();
    store.propagate(ParameterConstraint::Equal(x, y)).unwrap();
    assert_eq!(store.values(y).unwrap().as_number(), Some(5));
    assert_eq!(
        store.values(x).unwrap(),
        ParameterValues::Range(Bounds::point(5))
    );
}

#[test]
fn test_incompatible_domains_rejected() {
    let mut store = DomainParameterStore::new();
    let x = store.create_parameter(&rooms());
    let y = store.create_parameter(&ParameterDomain::numeric("amount", 0, 10));
    let err = store
        .propagate(ParameterConstraint::Equal(x, y))
        .unwrap_err();
    assert!(matches!(err, TimeforgeError::Domain(_)));
}

#[test]
fn test_delete_parameter_drops_constraints() {
    let mut store = DomainParameterStore::new();
    let d = rooms();
    let x = store.create_parameter(&d);
    let y = store.create_parameter(&d);
    store.propagate(ParameterConstraint::Equal(x, y)).unwrap();
    store
        .propagate(ParameterConstraint::Bind {
            parameter: x,
            value: "a".into(),
        })
        .unwrap();
    store.delete_parameter(x).unwrap();
    assert_eq!(store.constraint_count(), 0);
    assert_eq!(store.values(y).unwrap(), d.initial_values());
    assert_eq!(store.parameter_count(), 1);
}
