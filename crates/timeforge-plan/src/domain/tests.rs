//! Tests for the planning domain.

use super::*;
use crate::rule::TokenVariable;
use timeforge_temporal::TemporalConstraintType;

fn two_level_domain() -> (PlanDomain, [ValueId; 4], [ComponentId; 2]) {
    let mut domain = PlanDomain::new("test");
    let mission = domain.add_state_variable("mission", false);
    let camera = domain.add_state_variable("camera", false);
    let idle = domain.add_value(mission, "Idle", Bounds::new(1, 100), true).unwrap();
    let observe = domain
        .add_value(mission, "Observe", Bounds::new(5, 20), true)
        .unwrap();
    let off = domain.add_value(camera, "Off", Bounds::new(1, 100), true).unwrap();
    let shoot = domain.add_value(camera, "Shoot", Bounds::new(2, 2), true).unwrap();
    domain.add_transition(idle, observe).unwrap();
    domain.add_transition(observe, idle).unwrap();
    domain.add_transition(off, shoot).unwrap();
    domain.add_transition(shoot, off).unwrap();
    (domain, [idle, observe, off, shoot], [mission, camera])
}

#[test]
fn test_paths_are_simple() {
    let mut domain = PlanDomain::new("paths");
    let c = domain.add_state_variable("sv", false);
    let a = domain.add_value(c, "A", Bounds::new(1, 10), true).unwrap();
    let b = domain.add_value(c, "B", Bounds::new(1, 10), true).unwrap();
    let d = domain.add_value(c, "C", Bounds::new(1, 10), true).unwrap();
    domain.add_transition(a, b).unwrap();
    domain.add_transition(b, a).unwrap();
    domain.add_transition(b, d).unwrap();
    domain.add_transition(a, d).unwrap();

    let mut paths = domain.component(c).unwrap().paths(a, d);
    paths.sort();
    assert_eq!(paths, vec![vec![a, b, d], vec![a, d]]);
}

#[test]
fn test_duplicate_value_label_rejected() {
    let mut domain = PlanDomain::new("dup");
    let c = domain.add_state_variable("sv", false);
    domain.add_value(c, "A", Bounds::new(1, 10), true).unwrap();
    assert!(domain.add_value(c, "A", Bounds::new(1, 10), true).is_err());
}

#[test]
fn test_reservoir_values() {
    let mut domain = PlanDomain::new("energy");
    let battery = domain.add_reservoir("battery", 0, 20, 10).unwrap();
    let produce = domain.value_by_label(battery, "produce").unwrap();
    assert_eq!(produce.effect, Some(ResourceEffect::Production));
    assert_eq!(produce.parameters[0].name, AMOUNT_PARAMETER);
    assert!(domain.add_reservoir("bad", 0, 5, 10).is_err());
}

#[test]
fn test_rule_cycle_rejected_before_storing() {
    let (mut domain, [_, observe, _, shoot], [mission, camera]) = two_level_domain();

    let mut forward = SynchronizationRule::new(mission, observe);
    let t = forward.add_variable(TokenVariable::new(camera, shoot));
    forward.add_temporal(
        TemporalConstraintType::During,
        t,
        TokenRef::Trigger,
        vec![Bounds::new(0, 100), Bounds::new(0, 100)],
    );
    domain.add_rule(forward).unwrap();

    let mut backward = SynchronizationRule::new(camera, shoot);
    backward.add_variable(TokenVariable::new(mission, observe));
    let err = domain.add_rule(backward).unwrap_err();
    assert!(matches!(err, TimeforgeError::SynchronizationCycle(_)));
    assert_eq!(domain.rules().len(), 1);
}

#[test]
fn test_self_triggering_rule_is_a_cycle() {
    let (mut domain, [_, observe, ..], [mission, _]) = two_level_domain();
    let mut rule = SynchronizationRule::new(mission, observe);
    rule.add_variable(TokenVariable::new(mission, observe));
    assert!(matches!(
        domain.add_rule(rule),
        Err(TimeforgeError::SynchronizationCycle(_))
    ));
}

#[test]
fn test_hierarchy_puts_masters_first() {
    let (mut domain, [idle, observe, off, shoot], [mission, camera]) = two_level_domain();
    let mut rule = SynchronizationRule::new(mission, observe);
    rule.add_variable(TokenVariable::new(camera, shoot));
    domain.add_rule(rule).unwrap();

    let graph = domain.dependency_graph();
    assert!(graph[&camera].contains(&mission));
    assert!(graph[&mission].is_empty());

    let levels = domain.hierarchy();
    assert_eq!(levels[&mission], 0);
    assert_eq!(levels[&camera], 1);

    let tree = domain.decomposition_tree();
    assert_eq!(tree[&observe], BTreeSet::from([shoot]));
    assert!(!tree.contains_key(&idle));
    assert!(!tree.contains_key(&off));
}

#[test]
fn test_rule_with_unknown_label_rejected() {
    let (mut domain, [_, observe, _, shoot], [mission, camera]) = two_level_domain();
    let mut rule = SynchronizationRule::new(mission, observe);
    rule.add_variable(TokenVariable::new(camera, shoot));
    rule.add_bind("?missing", "x");
    assert!(matches!(domain.add_rule(rule), Err(TimeforgeError::Domain(_))));
}
