//! Tests for the flaw resolvers.

use std::collections::BTreeMap;
use std::sync::Arc;

use timeforge_config::CostConfig;
use timeforge_core::{Bounds, DecisionId, IdGenerator};
use timeforge_plan::{DecisionSpec, DecisionState, PlanDataBase, PlanDomain, Problem};
use timeforge_test::{BatteryDomain, DrillDomain, RoverDomain, SatelliteDomain, HORIZON};

use super::*;
use crate::flaw::{FlawKind, FlawType, Peak, PeakDirection};
use crate::solution::SolutionKind;

fn load(domain: &Arc<PlanDomain>, problem: &Problem) -> (PlanDataBase, BTreeMap<String, DecisionId>) {
    let mut pdb = PlanDataBase::new(Arc::clone(domain), HORIZON, IdGenerator::new());
    let keys = pdb.setup(problem).unwrap();
    (pdb, keys)
}

fn resolver(domain: &PlanDomain, kind: ResolverType) -> Resolver {
    Resolver::for_domain(domain, &CostConfig::default())
        .into_iter()
        .find(|r| r.resolver_type() == kind)
        .unwrap()
}

fn single_flaw(resolver: &Resolver, pdb: &mut PlanDataBase) -> Flaw {
    let mut flaws = resolver.find_flaws(pdb).unwrap();
    assert_eq!(flaws.len(), 1, "flaws: {flaws:?}");
    let mut flaw = flaws.remove(0);
    resolver.compute_solutions(pdb, &mut flaw).unwrap();
    flaw
}

#[test]
fn test_for_domain_builds_timeline_resolvers_per_component() {
    let satellite = SatelliteDomain::new().unwrap();
    let types: Vec<ResolverType> = Resolver::for_domain(&satellite.domain, &CostConfig::default())
        .iter()
        .map(Resolver::resolver_type)
        .collect();
    assert_eq!(
        types,
        vec![
            ResolverType::Gap,
            ResolverType::Scheduling,
            ResolverType::PlanRefinement
        ]
    );

    let battery = BatteryDomain::new().unwrap();
    let types: Vec<ResolverType> = Resolver::for_domain(&battery.domain, &CostConfig::default())
        .iter()
        .map(Resolver::resolver_type)
        .collect();
    assert_eq!(types, vec![ResolverType::Reservoir, ResolverType::PlanRefinement]);
}

#[test]
fn test_external_state_variable_has_no_gap_resolver() {
    let mut domain = PlanDomain::new("weather");
    let sky = domain.add_state_variable("sky", true);
    domain.add_value(sky, "Clear", Bounds::new(1, 100), false).unwrap();
    let resolvers = Resolver::for_domain(&domain, &CostConfig::default());
    assert!(resolvers
        .iter()
        .all(|r| r.resolver_type() != ResolverType::Gap));
    assert_eq!(resolvers[0].component(), Some(sky));
}

#[test]
fn test_gap_is_filled_by_the_only_fitting_path() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, keys) = load(&satellite.domain, &satellite.gap_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);

    let flaw = single_flaw(&gap, &mut pdb);
    assert_eq!(
        flaw.kind,
        FlawKind::Gap {
            left: keys["earth"],
            right: keys["science"],
            distance: Bounds::point(5),
        }
    );
    // Maneuver lasts at least 7 and a direct transition leaves 5 units
    // uncovered: only slewing fits.
    assert_eq!(flaw.solutions.len(), 1);
    let solution = &flaw.solutions[0];
    assert_eq!(
        solution.kind,
        SolutionKind::GapCompletion {
            left: keys["earth"],
            right: keys["science"],
            path: vec![satellite.slewing],
        }
    );
    assert_eq!(solution.cost, CostConfig::default().completion_cost);
}

#[test]
fn test_gap_completion_leaves_a_goal_and_hides_the_gap() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, _) = load(&satellite.domain, &satellite.gap_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);
    let flaw = single_flaw(&gap, &mut pdb);

    let effects = gap.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert_eq!(effects.created_decisions.len(), 1);
    assert_eq!(effects.created_relations.len(), 2);
    assert!(effects.activated_relations.is_empty());

    let slewing = effects.created_decisions[0];
    assert_eq!(pdb.agenda(), vec![slewing]);
    assert!(pdb.decision(slewing).unwrap().mandatory_expansion);
    assert!(gap.find_flaws(&pdb).unwrap().is_empty());
}

#[test]
fn test_semantic_connection_is_closed_by_meets() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, keys) = load(&satellite.domain, &satellite.semantic_connection_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);

    let flaw = single_flaw(&gap, &mut pdb);
    assert_eq!(
        flaw.kind,
        FlawKind::SemanticConnection {
            left: keys["earth"],
            right: keys["science"],
        }
    );
    assert_eq!(flaw.solutions.len(), 1);

    let effects = gap.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(effects.created_decisions.is_empty());
    assert_eq!(effects.activated_relations.len(), 1);
    assert!(gap.find_flaws(&pdb).unwrap().is_empty());
}

#[test]
fn test_detection_is_idempotent() {
    let satellite = SatelliteDomain::new().unwrap();
    let (pdb, _) = load(&satellite.domain, &satellite.gap_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);

    let first = gap.find_flaws(&pdb).unwrap();
    let second = gap.find_flaws(&pdb).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert!(a.same_defect(b));
        assert_ne!(a.id, b.id);
    }
}

#[test]
fn test_compute_solutions_leaves_the_plan_untouched() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, _) = load(&satellite.domain, &satellite.gap_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);
    let decisions = pdb.decisions().count();
    let relations = pdb.relations().count();

    single_flaw(&gap, &mut pdb);
    assert_eq!(pdb.decisions().count(), decisions);
    assert_eq!(pdb.relations().count(), relations);
    assert_eq!(pdb.transaction_depth(), 0);
}

#[test]
fn test_retract_and_restore_round_trip() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, _) = load(&satellite.domain, &satellite.semantic_connection_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);
    let flaw = single_flaw(&gap, &mut pdb);

    let mut effects = gap.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(effects.is_applied());
    let relation = effects.created_relations[0];
    assert!(pdb.relation(relation).unwrap().is_active());

    gap.retract(&mut pdb, &mut effects).unwrap();
    assert!(!effects.is_applied());
    assert!(!pdb.contains_relation(relation));
    assert_eq!(pdb.active_relations().count(), 0);
    let again = gap.find_flaws(&pdb).unwrap();
    assert_eq!(again.len(), 1);
    assert!(again[0].same_defect(&flaw));

    gap.restore(&mut pdb, &mut effects).unwrap();
    assert!(effects.is_applied());
    assert!(pdb.relation(relation).unwrap().is_active());
    assert!(gap.find_flaws(&pdb).unwrap().is_empty());
}

#[test]
fn test_retract_of_created_decisions_silences_them() {
    let satellite = SatelliteDomain::new().unwrap();
    let (mut pdb, _) = load(&satellite.domain, &satellite.gap_problem());
    let gap = resolver(&satellite.domain, ResolverType::Gap);
    let flaw = single_flaw(&gap, &mut pdb);

    let mut effects = gap.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    let slewing = effects.created_decisions[0];
    gap.retract(&mut pdb, &mut effects).unwrap();
    assert_eq!(pdb.decision(slewing).unwrap().state, DecisionState::Silent);
    assert!(pdb.agenda().is_empty());

    gap.restore(&mut pdb, &mut effects).unwrap();
    assert_eq!(pdb.agenda(), vec![slewing]);
    assert_eq!(pdb.relations_of(slewing).len(), 2);
}

#[test]
fn test_overlapping_activities_are_ordered_both_ways() {
    let drill = DrillDomain::new().unwrap();
    let (mut pdb, keys) = load(&drill.domain, &drill.overlapping_problem());
    let scheduling = resolver(&drill.domain, ResolverType::Scheduling);

    let flaw = single_flaw(&scheduling, &mut pdb);
    assert_eq!(flaw.flaw_type(), FlawType::SchedulingConflict);
    let orders: Vec<SolutionKind> = flaw.solutions.iter().map(|s| s.kind.clone()).collect();
    assert_eq!(
        orders,
        vec![
            SolutionKind::Ordering {
                reference: keys["first"],
                target: keys["second"],
            },
            SolutionKind::Ordering {
                reference: keys["second"],
                target: keys["first"],
            },
        ]
    );

    scheduling.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(scheduling.find_flaws(&pdb).unwrap().is_empty());
    let second = pdb.schedule(keys["second"]).unwrap();
    assert_eq!(second.start.lb, 10);
}

#[test]
fn test_infeasible_orderings_make_the_conflict_unsolvable() {
    let drill = DrillDomain::new().unwrap();
    let (mut pdb, keys) = load(&drill.domain, &drill.conflicting_problem());
    pdb.activate(keys["late"]).unwrap();
    let scheduling = resolver(&drill.domain, ResolverType::Scheduling);

    let mut flaws = scheduling.find_flaws(&pdb).unwrap();
    assert_eq!(flaws.len(), 1);
    let err = scheduling
        .compute_solutions(&mut pdb, &mut flaws[0])
        .unwrap_err();
    assert!(matches!(err, TimeforgeError::UnsolvableFlaw(_)));
    assert!(!flaws[0].is_solvable());
}

#[test]
fn test_over_consumption_is_repaired_by_planning_production() {
    let battery = BatteryDomain::new().unwrap();
    let (mut pdb, keys) = load(&battery.domain, &battery.over_consumption_problem());
    let reservoir = resolver(&battery.domain, ResolverType::Reservoir);

    let flaw = single_flaw(&reservoir, &mut pdb);
    let FlawKind::ReservoirOverflow(peak) = &flaw.kind else {
        panic!("expected a reservoir peak, got {flaw}");
    };
    assert_eq!(peak.direction, PeakDirection::Underflow);
    assert_eq!(peak.start_level, 10);
    assert_eq!(peak.critical.len(), 1);

    assert_eq!(flaw.solutions.len(), 1);
    assert_eq!(
        flaw.solutions[0].kind,
        SolutionKind::ResourcePlanning {
            value: battery.produce,
            amount: 5,
            before: Vec::new(),
            head: keys["drain"],
        }
    );

    reservoir.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(reservoir.find_flaws(&pdb).unwrap().is_empty());
}

#[test]
fn test_late_production_offers_scheduling_before_planning() {
    let battery = BatteryDomain::new().unwrap();
    let (mut pdb, keys) = load(&battery.domain, &battery.late_production_problem());
    let reservoir = resolver(&battery.domain, ResolverType::Reservoir);

    let flaw = single_flaw(&reservoir, &mut pdb);
    assert_eq!(flaw.solutions.len(), 2);
    match &flaw.solutions[0].kind {
        SolutionKind::ResourceScheduling {
            precedences,
            preserved,
        } => {
            assert_eq!(precedences, &vec![(keys["charge"], keys["drain"])]);
            assert!(*preserved > 0.0 && *preserved < 1.0);
        }
        other => panic!("expected scheduling first, got {other}"),
    }
    assert!(matches!(
        flaw.solutions[1].kind,
        SolutionKind::ResourcePlanning { amount: 15, .. }
    ));

    reservoir.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(reservoir.find_flaws(&pdb).unwrap().is_empty());
    assert!(pdb.schedule(keys["drain"]).unwrap().start.lb >= 31);
}

#[test]
fn test_every_dip_of_the_profile_is_a_peak() {
    let battery = BatteryDomain::new().unwrap();
    let (pdb, keys) = load(&battery.domain, &battery.two_dips_problem());
    let reservoir = resolver(&battery.domain, ResolverType::Reservoir);

    let flaws = reservoir.find_flaws(&pdb).unwrap();
    assert_eq!(flaws.len(), 2, "flaws: {flaws:?}");
    let peaks: Vec<&Peak> = flaws
        .iter()
        .map(|flaw| match &flaw.kind {
            FlawKind::ReservoirOverflow(peak) => peak,
            other => panic!("expected a reservoir peak, got {other:?}"),
        })
        .collect();
    assert!(peaks.iter().all(|p| p.direction == PeakDirection::Underflow));
    assert_eq!(peaks[0].start_level, 10);
    assert_eq!(peaks[0].critical.len(), 1);
    assert_eq!(peaks[0].critical[0].decision, keys["morning"]);
    assert_eq!(peaks[1].start_level, 15);
    assert_eq!(peaks[1].critical.len(), 1);
    assert_eq!(peaks[1].critical[0].decision, keys["evening"]);
}

#[test]
fn test_profile_places_culprits_early_and_remedies_late() {
    let battery = BatteryDomain::new().unwrap();
    let Resolver::Reservoir(reservoir) = resolver(&battery.domain, ResolverType::Reservoir) else {
        panic!("expected a reservoir resolver");
    };
    let (pdb, keys) = load(&battery.domain, &battery.late_production_problem());

    let underflow: Vec<DecisionId> = reservoir
        .profile(&pdb, PeakDirection::Underflow)
        .unwrap()
        .iter()
        .map(|e| e.decision)
        .collect();
    assert_eq!(underflow, vec![keys["drain"], keys["charge"]]);

    let overflow: Vec<DecisionId> = reservoir
        .profile(&pdb, PeakDirection::Overflow)
        .unwrap()
        .iter()
        .map(|e| e.decision)
        .collect();
    assert_eq!(overflow, vec![keys["charge"], keys["drain"]]);
}

#[test]
fn test_small_productions_each_cover_part_of_a_deficit() {
    let battery = BatteryDomain::new().unwrap();
    let (mut pdb, keys) = load(&battery.domain, &battery.partial_charges_problem());
    let reservoir = resolver(&battery.domain, ResolverType::Reservoir);

    let flaw = single_flaw(&reservoir, &mut pdb);
    let scheduled: Vec<DecisionId> = flaw
        .solutions
        .iter()
        .filter_map(|s| match &s.kind {
            SolutionKind::ResourceScheduling { precedences, .. } => {
                assert_eq!(precedences.len(), 1);
                assert_eq!(precedences[0].1, keys["drain"]);
                Some(precedences[0].0)
            }
            _ => None,
        })
        .collect();
    assert_eq!(scheduled.len(), 2);
    assert!(scheduled.contains(&keys["trickle"]));
    assert!(scheduled.contains(&keys["drip"]));
    assert!(matches!(
        flaw.solutions.last().unwrap().kind,
        SolutionKind::ResourcePlanning { amount: 2, .. }
    ));

    // One production leaves a peak of one unit.
    reservoir.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    let flaw = single_flaw(&reservoir, &mut pdb);
    let FlawKind::ReservoirOverflow(peak) = &flaw.kind else {
        panic!("expected a reservoir peak, got {flaw}");
    };
    assert_eq!(peak.start_level, 11);
    let SolutionKind::ResourceScheduling { precedences, .. } = &flaw.solutions[0].kind else {
        panic!("expected scheduling first, got {}", flaw.solutions[0].kind);
    };
    assert_ne!(precedences[0].0, scheduled[0]);
    assert!(matches!(
        flaw.solutions.last().unwrap().kind,
        SolutionKind::ResourcePlanning { amount: 1, .. }
    ));

    reservoir.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(reservoir.find_flaws(&pdb).unwrap().is_empty());
}

#[test]
fn test_minimal_critical_sets_of_a_peak() {
    let battery = BatteryDomain::new().unwrap();
    let Resolver::Reservoir(reservoir) = resolver(&battery.domain, ResolverType::Reservoir) else {
        panic!("expected a reservoir resolver");
    };
    let (pdb, keys) = load(&battery.domain, &battery.over_consumption_problem());
    let mut flaws = reservoir.find_flaws(&pdb).unwrap();
    let FlawKind::ReservoirOverflow(peak) = flaws.remove(0).kind else {
        panic!("expected a reservoir peak");
    };
    let sets = reservoir.minimal_critical_sets(&peak);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0][0].decision, keys["drain"]);
    assert_eq!(sets[0][0].amount, 15);
}

#[test]
fn test_preserved_space() {
    assert_eq!(preserved_space(Bounds::point(0), Bounds::point(10)), 1.0);
    assert_eq!(preserved_space(Bounds::point(10), Bounds::point(0)), 0.0);
    let overlap = preserved_space(Bounds::new(0, 10), Bounds::new(0, 10));
    assert!((overlap - 66.0 / 121.0).abs() < 1e-9);
    let later = preserved_space(Bounds::new(0, 10), Bounds::new(5, 15));
    assert!(later > overlap && later < 1.0);
}

#[test]
fn test_goal_expands_through_its_rule() {
    let rover = RoverDomain::new().unwrap();
    let (mut pdb, keys) = load(&rover.domain, &rover.observation_problem());
    let refinement = resolver(&rover.domain, ResolverType::PlanRefinement);

    let flaw = single_flaw(&refinement, &mut pdb);
    assert_eq!(flaw.kind, FlawKind::Goal { decision: keys["observe"] });
    // Problem goals must be expanded, so no unification is offered.
    assert_eq!(flaw.solutions.len(), 1);
    assert!(matches!(
        flaw.solutions[0].kind,
        SolutionKind::Expansion { rule: Some(_), .. }
    ));

    let effects = refinement.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert!(pdb.decision(keys["observe"]).unwrap().is_active());
    assert_eq!(effects.created_decisions.len(), 1);
    let picture = effects.created_decisions[0];
    assert_eq!(pdb.decision(picture).unwrap().value, rover.take_picture);
    assert_eq!(pdb.decision(picture).unwrap().causal_link, Some(keys["observe"]));
    assert_eq!(pdb.agenda(), vec![picture]);
}

#[test]
fn test_goal_unifies_with_a_matching_activity() {
    let drill = DrillDomain::new().unwrap();
    let mut problem = Problem::new();
    problem.add_fact(
        timeforge_plan::ProblemDecision::new("first", drill.drilling)
            .with_start(Bounds::new(0, 50)),
    );
    let (mut pdb, keys) = load(&drill.domain, &problem);
    let goal = pdb
        .create(DecisionSpec::new(drill.drilling).with_start(Bounds::point(20)))
        .unwrap();
    let refinement = resolver(&drill.domain, ResolverType::PlanRefinement);

    let flaw = single_flaw(&refinement, &mut pdb);
    let kinds: Vec<SolutionKind> = flaw.solutions.iter().map(|s| s.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            SolutionKind::Unification {
                goal,
                unifier: keys["first"],
            },
            SolutionKind::Expansion { goal, rule: None },
        ]
    );

    let mut effects = refinement.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert_eq!(pdb.decision(goal).unwrap().state, DecisionState::Silent);
    assert!(pdb.agenda().is_empty());

    refinement.retract(&mut pdb, &mut effects).unwrap();
    assert_eq!(pdb.agenda(), vec![goal]);
}

#[test]
fn test_unification_imposes_requested_bounds_on_the_unifier() {
    let drill = DrillDomain::new().unwrap();
    let mut problem = Problem::new();
    problem.add_fact(
        timeforge_plan::ProblemDecision::new("first", drill.drilling)
            .with_start(Bounds::new(0, 50)),
    );
    let (mut pdb, keys) = load(&drill.domain, &problem);
    let unifier = keys["first"];
    let goal = pdb
        .create(DecisionSpec::new(drill.drilling).with_start(Bounds::point(20)))
        .unwrap();
    let refinement = resolver(&drill.domain, ResolverType::PlanRefinement);

    let flaw = single_flaw(&refinement, &mut pdb);
    let mut effects = refinement.apply(&mut pdb, &flaw.solutions[0]).unwrap();
    assert_eq!(pdb.schedule(unifier).unwrap().start, Bounds::point(20));
    assert_eq!(effects.created_relations.len(), 1);

    refinement.retract(&mut pdb, &mut effects).unwrap();
    assert_eq!(pdb.schedule(unifier).unwrap().start, Bounds::new(0, 50));
    assert_eq!(pdb.agenda(), vec![goal]);

    refinement.restore(&mut pdb, &mut effects).unwrap();
    assert_eq!(pdb.schedule(unifier).unwrap().start, Bounds::point(20));
    assert_eq!(pdb.decision(goal).unwrap().state, DecisionState::Silent);
}

#[test]
fn test_unification_requires_compatible_bounds() {
    let drill = DrillDomain::new().unwrap();
    let (mut pdb, _) = load(&drill.domain, &drill.conflicting_problem());
    let goal = pdb
        .create(DecisionSpec::new(drill.drilling).with_start(Bounds::point(60)))
        .unwrap();
    let refinement = resolver(&drill.domain, ResolverType::PlanRefinement);

    let mut flaws: Vec<Flaw> = refinement
        .find_flaws(&pdb)
        .unwrap()
        .into_iter()
        .filter(|f| f.kind == FlawKind::Goal { decision: goal })
        .collect();
    refinement.compute_solutions(&mut pdb, &mut flaws[0]).unwrap();
    assert!(flaws[0]
        .solutions
        .iter()
        .all(|s| !matches!(s.kind, SolutionKind::Unification { .. })));
}
