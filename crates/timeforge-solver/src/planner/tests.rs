//! Tests for the planner.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use timeforge_config::{FlawSelectionType, PlannerConfig, SearchStrategyType};
use timeforge_core::{Bounds, TimeforgeError};
use timeforge_plan::{DecisionState, Problem, ProblemDecision};
use timeforge_test::{BatteryDomain, DrillDomain, RoverDomain, HORIZON};

use super::*;
use crate::termination::ExternalTermination;

/// Passes every flaw through on the first call and fails afterwards.
#[derive(Debug, Default)]
struct FailAfterRoot {
    calls: usize,
}

impl FlawSelectionHeuristic for FailAfterRoot {
    fn select(&mut self, flaws: Vec<Flaw>, _pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        self.calls += 1;
        if self.calls > 1 {
            return Err(TimeforgeError::Domain("selection failed".to_string()));
        }
        Ok(flaws)
    }

    fn name(&self) -> &'static str {
        "fail-after-root"
    }
}

type PlanState = (
    Vec<DecisionId>,
    Vec<DecisionId>,
    Vec<DecisionId>,
    Vec<(DecisionId, Bounds)>,
    usize,
    usize,
);

fn plan_state(pdb: &PlanDataBase) -> PlanState {
    let active = pdb.decisions_with_state(DecisionState::Active);
    let starts = active
        .iter()
        .map(|d| (*d, pdb.schedule(*d).unwrap().start))
        .collect();
    (
        pdb.decisions_with_state(DecisionState::Pending),
        active,
        pdb.decisions_with_state(DecisionState::Silent),
        starts,
        pdb.active_relations().count(),
        pdb.decisions().count(),
    )
}

fn config() -> PlannerConfig {
    PlannerConfig::new().with_horizon(HORIZON)
}

fn rover_planner(config: &PlannerConfig) -> (RoverDomain, Planner, BTreeMap<String, DecisionId>) {
    let rover = RoverDomain::new().unwrap();
    let mut planner = Planner::new(Arc::clone(&rover.domain), config).unwrap();
    let keys = planner.setup(&rover.observation_problem()).unwrap();
    (rover, planner, keys)
}

#[test]
fn test_new_rejects_invalid_config() {
    let rover = RoverDomain::new().unwrap();
    let err = Planner::new(Arc::clone(&rover.domain), &PlannerConfig::new().with_horizon(0))
        .unwrap_err();
    assert!(matches!(err, TimeforgeError::Config(_)));
}

#[test]
fn test_setup_reports_goals_as_flaws() {
    let (_, planner, keys) = rover_planner(&config());
    let flaws = planner.detect_flaws().unwrap();
    assert_eq!(flaws.len(), 1);
    assert_eq!(flaws[0].kind, crate::flaw::FlawKind::Goal { decision: keys["observe"] });
    let resolver = &planner.resolvers()[flaws[0].resolver];
    assert_eq!(resolver.resolver_type(), crate::resolver::ResolverType::PlanRefinement);
}

#[test]
fn test_setup_rolls_back_on_unsolvable_initial_flaw() {
    let drill = DrillDomain::new().unwrap();
    let mut problem = Problem::new();
    problem
        .add_fact(ProblemDecision::new("fixed", drill.drilling).with_start(Bounds::point(0)))
        .add_fact(ProblemDecision::new("late", drill.drilling).with_start(Bounds::point(5)));
    let mut planner = Planner::new(Arc::clone(&drill.domain), &config()).unwrap();

    let err = planner.setup(&problem).unwrap_err();
    assert!(matches!(err, TimeforgeError::ProblemInitialization(_)));
    assert_eq!(planner.pdb().decisions().count(), 0);
    assert_eq!(planner.pdb().transaction_depth(), 0);
}

#[test]
fn test_solve_rover_depth_first() {
    let config = config().with_search_strategy(SearchStrategyType::DepthFirst);
    let (_, mut planner, keys) = rover_planner(&config);

    let plan = planner.solve().unwrap();
    assert!(planner.detect_flaws().unwrap().is_empty());
    assert!(planner.pdb().agenda().is_empty());
    assert!(planner.pdb().decision(keys["observe"]).unwrap().is_active());

    let mission = plan.timeline("mission").unwrap();
    let labels: Vec<&str> = mission.tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(labels, vec!["Idle", "Observe"]);
    let camera = plan.timeline("camera").unwrap();
    let labels: Vec<&str> = camera.tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(labels, vec!["Idle", "TakePicture"]);

    let stats = planner.statistics();
    assert!(stats.nodes_expanded > 0);
    assert!(stats.solutions_applied > 0);
}

#[test]
fn test_solve_rover_depth_first_cost_first() {
    let config = config().with_search_strategy(SearchStrategyType::DepthFirstCostFirst);
    let (_, mut planner, _) = rover_planner(&config);

    let plan = planner.solve().unwrap();
    assert_eq!(plan.token_count(), 4);
    // Observe contains the picture on the camera timeline.
    let observe = &plan.timeline("mission").unwrap().tokens[1];
    let picture = &plan.timeline("camera").unwrap().tokens[1];
    assert!(observe.start.lb <= picture.start.lb);
    assert!(picture.end.ub <= observe.end.ub);
}

#[test]
fn test_solve_with_seeded_random_selection() {
    let config = config()
        .with_flaw_selection(FlawSelectionType::Random)
        .with_random_seed(11)
        .with_node_limit(500);
    let (_, mut planner, _) = rover_planner(&config);

    let plan = planner.solve().unwrap();
    assert_eq!(plan.token_count(), 4);
    assert!(planner.detect_flaws().unwrap().is_empty());
}

#[test]
fn test_solve_reservoir_plans_a_production() {
    let battery = BatteryDomain::new().unwrap();
    let mut planner = Planner::new(Arc::clone(&battery.domain), &config()).unwrap();
    planner.setup(&battery.over_consumption_problem()).unwrap();

    let plan = planner.solve().unwrap();
    let tokens = &plan.timeline("battery").unwrap().tokens;
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].value, "produce");
    assert_eq!(tokens[0].parameters, vec!["5".to_string()]);
}

#[test]
fn test_exhausted_search_returns_to_root() {
    let drill = DrillDomain::new().unwrap();
    let mut planner = Planner::new(Arc::clone(&drill.domain), &config()).unwrap();
    let keys = planner.setup(&drill.conflicting_problem()).unwrap();

    let err = planner.solve().unwrap_err();
    assert!(matches!(err, TimeforgeError::NoSolutionFound(_)));
    assert_eq!(planner.pdb().agenda(), vec![keys["late"]]);
    assert_eq!(
        planner.pdb().decision(keys["late"]).unwrap().state,
        DecisionState::Pending
    );
    assert!(planner.statistics().backtracks >= 1);
    assert_eq!(planner.ledger_count(), 0);
}

#[test]
fn test_error_below_the_root_returns_to_root() {
    let (_, planner, _) = rover_planner(&config());
    let mut planner = planner.with_heuristic(FailAfterRoot::default());
    let root = plan_state(planner.pdb());

    let err = planner.solve().unwrap_err();
    assert!(matches!(err, TimeforgeError::Domain(_)));
    assert!(planner.statistics().solutions_applied > 0);
    assert_eq!(plan_state(planner.pdb()), root);
    assert_eq!(planner.ledger_count(), 0);
    assert_eq!(planner.pdb().transaction_depth(), 0);
}

#[test]
fn test_solve_keeps_only_ledgers_of_live_nodes() {
    let config = config().with_search_strategy(SearchStrategyType::DepthFirst);
    let (_, mut planner, _) = rover_planner(&config);
    planner.solve().unwrap();
    let applied = planner.statistics().solutions_applied as usize;
    assert!(planner.ledger_count() > 0);
    assert!(planner.ledger_count() <= applied);

    planner.reset().unwrap();
    assert_eq!(planner.ledger_count(), 0);
    assert!(planner
        .pdb()
        .decisions_with_state(DecisionState::Silent)
        .is_empty());
}

#[test]
fn test_node_limit_stops_the_search() {
    let config = config().with_node_limit(1);
    let (_, mut planner, keys) = rover_planner(&config);

    let err = planner.solve().unwrap_err();
    assert!(matches!(err, TimeforgeError::NoSolutionFound(_)));
    assert_eq!(planner.statistics().nodes_expanded, 1);
    assert!(planner.pdb().decision(keys["observe"]).unwrap().is_pending());
    assert_eq!(planner.pdb().decisions().count(), 3);
}

#[test]
fn test_external_termination_before_first_node() {
    let flag = Arc::new(AtomicBool::new(true));
    let (_, planner, _) = rover_planner(&config());
    let mut planner = planner.with_termination(ExternalTermination::new(flag));

    let err = planner.solve().unwrap_err();
    assert!(matches!(err, TimeforgeError::NoSolutionFound(_)));
    assert_eq!(planner.statistics().nodes_expanded, 0);
}

#[test]
fn test_solve_twice_is_stable() {
    let (_, mut planner, _) = rover_planner(&config());
    let first = planner.solve().unwrap();
    let second = planner.solve().unwrap();
    assert_eq!(first.token_count(), second.token_count());
}
