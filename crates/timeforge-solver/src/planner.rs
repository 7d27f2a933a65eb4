//! The planner: flaw detection, branching and plan-space navigation.
//!
//! Exactly one search node is materialized on the plan database at a time:
//! the operators of `applied` are the path from the root to it. Moving to
//! another node retracts the operators down to the common ancestor, then
//! applies (or restores) the operators of the new branch.
//!
//! The effects of an operator are kept while some node on the fringe or
//! on the applied path still refers to it. Once the last such node is
//! gone the ledger is dropped and the decisions it left silent are freed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use rayon::prelude::*;
use tracing::{debug, info, trace};

use timeforge_config::{FlawSelectionType, PlannerConfig, SearchStrategyType};
use timeforge_core::{DecisionId, IdGenerator, Result, SolutionId, TimeforgeError};
use timeforge_plan::{PlanDataBase, PlanDomain, Problem, SolutionPlan};

use crate::flaw::Flaw;
use crate::heuristic::{FlawSelectionHeuristic, HierarchicalFlawSelection, RandomFlawSelection};
use crate::resolver::Resolver;
use crate::scope::SearchScope;
use crate::search::{
    DepthFirstCostFirstStrategy, DepthFirstStrategy, Operator, SearchSpaceNode, SearchStrategy,
};
use crate::solution::Effects;
use crate::statistics::SearchStatistics;
use crate::termination::{NodeCountTermination, OrTermination, Termination, TimeTermination};

/// Plan-space search over one plan database.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Weak};
/// use timeforge_config::PlannerConfig;
/// use timeforge_core::Bounds;
/// use timeforge_plan::{PlanDomain, Problem, ProblemDecision};
/// use timeforge_solver::Planner;
///
/// let mut domain = PlanDomain::new("demo");
/// let sv = domain.add_state_variable("sv", false);
/// let busy = domain.add_value(sv, "Busy", Bounds::new(5, 10), true).unwrap();
///
/// let mut problem = Problem::new();
/// problem.add_goal(ProblemDecision::new("job", busy));
///
/// let mut planner = Planner::new(Arc::new(domain), &PlannerConfig::new()).unwrap();
/// planner.setup(&problem).unwrap();
/// let plan = planner.solve().unwrap();
/// assert_eq!(plan.token_count(), 1);
/// ```
#[derive(Debug)]
pub struct Planner {
    pdb: PlanDataBase,
    resolvers: Vec<Resolver>,
    strategy: Box<dyn SearchStrategy>,
    heuristic: Box<dyn FlawSelectionHeuristic>,
    termination: Option<Box<dyn Termination>>,
    scope: SearchScope,
    /// Ledgers of the solutions applied so far, keyed by solution.
    effects: HashMap<SolutionId, Ledger>,
    /// Operators materialized on the plan database, root first.
    applied: Vec<Arc<Operator>>,
}

/// Effects of an applied operator, alive while a node holds the operator.
#[derive(Debug)]
struct Ledger {
    operator: Weak<Operator>,
    effects: Effects,
}

impl Planner {
    /// Builds a planner from configuration with a fresh id generator.
    ///
    /// # Errors
    ///
    /// `Config` if the configuration does not validate.
    pub fn new(domain: Arc<PlanDomain>, config: &PlannerConfig) -> Result<Self> {
        Self::with_ids(domain, config, IdGenerator::new())
    }

    /// Builds a planner drawing every id from `ids`.
    pub fn with_ids(domain: Arc<PlanDomain>, config: &PlannerConfig, ids: IdGenerator) -> Result<Self> {
        config
            .validate()
            .map_err(|e| TimeforgeError::Config(e.to_string()))?;

        let resolvers = Resolver::for_domain(&domain, &config.costs);
        let strategy: Box<dyn SearchStrategy> = match config.search_strategy {
            SearchStrategyType::DepthFirst => Box::new(DepthFirstStrategy::new()),
            SearchStrategyType::DepthFirstCostFirst => Box::new(DepthFirstCostFirstStrategy::new()),
        };
        let heuristic: Box<dyn FlawSelectionHeuristic> = match config.flaw_selection {
            FlawSelectionType::Random => {
                Box::new(RandomFlawSelection::from_seed_option(config.random_seed))
            }
            FlawSelectionType::Hierarchical => Box::new(HierarchicalFlawSelection::new(&domain)),
        };

        let mut limits = OrTermination::new();
        if let Some(budget) = config.time_limit() {
            limits.push(TimeTermination::new(budget));
        }
        if let Some(nodes) = config.node_limit() {
            limits.push(NodeCountTermination::new(nodes));
        }
        let termination = limits.into_single();

        Ok(Self {
            pdb: PlanDataBase::new(domain, config.horizon, ids),
            resolvers,
            strategy,
            heuristic,
            termination,
            scope: SearchScope::new(),
            effects: HashMap::new(),
            applied: Vec::new(),
        })
    }

    pub fn with_strategy<S: SearchStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn with_heuristic<H: FlawSelectionHeuristic + 'static>(mut self, heuristic: H) -> Self {
        self.heuristic = Box::new(heuristic);
        self
    }

    /// Replaces the configured termination.
    pub fn with_termination<T: Termination + 'static>(mut self, termination: T) -> Self {
        self.termination = Some(Box::new(termination));
        self
    }

    #[inline]
    pub fn pdb(&self) -> &PlanDataBase {
        &self.pdb
    }

    pub fn resolvers(&self) -> &[Resolver] {
        &self.resolvers
    }

    pub fn statistics(&self) -> &SearchStatistics {
        self.scope.stats()
    }

    /// Loads a problem and checks that none of its initial flaws is
    /// unsolvable.
    ///
    /// Returns the decision created for each problem key.
    ///
    /// # Errors
    ///
    /// `ProblemInitialization`; the plan database is left as before.
    pub fn setup(&mut self, problem: &Problem) -> Result<BTreeMap<String, DecisionId>> {
        self.pdb.begin();
        let keys = match self.pdb.setup(problem) {
            Ok(keys) => keys,
            Err(e) => {
                self.pdb.rollback();
                return Err(e);
            }
        };
        match self.check_initial_flaws() {
            Ok(()) => {
                self.pdb.commit()?;
                Ok(keys)
            }
            Err(e) => {
                self.pdb.rollback();
                Err(TimeforgeError::ProblemInitialization(e.to_string()))
            }
        }
    }

    fn check_initial_flaws(&mut self) -> Result<()> {
        for mut flaw in self.detect_flaws()? {
            let resolver = &self.resolvers[flaw.resolver];
            resolver.compute_solutions(&mut self.pdb, &mut flaw)?;
        }
        Ok(())
    }

    /// Runs every resolver's detection in parallel.
    ///
    /// Each flaw is tagged with the index of the resolver that found it.
    pub fn detect_flaws(&self) -> Result<Vec<Flaw>> {
        let pdb = &self.pdb;
        let batches: Vec<Result<Vec<Flaw>>> = self
            .resolvers
            .par_iter()
            .enumerate()
            .map(|(index, resolver)| {
                let mut flaws = resolver.find_flaws(pdb)?;
                for flaw in &mut flaws {
                    flaw.resolver = index;
                }
                Ok(flaws)
            })
            .collect();
        let mut flaws = Vec::new();
        for batch in batches {
            flaws.extend(batch?);
        }
        Ok(flaws)
    }

    /// Searches for a flaw-free plan.
    ///
    /// On success the plan stays materialized on the plan database.
    ///
    /// # Errors
    ///
    /// `NoSolutionFound` when the fringe is exhausted or a termination
    /// fires. Any error leaves the plan database back at the root state.
    pub fn solve(&mut self) -> Result<SolutionPlan> {
        self.scope.start_solving();
        self.strategy.clear();
        let root = SearchSpaceNode::root(self.pdb.ids().next_node(), self.pdb.makespan().min);
        self.strategy.enqueue(root);

        info!(
            event = "solve_start",
            strategy = self.strategy.name(),
            heuristic = self.heuristic.name(),
            resolvers = self.resolvers.len(),
        );

        match self.search() {
            Ok(plan) => {
                let stats = self.scope.stats();
                info!(
                    event = "solve_end",
                    nodes = stats.nodes_expanded,
                    backtracks = stats.backtracks,
                    duration_ms = stats.elapsed().as_millis() as u64,
                    makespan = plan.makespan.lb,
                );
                Ok(plan)
            }
            Err(e) => self.abort(e),
        }
    }

    fn search(&mut self) -> Result<SolutionPlan> {
        loop {
            self.scope.set_fringe_size(self.strategy.fringe_size());
            if self
                .termination
                .as_ref()
                .is_some_and(|t| t.is_terminated(&self.scope))
            {
                let nodes = self.scope.nodes_expanded();
                return Err(TimeforgeError::NoSolutionFound(format!(
                    "search budget exhausted after {nodes} node(s)"
                )));
            }
            let Some(mut node) = self.strategy.dequeue() else {
                return Err(TimeforgeError::NoSolutionFound(
                    "search space exhausted".to_string(),
                ));
            };
            self.prune_ledgers()?;

            if let Err(e) = self.navigate(&node) {
                if !recoverable(&e) {
                    return Err(e);
                }
                self.backtrack(&node, &e);
                continue;
            }

            let agenda = self.pdb.agenda();
            trace!("Materialized {} with {} open goal(s)", node, agenda.len());
            node.set_agenda(agenda);
            let flaws = self.detect_flaws()?;
            if flaws.is_empty() {
                return self.pdb.plan();
            }
            self.scope.stats_mut().record_flaws(flaws.len());

            let candidates = self.heuristic.select(flaws, &self.pdb)?;
            let Some(flaw) = self.fail_first(candidates)? else {
                self.backtrack(&node, &TimeforgeError::UnsolvableFlaw(node.to_string()));
                continue;
            };
            trace!("Branching on {} with {} solution(s)", flaw, flaw.solutions.len());

            let resolver = flaw.resolver;
            let children: Vec<SearchSpaceNode> = flaw
                .solutions
                .into_iter()
                .map(|solution| {
                    SearchSpaceNode::child(
                        self.pdb.ids().next_node(),
                        &node,
                        Operator::new(solution, resolver),
                    )
                })
                .collect();
            self.scope.stats_mut().record_expansion(children.len());
            self.strategy.enqueue_all(children);
        }
    }

    /// Computes the solutions of every candidate and keeps the one with the
    /// fewest. `None` if any candidate is unsolvable.
    fn fail_first(&mut self, candidates: Vec<Flaw>) -> Result<Option<Flaw>> {
        let mut best: Option<Flaw> = None;
        for mut flaw in candidates {
            let resolver = &self.resolvers[flaw.resolver];
            match resolver.compute_solutions(&mut self.pdb, &mut flaw) {
                Ok(()) => {}
                Err(TimeforgeError::UnsolvableFlaw(reason)) => {
                    debug!("Unsolvable flaw: {}", reason);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
            if best
                .as_ref()
                .map_or(true, |b| flaw.solutions.len() < b.solutions.len())
            {
                best = Some(flaw);
            }
        }
        Ok(best)
    }

    /// Materializes `node` on the plan database.
    fn navigate(&mut self, node: &SearchSpaceNode) -> Result<()> {
        let target = node.operators();
        let common = self
            .applied
            .iter()
            .zip(target)
            .take_while(|(a, b)| a.id() == b.id())
            .count();
        while self.applied.len() > common {
            self.retract_last()?;
        }
        for operator in &target[common..] {
            let resolver = &self.resolvers[operator.resolver];
            match self.effects.get_mut(&operator.id()) {
                Some(ledger) => resolver.restore(&mut self.pdb, &mut ledger.effects)?,
                None => {
                    let effects = resolver.apply(&mut self.pdb, &operator.solution)?;
                    let ledger = Ledger {
                        operator: Arc::downgrade(operator),
                        effects,
                    };
                    self.effects.insert(operator.id(), ledger);
                }
            }
            self.applied.push(Arc::clone(operator));
            self.scope.stats_mut().record_applied();
        }
        Ok(())
    }

    fn retract_last(&mut self) -> Result<()> {
        let Some(operator) = self.applied.pop() else {
            return Ok(());
        };
        if let Some(ledger) = self.effects.get_mut(&operator.id()) {
            self.resolvers[operator.resolver].retract(&mut self.pdb, &mut ledger.effects)?;
        }
        trace!("Retracted {}", operator);
        Ok(())
    }

    /// Retracts every applied operator, back to the root state, and
    /// discards the fringe.
    pub fn reset(&mut self) -> Result<()> {
        while !self.applied.is_empty() {
            self.retract_last()?;
        }
        self.strategy.clear();
        self.prune_ledgers()
    }

    /// Drops the ledgers no node refers to and frees what they created.
    fn prune_ledgers(&mut self) -> Result<()> {
        let dead: Vec<SolutionId> = self
            .effects
            .iter()
            .filter(|(_, ledger)| ledger.operator.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            if let Some(ledger) = self.effects.remove(id) {
                ledger.effects.release(&mut self.pdb)?;
            }
        }
        if !dead.is_empty() {
            trace!("Dropped {} ledger(s), {} live", dead.len(), self.effects.len());
        }
        Ok(())
    }

    /// Number of solution ledgers currently kept.
    pub fn ledger_count(&self) -> usize {
        self.effects.len()
    }

    fn backtrack(&mut self, node: &SearchSpaceNode, cause: &TimeforgeError) {
        self.scope.stats_mut().record_backtrack();
        debug!(
            event = "backtrack",
            node = %node.id(),
            depth = node.depth(),
            cause = %cause,
        );
    }

    /// Returns to the root state and reports `error`.
    fn abort(&mut self, error: TimeforgeError) -> Result<SolutionPlan> {
        self.reset()?;
        let stats = self.scope.stats();
        info!(
            event = "solve_end",
            nodes = stats.nodes_expanded,
            backtracks = stats.backtracks,
            duration_ms = stats.elapsed().as_millis() as u64,
            solved = false,
            cause = %error,
        );
        Err(error)
    }
}

/// Failures the search recovers from by abandoning the node.
fn recoverable(error: &TimeforgeError) -> bool {
    error.is_propagation_failure()
        || matches!(
            error,
            TimeforgeError::UnsolvableFlaw(_) | TimeforgeError::PseudoControllability { .. }
        )
}

#[cfg(test)]
mod tests;
