//! The plan database.
//!
//! Decisions and relations live in arenas addressed by handles drawn from
//! the injected [`IdGenerator`]. Each component keeps its decisions keyed
//! by lifecycle state; relations are indexed per endpoint in a side table,
//! so rewriting an endpoint is a handle update.
//!
//! Mutating primitives are transactional: see [`crate::transaction`].

mod decisions;
mod relations;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use timeforge_core::{
    Bounds, ComponentId, DecisionId, IdGenerator, RelationId, Result, TimeforgeError,
};
use timeforge_parameter::{DomainParameterStore, ParameterStore, ParameterValues};
use timeforge_temporal::{IntervalId, IntervalSchedule, Makespan, TemporalFacade};

use crate::decision::{Decision, DecisionSpec, DecisionState};
use crate::domain::PlanDomain;
use crate::plan::{PlanRelation, PlanTimeline, PlanToken, SolutionPlan};
use crate::problem::Problem;
use crate::relation::Relation;
use crate::transaction::TransactionLog;
use crate::value::ResourceEffect;

/// Decisions of one component keyed by lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionSets {
    pub pending: BTreeSet<DecisionId>,
    pub active: BTreeSet<DecisionId>,
    pub silent: BTreeSet<DecisionId>,
}

impl DecisionSets {
    pub fn get(&self, state: DecisionState) -> &BTreeSet<DecisionId> {
        match state {
            DecisionState::Pending => &self.pending,
            DecisionState::Active => &self.active,
            DecisionState::Silent => &self.silent,
        }
    }

    fn get_mut(&mut self, state: DecisionState) -> &mut BTreeSet<DecisionId> {
        match state {
            DecisionState::Pending => &mut self.pending,
            DecisionState::Active => &mut self.active,
            DecisionState::Silent => &mut self.silent,
        }
    }

    fn remove(&mut self, id: DecisionId) {
        self.pending.remove(&id);
        self.active.remove(&id);
        self.silent.remove(&id);
    }
}

/// A production or consumption event on a reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEvent {
    pub decision: DecisionId,
    pub effect: ResourceEffect,
    /// Bound amount, or the pessimistic end of the amount range.
    pub amount: i64,
}

impl ResourceEvent {
    /// Level change caused by the event.
    pub fn delta(&self) -> i64 {
        match self.effect {
            ResourceEffect::Production => self.amount,
            ResourceEffect::Consumption => -self.amount,
        }
    }
}

/// Transactional store of decisions and relations over one domain.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use timeforge_core::{Bounds, IdGenerator};
/// use timeforge_plan::{DecisionSpec, PlanDataBase, PlanDomain};
///
/// let mut domain = PlanDomain::new("demo");
/// let sv = domain.add_state_variable("sv", false);
/// let busy = domain.add_value(sv, "Busy", Bounds::new(5, 10), true).unwrap();
///
/// let mut pdb = PlanDataBase::new(Arc::new(domain), 100, IdGenerator::new());
/// let d = pdb.create(DecisionSpec::new(busy)).unwrap();
/// pdb.activate(d).unwrap();
/// assert_eq!(pdb.schedule(d).unwrap().duration, Bounds::new(5, 10));
///
/// pdb.delete(d).unwrap();
/// assert!(pdb.agenda().is_empty());
/// ```
#[derive(Debug)]
pub struct PlanDataBase {
    domain: Arc<PlanDomain>,
    ids: IdGenerator,
    temporal: TemporalFacade,
    parameters: Box<dyn ParameterStore>,
    decisions: BTreeMap<DecisionId, Decision>,
    relations: BTreeMap<RelationId, Relation>,
    incidence: BTreeMap<DecisionId, BTreeSet<RelationId>>,
    components: Vec<DecisionSets>,
    log: TransactionLog,
}

impl PlanDataBase {
    /// Creates a plan database backed by a [`DomainParameterStore`].
    pub fn new(domain: Arc<PlanDomain>, horizon: i64, ids: IdGenerator) -> Self {
        Self::with_parameter_store(domain, horizon, ids, Box::new(DomainParameterStore::new()))
    }

    pub fn with_parameter_store(
        domain: Arc<PlanDomain>,
        horizon: i64,
        ids: IdGenerator,
        parameters: Box<dyn ParameterStore>,
    ) -> Self {
        let components = vec![DecisionSets::default(); domain.components().len()];
        Self {
            domain,
            ids,
            temporal: TemporalFacade::new(horizon),
            parameters,
            decisions: BTreeMap::new(),
            relations: BTreeMap::new(),
            incidence: BTreeMap::new(),
            components,
            log: TransactionLog::default(),
        }
    }

    #[inline]
    pub fn domain(&self) -> &Arc<PlanDomain> {
        &self.domain
    }

    #[inline]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    #[inline]
    pub fn horizon(&self) -> i64 {
        self.temporal.horizon()
    }

    #[inline]
    pub fn temporal(&self) -> &TemporalFacade {
        &self.temporal
    }

    pub fn parameter_store(&self) -> &dyn ParameterStore {
        self.parameters.as_ref()
    }

    // ---- transactions ----

    /// Opens a nested transaction.
    pub fn begin(&mut self) {
        self.log.begin();
    }

    /// Commits the innermost transaction into its parent.
    pub fn commit(&mut self) -> Result<()> {
        if self.log.commit() {
            Ok(())
        } else {
            Err(TimeforgeError::Domain(
                "commit without an open transaction".to_string(),
            ))
        }
    }

    /// Undoes every change of the innermost transaction, most recent first.
    pub fn rollback(&mut self) {
        let Some(undos) = self.log.take_for_rollback() else {
            warn!("Rollback without an open transaction");
            return;
        };
        let previous = self.log.set_replaying(true);
        for undo in undos {
            if let Err(e) = undo(self) {
                warn!("Undo failed during rollback: {}", e);
            }
        }
        self.log.set_replaying(previous);
    }

    /// Runs `f` in a transaction: committed on success, rolled back on error.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin();
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    /// Runs `f` in a transaction that is always rolled back.
    ///
    /// Used to test candidate changes: propagate, verify, retract.
    pub fn probe<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin();
        let result = f(self);
        self.rollback();
        result
    }

    /// Number of open transactions.
    pub fn transaction_depth(&self) -> usize {
        self.log.depth()
    }

    pub(crate) fn record<F>(&mut self, undo: F)
    where
        F: FnOnce(&mut PlanDataBase) -> Result<()> + Send + Sync + 'static,
    {
        self.log.record(Box::new(undo));
    }

    // ---- queries ----

    pub fn decision(&self, id: DecisionId) -> Result<&Decision> {
        self.decisions
            .get(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown decision {id}")))
    }

    pub fn relation(&self, id: RelationId) -> Result<&Relation> {
        self.relations
            .get(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown relation {id}")))
    }

    pub fn contains_relation(&self, id: RelationId) -> bool {
        self.relations.contains_key(&id)
    }

    pub fn decisions(&self) -> impl Iterator<Item = &Decision> + '_ {
        self.decisions.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.values()
    }

    /// Decisions of `component` in `state`.
    pub fn decisions_in(&self, component: ComponentId, state: DecisionState) -> Vec<DecisionId> {
        self.components
            .get(component.0)
            .map(|sets| sets.get(state).iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn decision_sets(&self, component: ComponentId) -> Result<&DecisionSets> {
        self.components
            .get(component.0)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown component {component}")))
    }

    /// Decisions in `state` over all components.
    pub fn decisions_with_state(&self, state: DecisionState) -> Vec<DecisionId> {
        let mut ids: Vec<DecisionId> = self
            .components
            .iter()
            .flat_map(|sets| sets.get(state).iter().copied())
            .collect();
        ids.sort();
        ids
    }

    /// Open goals: every pending decision.
    pub fn agenda(&self) -> Vec<DecisionId> {
        self.decisions_with_state(DecisionState::Pending)
    }

    /// Relations touching a decision.
    pub fn relations_of(&self, decision: DecisionId) -> Vec<RelationId> {
        self.incidence
            .get(&decision)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn active_relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.values().filter(|r| r.is_active())
    }

    /// True if both endpoints belong to the same component.
    pub fn is_local(&self, relation: &Relation) -> Result<bool> {
        Ok(self.decision(relation.reference)?.component
            == self.decision(relation.target)?.component)
    }

    /// Relations whose endpoints both belong to `component`.
    pub fn local_relations(&self, component: ComponentId) -> Vec<RelationId> {
        self.relations
            .values()
            .filter(|r| {
                self.decision(r.reference)
                    .is_ok_and(|d| d.component == component)
                    && self.decision(r.target).is_ok_and(|d| d.component == component)
            })
            .map(|r| r.id)
            .collect()
    }

    /// Cross-component relations owned by the plan database.
    pub fn global_relations(&self) -> Vec<RelationId> {
        self.relations
            .values()
            .filter(|r| !self.is_local(r).unwrap_or(true))
            .map(|r| r.id)
            .collect()
    }

    /// Interval of an active decision.
    pub fn interval_of(&self, decision: DecisionId) -> Result<IntervalId> {
        self.decision(decision)?.interval().ok_or_else(|| {
            TimeforgeError::Domain(format!("decision {decision} has no token"))
        })
    }

    pub fn schedule(&self, decision: DecisionId) -> Result<IntervalSchedule> {
        self.temporal.schedule(self.interval_of(decision)?)
    }

    /// Distance between the end of `source` and the start of `target`.
    pub fn distance(&self, source: DecisionId, target: DecisionId) -> Result<Bounds> {
        self.temporal
            .distance(self.interval_of(source)?, self.interval_of(target)?)
    }

    pub fn can_overlap(&self, a: DecisionId, b: DecisionId) -> Result<bool> {
        self.temporal
            .can_overlap(self.interval_of(a)?, self.interval_of(b)?)
    }

    pub fn makespan(&self) -> Makespan {
        self.temporal.makespan()
    }

    /// Current values of the `index`-th parameter of an active decision.
    pub fn parameter_values(&self, decision: DecisionId, index: usize) -> Result<ParameterValues> {
        let d = self.decision(decision)?;
        let parameter = d
            .token
            .as_ref()
            .and_then(|t| t.parameters.get(index))
            .ok_or_else(|| {
                TimeforgeError::Domain(format!("decision {decision} has no parameter {index}"))
            })?;
        self.parameters.values(*parameter)
    }

    /// Rendered parameter values of an active decision.
    pub fn render_parameters(&self, decision: DecisionId) -> Result<Vec<String>> {
        let d = self.decision(decision)?;
        let Some(token) = &d.token else {
            return Ok(Vec::new());
        };
        token
            .parameters
            .iter()
            .map(|p| {
                let values = self.parameters.values(*p)?;
                Ok(self.parameters.domain(*p)?.render(&values))
            })
            .collect()
    }

    /// Resource event of an active reservoir decision.
    ///
    /// An unbound amount is read pessimistically: the smallest production
    /// and the largest consumption.
    pub fn resource_event(&self, decision: DecisionId) -> Result<Option<ResourceEvent>> {
        let d = self.decision(decision)?;
        let Some(effect) = self.domain.value(d.value)?.effect else {
            return Ok(None);
        };
        let amount = match self.parameter_values(decision, 0)? {
            ParameterValues::Range(range) => match effect {
                ResourceEffect::Production => range.lb,
                ResourceEffect::Consumption => range.ub,
            },
            ParameterValues::Symbols(_) => {
                return Err(TimeforgeError::Domain(format!(
                    "decision {decision} has a symbolic amount"
                )))
            }
        };
        Ok(Some(ResourceEvent {
            decision,
            effect,
            amount,
        }))
    }

    // ---- consistency ----

    /// Checks temporal and parameter consistency.
    pub fn verify(&self) -> Result<()> {
        self.temporal.verify()?;
        self.parameters.check_consistency()
    }

    /// Reports contingent decisions squeezed by propagation.
    pub fn check_pseudo_controllability(&self) -> Result<()> {
        let squeezed_intervals = self.temporal.check_pseudo_controllability();
        if squeezed_intervals.is_empty() {
            return Ok(());
        }
        let squeezed: Vec<DecisionId> = self
            .decisions
            .values()
            .filter(|d| d.interval().is_some_and(|i| squeezed_intervals.contains(&i)))
            .map(|d| d.id)
            .collect();
        Err(TimeforgeError::PseudoControllability { squeezed })
    }

    // ---- problem and plan ----

    /// Creates the facts and goals of `problem` and propagates its
    /// constraints. Facts are activated; goals stay pending with
    /// mandatory expansion.
    ///
    /// # Errors
    ///
    /// `ProblemInitialization`; everything done so far is rolled back.
    pub fn setup(&mut self, problem: &Problem) -> Result<BTreeMap<String, DecisionId>> {
        let result = self.transaction(|pdb| {
            let mut keys = BTreeMap::new();
            let mut facts = Vec::with_capacity(problem.facts.len());
            let entries = problem
                .facts
                .iter()
                .map(|f| (f, true))
                .chain(problem.goals.iter().map(|g| (g, false)));
            for (entry, is_fact) in entries {
                let mut spec = DecisionSpec::new(entry.value)
                    .with_labels(entry.labels.iter().cloned())
                    .with_mandatory_expansion(!is_fact);
                spec.start = entry.start;
                spec.end = entry.end;
                spec.duration = entry.duration;
                let id = pdb.create(spec)?;
                if keys.insert(entry.key.clone(), id).is_some() {
                    return Err(TimeforgeError::Domain(format!(
                        "duplicate problem key {}",
                        entry.key
                    )));
                }
                if is_fact {
                    facts.push(id);
                }
            }
            for constraint in &problem.constraints {
                let lookup = |key: &String| {
                    keys.get(key).copied().ok_or_else(|| {
                        TimeforgeError::Domain(format!("unknown problem key {key}"))
                    })
                };
                let reference = lookup(&constraint.reference)?;
                let target = lookup(&constraint.target)?;
                pdb.create_relation(reference, target, constraint.kind.clone())?;
            }
            for fact in facts {
                pdb.activate(fact)?;
            }
            pdb.verify()?;
            Ok(keys)
        });
        match result {
            Ok(keys) => {
                info!(
                    event = "setup",
                    facts = problem.facts.len(),
                    goals = problem.goals.len(),
                    constraints = problem.constraints.len(),
                );
                Ok(keys)
            }
            Err(e) => Err(TimeforgeError::ProblemInitialization(e.to_string())),
        }
    }

    /// Snapshot of the active decisions and relations.
    pub fn plan(&self) -> Result<SolutionPlan> {
        let mut timelines = Vec::with_capacity(self.components.len());
        for (component, sets) in self.domain.components().iter().zip(&self.components) {
            let mut tokens = Vec::with_capacity(sets.active.len());
            for id in &sets.active {
                let d = self.decision(*id)?;
                let schedule = self.schedule(*id)?;
                tokens.push(PlanToken {
                    decision: *id,
                    value: self.domain.value(d.value)?.label.clone(),
                    start: schedule.start,
                    end: schedule.end,
                    duration: schedule.duration,
                    parameters: self.render_parameters(*id)?,
                });
            }
            tokens.sort_by_key(|t| (t.start.lb, t.start.ub, t.decision));
            timelines.push(PlanTimeline {
                component: component.name.clone(),
                kind: component.kind.to_string(),
                tokens,
            });
        }
        let relations = self
            .active_relations()
            .map(|r| PlanRelation {
                id: r.id,
                reference: r.reference,
                target: r.target,
                description: r.kind.to_string(),
            })
            .collect();
        let makespan = self.makespan();
        Ok(SolutionPlan {
            horizon: self.horizon(),
            timelines,
            relations,
            makespan: Bounds::new(makespan.min, makespan.max),
        })
    }

    fn move_decision(&mut self, id: DecisionId, from: DecisionState, to: DecisionState) -> Result<()> {
        let d = self
            .decisions
            .get_mut(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown decision {id}")))?;
        if d.state != from {
            return Err(TimeforgeError::Domain(format!(
                "decision {id} is {}, expected {from}",
                d.state
            )));
        }
        d.state = to;
        let sets = &mut self.components[d.component.0];
        sets.get_mut(from).remove(&id);
        sets.get_mut(to).insert(id);
        Ok(())
    }
}
