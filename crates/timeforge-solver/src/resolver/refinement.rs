//! Goal refinement.
//!
//! Every pending decision is a goal. A goal is either unified with an
//! active decision carrying the same value, or expanded: activated, and
//! decomposed through a synchronization rule when its value triggers one.

use std::sync::Arc;

use timeforge_core::{Bounds, DecisionId, Result, RuleId, TimeforgeError};
use timeforge_plan::{
    Decision, DecisionSpec, DecisionState, ParameterRelationType, PlanDataBase, RelationKind,
    RuleConstraint, SynchronizationRule, TokenRef,
};

use super::{probe, unexpected, ResolverType};
use crate::flaw::{Flaw, FlawKind};
use crate::solution::{Effects, FlawSolution, SolutionKind};

/// Turns pending decisions into active ones.
#[derive(Debug, Clone)]
pub struct PlanRefinementResolver {
    expansion_cost: f64,
    unification_cost: f64,
}

impl PlanRefinementResolver {
    pub fn new(expansion_cost: f64, unification_cost: f64) -> Self {
        Self {
            expansion_cost,
            unification_cost,
        }
    }

    pub fn find_flaws(&self, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        pdb.agenda()
            .into_iter()
            .map(|decision| {
                let component = pdb.decision(decision)?.component;
                Ok(Flaw::new(
                    pdb.ids().next_flaw(),
                    component,
                    FlawKind::Goal { decision },
                ))
            })
            .collect()
    }

    pub fn compute_solutions(&self, pdb: &mut PlanDataBase, flaw: &Flaw) -> Result<Vec<FlawSolution>> {
        let FlawKind::Goal { decision: goal } = flaw.kind else {
            return Err(TimeforgeError::Domain(format!(
                "plan refinement resolver cannot solve {flaw}"
            )));
        };
        let decision = pdb.decision(goal)?.clone();
        let mut candidates = Vec::new();

        if !decision.mandatory_expansion {
            for unifier in pdb.decisions_in(decision.component, DecisionState::Active) {
                if pdb.decision(unifier)?.value == decision.value
                    && requested_bounds_hold(pdb, &decision, unifier)?
                {
                    candidates.push((
                        SolutionKind::Unification { goal, unifier },
                        self.unification_cost,
                    ));
                }
            }
        }
        if !decision.mandatory_unification {
            let rules: Vec<RuleId> = pdb.domain().rules_for(decision.value).map(|r| r.id).collect();
            if rules.is_empty() {
                candidates.push((SolutionKind::Expansion { goal, rule: None }, self.expansion_cost));
            }
            for rule in rules {
                candidates.push((
                    SolutionKind::Expansion {
                        goal,
                        rule: Some(rule),
                    },
                    self.expansion_cost,
                ));
            }
        }

        let mut solutions = Vec::with_capacity(candidates.len());
        for (kind, cost) in candidates {
            let Some(makespan) = probe(pdb, |pdb, effects| apply(pdb, &kind, effects))? else {
                continue;
            };
            solutions.push(FlawSolution {
                id: pdb.ids().next_solution(),
                flaw: flaw.id,
                flaw_type: flaw.flaw_type(),
                component: flaw.component,
                kind,
                cost,
                makespan: Some(makespan),
            });
        }
        Ok(solutions)
    }
}

/// True if the unifier's schedule can meet every bound the goal requests.
fn requested_bounds_hold(pdb: &PlanDataBase, goal: &Decision, unifier: DecisionId) -> Result<bool> {
    let schedule = pdb.schedule(unifier)?;
    let fits = |requested: Option<Bounds>, actual: Bounds| {
        requested.map_or(true, |r| r.intersect(actual).is_some())
    };
    Ok(fits(goal.start, schedule.start)
        && fits(goal.end, schedule.end)
        && fits(goal.duration, schedule.duration))
}

fn unify(
    pdb: &mut PlanDataBase,
    goal: DecisionId,
    unifier: DecisionId,
    effects: &mut Effects,
) -> Result<()> {
    let window = pdb.decision(goal)?.window();
    let relations = pdb.relations_of(goal);
    for r in &relations {
        effects.reroute(pdb, *r, goal, unifier)?;
    }
    effects.silence(pdb, goal)?;
    for r in relations {
        effects.activate_relation(pdb, r)?;
    }
    // The unifier inherits the bounds the goal requested.
    if !window.is_unbounded() {
        let r = effects.relate(pdb, unifier, unifier, RelationKind::window(window))?;
        effects.activate_relation(pdb, r)?;
    }
    Ok(())
}

fn expand(
    pdb: &mut PlanDataBase,
    goal: DecisionId,
    rule: &SynchronizationRule,
    effects: &mut Effects,
) -> Result<()> {
    let mut tokens = Vec::with_capacity(rule.variables.len());
    for variable in &rule.variables {
        let spec = DecisionSpec::new(variable.value)
            .with_mandatory_expansion(variable.mandatory_expansion)
            .with_mandatory_unification(variable.mandatory_unification)
            .with_causal_link(goal);
        tokens.push(effects.create(pdb, spec)?);
    }
    let token = |r: TokenRef| -> Result<DecisionId> {
        match r {
            TokenRef::Trigger => Ok(goal),
            TokenRef::Variable(i) => tokens.get(i).copied().ok_or_else(|| {
                TimeforgeError::Domain(format!("rule {} has no variable {i}", rule.id))
            }),
        }
    };
    let label = |name: &str| -> Result<(DecisionId, usize)> {
        let (r, index) = rule.resolve_label(name).ok_or_else(|| {
            TimeforgeError::Domain(format!("rule {} has no label {name}", rule.id))
        })?;
        Ok((token(r)?, index))
    };

    for constraint in &rule.constraints {
        match constraint {
            RuleConstraint::Temporal {
                kind,
                reference,
                target,
                bounds,
            } => {
                effects.relate(
                    pdb,
                    token(*reference)?,
                    token(*target)?,
                    RelationKind::temporal(*kind, bounds.clone()),
                )?;
            }
            RuleConstraint::Parameter {
                kind,
                reference,
                target,
            } => {
                let (r, ri) = label(reference)?;
                let (t, ti) = label(target)?;
                let relation = match kind {
                    ParameterRelationType::Equal => RelationKind::equal(ri, ti),
                    ParameterRelationType::NotEqual => RelationKind::not_equal(ri, ti),
                };
                effects.relate(pdb, r, t, relation)?;
            }
            RuleConstraint::Bind { label: name, value } => {
                let (d, index) = label(name)?;
                effects.relate(pdb, d, d, RelationKind::bind(index, value.clone()))?;
            }
        }
    }
    Ok(())
}

pub(super) fn apply(pdb: &mut PlanDataBase, kind: &SolutionKind, effects: &mut Effects) -> Result<()> {
    match kind {
        SolutionKind::Unification { goal, unifier } => unify(pdb, *goal, *unifier, effects),
        SolutionKind::Expansion { goal, rule } => {
            if let Some(id) = rule {
                let domain = Arc::clone(pdb.domain());
                let rule = domain.rules().iter().find(|r| r.id == *id).ok_or_else(|| {
                    TimeforgeError::Domain(format!("unknown rule {id}"))
                })?;
                expand(pdb, *goal, rule, effects)?;
            }
            effects.activate(pdb, *goal)
        }
        _ => Err(unexpected(ResolverType::PlanRefinement, kind)),
    }
}
