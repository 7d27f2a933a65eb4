//! Timeline completeness.
//!
//! Adjacent tokens of a state variable must be chained by MEETS relations
//! along allowed value transitions. Tokens are ordered by start bounds;
//! the distance between consecutive tokens classifies the pair:
//!
//! - `[0, 0]` with no MEETS relation: semantic connection
//! - `dmin >= 0, dmax > 0`: gap to fill with a transition path
//! - otherwise the timeline is not scheduled yet and no gap is reported

use std::sync::Arc;

use timeforge_core::{Bounds, ComponentId, DecisionId, Result, TimeforgeError, ValueId};
use timeforge_plan::{DecisionSpec, DecisionState, ParameterRelationType, PlanDataBase, RelationKind};
use timeforge_temporal::TemporalConstraintType;

use super::{probe, unexpected, ResolverType};
use crate::flaw::{Flaw, FlawKind};
use crate::solution::{Effects, FlawSolution, SolutionKind};

/// Completes the timeline of one state variable.
#[derive(Debug, Clone)]
pub struct GapResolver {
    component: ComponentId,
    completion_cost: f64,
}

impl GapResolver {
    pub fn new(component: ComponentId, completion_cost: f64) -> Self {
        Self {
            component,
            completion_cost,
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn find_flaws(&self, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        let mut tokens = Vec::new();
        for d in pdb.decisions_in(self.component, DecisionState::Active) {
            tokens.push((pdb.schedule(d)?.start, d));
        }
        tokens.sort_by_key(|(start, d)| (start.lb, start.ub, *d));

        let mut flaws = Vec::new();
        for pair in tokens.windows(2) {
            let (left, right) = (pair[0].1, pair[1].1);
            let adjacency = match classify(pdb, left, right)? {
                Adjacency::Unordered => classify(pdb, right, left)?,
                adjacency => adjacency,
            };
            let kind = match adjacency {
                Adjacency::Flaw(kind) => kind,
                Adjacency::Connected => continue,
                Adjacency::Unordered => return Ok(Vec::new()),
            };
            let from = match &kind {
                FlawKind::Gap { left, .. } | FlawKind::SemanticConnection { left, .. } => *left,
                _ => continue,
            };
            if has_pending_meets(pdb, from)? {
                continue;
            }
            flaws.push(Flaw::new(pdb.ids().next_flaw(), self.component, kind));
        }
        Ok(flaws)
    }

    pub fn compute_solutions(&self, pdb: &mut PlanDataBase, flaw: &Flaw) -> Result<Vec<FlawSolution>> {
        let (left, right, distance) = match flaw.kind {
            FlawKind::Gap {
                left,
                right,
                distance,
            } => (left, right, distance),
            FlawKind::SemanticConnection { left, right } => (left, right, Bounds::point(0)),
            _ => {
                return Err(TimeforgeError::Domain(format!(
                    "gap resolver cannot solve {flaw}"
                )))
            }
        };
        let domain = Arc::clone(pdb.domain());
        let component = domain.component(self.component)?;
        let from = pdb.decision(left)?.value;
        let to = pdb.decision(right)?.value;

        let mut candidates: Vec<(Bounds, Vec<ValueId>)> = Vec::new();
        if matches!(flaw.kind, FlawKind::SemanticConnection { .. }) {
            candidates.push((Bounds::point(0), Vec::new()));
        } else {
            for path in component.paths(from, to) {
                let inner = path[1..path.len() - 1].to_vec();
                let mut total = Bounds::point(0);
                for value in &inner {
                    total = total.add(domain.value(*value)?.duration);
                }
                if total.lb <= distance.ub && total.ub >= distance.lb {
                    candidates.push((total, inner));
                }
            }
            candidates.sort_by_key(|(total, path)| (total.lb, path.len()));
        }

        let mut solutions = Vec::with_capacity(candidates.len());
        for (_, path) in candidates {
            let kind = SolutionKind::GapCompletion { left, right, path };
            let Some(makespan) = probe(pdb, |pdb, effects| apply(pdb, &kind, effects))? else {
                continue;
            };
            let length = match &kind {
                SolutionKind::GapCompletion { path, .. } => path.len().max(1),
                _ => 1,
            };
            solutions.push(FlawSolution {
                id: pdb.ids().next_solution(),
                flaw: flaw.id,
                flaw_type: flaw.flaw_type(),
                component: self.component,
                kind,
                cost: self.completion_cost * length as f64,
                makespan: Some(makespan),
            });
        }
        Ok(solutions)
    }
}

/// How two tokens of a timeline follow each other.
enum Adjacency {
    Flaw(FlawKind),
    /// Already chained by an active MEETS relation.
    Connected,
    /// `right` may start before `left` ends.
    Unordered,
}

fn classify(pdb: &PlanDataBase, left: DecisionId, right: DecisionId) -> Result<Adjacency> {
    let distance = pdb.distance(left, right)?;
    if distance.lb == 0 && distance.ub == 0 {
        if connected(pdb, left, right)? {
            return Ok(Adjacency::Connected);
        }
        return Ok(Adjacency::Flaw(FlawKind::SemanticConnection { left, right }));
    }
    if distance.lb >= 0 && distance.ub > 0 {
        if connected(pdb, left, right)? {
            return Ok(Adjacency::Connected);
        }
        return Ok(Adjacency::Flaw(FlawKind::Gap {
            left,
            right,
            distance,
        }));
    }
    Ok(Adjacency::Unordered)
}

/// True if an active MEETS relation already chains `left` to `right`.
fn connected(pdb: &PlanDataBase, left: DecisionId, right: DecisionId) -> Result<bool> {
    for id in pdb.relations_of(left) {
        let r = pdb.relation(id)?;
        if !r.is_active() {
            continue;
        }
        let chained = match r.kind.temporal_kind() {
            Some(TemporalConstraintType::Meets) => r.reference == left && r.target == right,
            Some(TemporalConstraintType::MetBy) => r.reference == right && r.target == left,
            _ => false,
        };
        if chained {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if `left` already heads a pending MEETS chain, i.e. a completion
/// is under way.
fn has_pending_meets(pdb: &PlanDataBase, left: DecisionId) -> Result<bool> {
    for id in pdb.relations_of(left) {
        let r = pdb.relation(id)?;
        if !r.is_active()
            && r.reference == left
            && r.kind.temporal_kind() == Some(TemporalConstraintType::Meets)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(super) fn apply(pdb: &mut PlanDataBase, kind: &SolutionKind, effects: &mut Effects) -> Result<()> {
    let SolutionKind::GapCompletion { left, right, path } = kind else {
        return Err(unexpected(ResolverType::Gap, kind));
    };
    let mut chain = Vec::with_capacity(path.len() + 2);
    chain.push(*left);
    for value in path {
        let spec = DecisionSpec::new(*value).with_mandatory_expansion(true);
        chain.push(effects.create(pdb, spec)?);
    }
    chain.push(*right);

    let domain = Arc::clone(pdb.domain());
    let mut relations = Vec::new();
    for link in chain.windows(2) {
        let (from, to) = (link[0], link[1]);
        relations.push(effects.relate(
            pdb,
            from,
            to,
            RelationKind::temporal(TemporalConstraintType::Meets, Vec::new()),
        )?);
        let (fv, tv) = (pdb.decision(from)?.value, pdb.decision(to)?.value);
        let component = domain.component(domain.value(fv)?.component)?;
        if let Some(transition) = component.transition(fv, tv) {
            for c in &transition.constraints {
                let kind = match c.kind {
                    ParameterRelationType::Equal => {
                        RelationKind::equal(c.from_parameter, c.to_parameter)
                    }
                    ParameterRelationType::NotEqual => {
                        RelationKind::not_equal(c.from_parameter, c.to_parameter)
                    }
                };
                relations.push(effects.relate(pdb, from, to, kind)?);
            }
        }
    }
    if path.is_empty() {
        for r in relations {
            effects.activate_relation(pdb, r)?;
        }
    }
    Ok(())
}
