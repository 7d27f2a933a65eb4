//! Mutual exclusion on timelines and unary resources.

use timeforge_core::{ComponentId, DecisionId, Result, TimeforgeError};
use timeforge_plan::{DecisionState, PlanDataBase, RelationKind};
use timeforge_temporal::TemporalConstraintType;

use super::{probe, unexpected, ResolverType};
use crate::flaw::{Flaw, FlawKind};
use crate::solution::{Effects, FlawSolution, SolutionKind};

/// Reports every pair of active decisions of one component that may
/// overlap, and orders them.
#[derive(Debug, Clone)]
pub struct SchedulingResolver {
    component: ComponentId,
    scheduling_cost: f64,
}

impl SchedulingResolver {
    pub fn new(component: ComponentId, scheduling_cost: f64) -> Self {
        Self {
            component,
            scheduling_cost,
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn find_flaws(&self, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        let active = pdb.decisions_in(self.component, DecisionState::Active);
        let mut flaws = Vec::new();
        for (i, first) in active.iter().enumerate() {
            for second in &active[i + 1..] {
                if pdb.can_overlap(*first, *second)? {
                    flaws.push(Flaw::new(
                        pdb.ids().next_flaw(),
                        self.component,
                        FlawKind::SchedulingConflict {
                            first: *first,
                            second: *second,
                        },
                    ));
                }
            }
        }
        Ok(flaws)
    }

    pub fn compute_solutions(&self, pdb: &mut PlanDataBase, flaw: &Flaw) -> Result<Vec<FlawSolution>> {
        let FlawKind::SchedulingConflict { first, second } = flaw.kind else {
            return Err(TimeforgeError::Domain(format!(
                "scheduling resolver cannot solve {flaw}"
            )));
        };
        let mut solutions = Vec::with_capacity(2);
        for (reference, target) in [(first, second), (second, first)] {
            let kind = SolutionKind::Ordering { reference, target };
            let Some(makespan) = probe(pdb, |pdb, effects| apply(pdb, &kind, effects))? else {
                continue;
            };
            solutions.push(FlawSolution {
                id: pdb.ids().next_solution(),
                flaw: flaw.id,
                flaw_type: flaw.flaw_type(),
                component: self.component,
                kind,
                cost: self.scheduling_cost,
                makespan: Some(makespan),
            });
        }
        Ok(solutions)
    }
}

/// Creates and activates `reference BEFORE target`.
pub(super) fn order(
    pdb: &mut PlanDataBase,
    reference: DecisionId,
    target: DecisionId,
    effects: &mut Effects,
) -> Result<()> {
    let bounds = TemporalConstraintType::Before
        .default_bounds(pdb.horizon())
        .into_vec();
    let relation = effects.relate(
        pdb,
        reference,
        target,
        RelationKind::temporal(TemporalConstraintType::Before, bounds),
    )?;
    effects.activate_relation(pdb, relation)?;
    Ok(())
}

pub(super) fn apply(pdb: &mut PlanDataBase, kind: &SolutionKind, effects: &mut Effects) -> Result<()> {
    let SolutionKind::Ordering { reference, target } = kind else {
        return Err(unexpected(ResolverType::Scheduling, kind));
    };
    order(pdb, *reference, *target, effects)
}
