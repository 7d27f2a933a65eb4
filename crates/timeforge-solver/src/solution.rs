//! Flaw solutions and the effects they leave on the plan database.

use std::fmt;

use timeforge_core::{ComponentId, DecisionId, FlawId, RelationId, Result, RuleId, SolutionId, ValueId};
use timeforge_plan::{DecisionSpec, DecisionState, PlanDataBase, Relation, RelationKind};

use crate::flaw::FlawType;

/// The repair a solution performs.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionKind {
    /// Activates a goal, instantiating a synchronization rule if any.
    Expansion {
        goal: DecisionId,
        rule: Option<RuleId>,
    },
    /// Merges a goal into an active decision with the same value.
    Unification {
        goal: DecisionId,
        unifier: DecisionId,
    },
    /// Chains `left`, the intermediate `path` values and `right` with
    /// MEETS relations.
    GapCompletion {
        left: DecisionId,
        right: DecisionId,
        path: Vec<ValueId>,
    },
    /// `reference BEFORE target`.
    Ordering {
        reference: DecisionId,
        target: DecisionId,
    },
    /// Precedences among reservoir events.
    ResourceScheduling {
        precedences: Vec<(DecisionId, DecisionId)>,
        /// Temporal slack left by the precedences, in `[0, 1]`.
        preserved: f64,
    },
    /// Inserts a new production or consumption of `amount` before `head`,
    /// after every decision of `before`.
    ResourcePlanning {
        value: ValueId,
        amount: i64,
        before: Vec<DecisionId>,
        head: DecisionId,
    },
}

impl fmt::Display for SolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionKind::Expansion { goal, rule: Some(rule) } => {
                write!(f, "expand {goal} with {rule}")
            }
            SolutionKind::Expansion { goal, rule: None } => write!(f, "expand {goal}"),
            SolutionKind::Unification { goal, unifier } => write!(f, "unify {goal} with {unifier}"),
            SolutionKind::GapCompletion { left, right, path } => {
                write!(f, "complete {left} -> {right} through {} value(s)", path.len())
            }
            SolutionKind::Ordering { reference, target } => {
                write!(f, "order {reference} before {target}")
            }
            SolutionKind::ResourceScheduling { precedences, preserved } => write!(
                f,
                "schedule {} precedence(s), preserved {preserved:.3}",
                precedences.len()
            ),
            SolutionKind::ResourcePlanning { amount, head, .. } => {
                write!(f, "plan event of {amount} before {head}")
            }
        }
    }
}

/// One candidate repair of a flaw.
#[derive(Debug, Clone, PartialEq)]
pub struct FlawSolution {
    pub id: SolutionId,
    pub flaw: FlawId,
    pub flaw_type: FlawType,
    pub component: ComponentId,
    pub kind: SolutionKind,
    pub cost: f64,
    /// Makespan observed while probing the solution.
    pub makespan: Option<i64>,
}

impl fmt::Display for FlawSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] cost={}", self.id, self.kind, self.cost)
    }
}

/// A relation whose endpoints a solution moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewrite {
    pub relation: RelationId,
    pub before: (DecisionId, DecisionId),
    pub after: (DecisionId, DecisionId),
}

/// Ledger of everything a solution changed in the plan database.
///
/// Built while the solution is applied; [`retract`](Self::retract) undoes
/// it and [`restore`](Self::restore) replays it with the same handles.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    pub created_decisions: Vec<DecisionId>,
    pub activated_decisions: Vec<DecisionId>,
    pub created_relations: Vec<RelationId>,
    pub activated_relations: Vec<RelationId>,
    pub rewrites: Vec<Rewrite>,
    pub silenced_decisions: Vec<DecisionId>,
    snapshots: Vec<Relation>,
    applied: bool,
}

impl Effects {
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub(crate) fn mark_applied(&mut self) {
        self.applied = true;
    }

    pub(crate) fn create(&mut self, pdb: &mut PlanDataBase, spec: DecisionSpec) -> Result<DecisionId> {
        let id = pdb.create(spec)?;
        self.created_decisions.push(id);
        Ok(id)
    }

    pub(crate) fn relate(
        &mut self,
        pdb: &mut PlanDataBase,
        reference: DecisionId,
        target: DecisionId,
        kind: RelationKind,
    ) -> Result<RelationId> {
        let id = pdb.create_relation(reference, target, kind)?;
        self.created_relations.push(id);
        Ok(id)
    }

    pub(crate) fn activate(&mut self, pdb: &mut PlanDataBase, decision: DecisionId) -> Result<()> {
        pdb.activate(decision)?;
        self.activated_decisions.push(decision);
        Ok(())
    }

    pub(crate) fn activate_relation(
        &mut self,
        pdb: &mut PlanDataBase,
        relation: RelationId,
    ) -> Result<bool> {
        let activated = pdb.activate_relation(relation)?;
        if activated {
            self.activated_relations.push(relation);
        }
        Ok(activated)
    }

    pub(crate) fn reroute(
        &mut self,
        pdb: &mut PlanDataBase,
        relation: RelationId,
        from: DecisionId,
        to: DecisionId,
    ) -> Result<()> {
        let r = pdb.relation(relation)?;
        let before = (r.reference, r.target);
        pdb.rewrite_relation(relation, from, to)?;
        let r = pdb.relation(relation)?;
        self.rewrites.push(Rewrite {
            relation,
            before,
            after: (r.reference, r.target),
        });
        Ok(())
    }

    pub(crate) fn silence(&mut self, pdb: &mut PlanDataBase, decision: DecisionId) -> Result<()> {
        pdb.delete(decision)?;
        self.silenced_decisions.push(decision);
        Ok(())
    }

    /// Undoes an applied solution. Created decisions are left silent so
    /// that a later [`restore`](Self::restore) brings them back.
    ///
    /// Does nothing if the solution is not applied.
    pub fn retract(&mut self, pdb: &mut PlanDataBase) -> Result<()> {
        if !self.applied {
            return Ok(());
        }
        let snapshots = pdb.transaction(|pdb| {
            for d in self.activated_decisions.iter().rev() {
                pdb.deactivate(*d)?;
            }
            for r in self.activated_relations.iter().rev() {
                if pdb.contains_relation(*r) {
                    pdb.deactivate_relation(*r)?;
                }
            }
            for rewrite in self.rewrites.iter().rev() {
                let (reference, target) = rewrite.before;
                pdb.reroute_relation(rewrite.relation, reference, target)?;
            }
            for d in self.silenced_decisions.iter().rev() {
                pdb.restore(*d)?;
            }
            let mut snapshots = Vec::with_capacity(self.created_relations.len());
            for r in self.created_relations.iter().rev() {
                if pdb.contains_relation(*r) {
                    snapshots.push(pdb.delete_relation(*r)?);
                }
            }
            snapshots.reverse();
            for d in self.created_decisions.iter().rev() {
                pdb.delete(*d)?;
            }
            Ok(snapshots)
        })?;
        self.snapshots = snapshots;
        self.applied = false;
        Ok(())
    }

    /// Frees the decisions a retracted solution created. The ledger
    /// cannot be restored afterwards.
    pub(crate) fn release(self, pdb: &mut PlanDataBase) -> Result<()> {
        if self.applied {
            return Ok(());
        }
        for d in self.created_decisions {
            if pdb
                .decision(d)
                .is_ok_and(|decision| decision.state == DecisionState::Silent)
            {
                pdb.free(d)?;
            }
        }
        Ok(())
    }

    /// Replays a retracted solution with its original handles.
    ///
    /// Does nothing if the solution is applied.
    pub fn restore(&mut self, pdb: &mut PlanDataBase) -> Result<()> {
        if self.applied {
            return Ok(());
        }
        pdb.transaction(|pdb| {
            for d in &self.created_decisions {
                pdb.restore(*d)?;
            }
            for relation in &self.snapshots {
                pdb.reinsert_relation(relation.clone())?;
            }
            for rewrite in &self.rewrites {
                let (reference, target) = rewrite.after;
                pdb.reroute_relation(rewrite.relation, reference, target)?;
            }
            for d in &self.silenced_decisions {
                pdb.delete(*d)?;
            }
            for d in &self.activated_decisions {
                pdb.activate(*d)?;
            }
            for r in &self.activated_relations {
                pdb.activate_relation(*r)?;
            }
            Ok(())
        })?;
        self.snapshots.clear();
        self.applied = true;
        Ok(())
    }
}
