//! Relation lifecycle primitives.

use tracing::{debug, trace};

use timeforge_core::{DecisionId, RelationId, Result, TimeforgeError};
use timeforge_parameter::{ParameterConstraint, ParameterId};

use super::PlanDataBase;
use crate::relation::{
    ParameterRelation, PropagatedConstraint, Relation, RelationKind, RelationState,
};
use crate::value::ParameterRelationType;

impl PlanDataBase {
    /// Creates a pending relation between two decisions.
    pub fn create_relation(
        &mut self,
        reference: DecisionId,
        target: DecisionId,
        kind: RelationKind,
    ) -> Result<RelationId> {
        self.check_relation(reference, target, &kind)?;
        let id = self.ids.next_relation();
        self.insert_relation(Relation {
            id,
            reference,
            target,
            kind,
            state: RelationState::Pending,
            constraint: None,
        })
    }

    /// Reinserts a previously deleted relation with its original handle.
    /// The relation comes back pending.
    pub fn reinsert_relation(&mut self, mut relation: Relation) -> Result<RelationId> {
        if self.relations.contains_key(&relation.id) {
            return Err(TimeforgeError::Domain(format!(
                "relation {} already exists",
                relation.id
            )));
        }
        self.check_relation(relation.reference, relation.target, &relation.kind)?;
        relation.state = RelationState::Pending;
        relation.constraint = None;
        self.insert_relation(relation)
    }

    fn insert_relation(&mut self, relation: Relation) -> Result<RelationId> {
        let id = relation.id;
        self.incidence
            .entry(relation.reference)
            .or_default()
            .insert(id);
        self.incidence.entry(relation.target).or_default().insert(id);
        trace!("Created relation {}", relation);
        self.relations.insert(id, relation);
        self.record(move |pdb| pdb.discard_relation(id));
        Ok(id)
    }

    fn discard_relation(&mut self, id: RelationId) -> Result<()> {
        let relation = self
            .relations
            .remove(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown relation {id}")))?;
        for endpoint in [relation.reference, relation.target] {
            if let Some(set) = self.incidence.get_mut(&endpoint) {
                set.remove(&id);
            }
        }
        Ok(())
    }

    fn check_relation(
        &self,
        reference: DecisionId,
        target: DecisionId,
        kind: &RelationKind,
    ) -> Result<()> {
        let r = self.decision(reference)?;
        let t = self.decision(target)?;
        match kind {
            RelationKind::Temporal { kind, bounds } => {
                if bounds.len() != kind.arity() {
                    return Err(TimeforgeError::Domain(format!(
                        "{kind} expects {} bound pair(s), got {}",
                        kind.arity(),
                        bounds.len()
                    )));
                }
            }
            RelationKind::Window(window) => {
                if reference != target || window.is_unbounded() {
                    return Err(TimeforgeError::Domain(format!(
                        "window relation {reference} -> {target} must bound a single decision"
                    )));
                }
            }
            RelationKind::Parameter(ParameterRelation::Compare {
                reference_parameter,
                target_parameter,
                ..
            }) => {
                let r_arity = self.domain.value(r.value)?.arity();
                let t_arity = self.domain.value(t.value)?.arity();
                if *reference_parameter >= r_arity || *target_parameter >= t_arity {
                    return Err(TimeforgeError::Domain(format!(
                        "parameter relation {reference} -> {target} refers to a missing placeholder"
                    )));
                }
            }
            RelationKind::Parameter(ParameterRelation::Bind { parameter, .. }) => {
                if *parameter >= self.domain.value(r.value)?.arity() {
                    return Err(TimeforgeError::Domain(format!(
                        "binding on {reference} refers to a missing placeholder"
                    )));
                }
            }
        }
        Ok(())
    }

    fn parameter_of(&self, decision: DecisionId, index: usize) -> Result<ParameterId> {
        self.decision(decision)?
            .token
            .as_ref()
            .and_then(|t| t.parameters.get(index).copied())
            .ok_or_else(|| {
                TimeforgeError::Domain(format!("decision {decision} has no parameter {index}"))
            })
    }

    /// Propagates the constraint of a pending relation.
    ///
    /// Returns `false` without changing anything if an endpoint is not
    /// active.
    ///
    /// # Errors
    ///
    /// `RelationPropagation` if the constraint is inconsistent with the
    /// plan; the relation stays pending.
    pub fn activate_relation(&mut self, id: RelationId) -> Result<bool> {
        let relation = self.relation(id)?;
        if relation.is_active() {
            return Ok(true);
        }
        let reference = self.decision(relation.reference)?;
        let target = self.decision(relation.target)?;
        if !(reference.is_active() && target.is_active()) {
            return Ok(false);
        }
        let (r, t) = (reference.id, target.id);

        let propagated = match relation.kind.clone() {
            RelationKind::Temporal { kind, bounds } => {
                let (ri, ti) = (self.interval_of(r)?, self.interval_of(t)?);
                self.temporal
                    .propagate(kind, ri, ti, &bounds)
                    .map(PropagatedConstraint::Temporal)
            }
            RelationKind::Window(window) => {
                let interval = self.interval_of(r)?;
                self.temporal
                    .fix_window(interval, window.start, window.end, window.duration)
                    .map(PropagatedConstraint::Temporal)
            }
            RelationKind::Parameter(ParameterRelation::Compare {
                kind,
                reference_parameter,
                target_parameter,
            }) => {
                let a = self.parameter_of(r, reference_parameter)?;
                let b = self.parameter_of(t, target_parameter)?;
                let constraint = match kind {
                    ParameterRelationType::Equal => ParameterConstraint::Equal(a, b),
                    ParameterRelationType::NotEqual => ParameterConstraint::NotEqual(a, b),
                };
                self.parameters
                    .propagate(constraint)
                    .map(PropagatedConstraint::Parameter)
            }
            RelationKind::Parameter(ParameterRelation::Bind { parameter, value }) => {
                let p = self.parameter_of(r, parameter)?;
                self.parameters
                    .propagate(ParameterConstraint::Bind {
                        parameter: p,
                        value,
                    })
                    .map(PropagatedConstraint::Parameter)
            }
        };
        let constraint = match propagated {
            Ok(c) => c,
            Err(e) if e.is_propagation_failure() => {
                return Err(TimeforgeError::RelationPropagation(format!(
                    "relation {id}: {e}"
                )))
            }
            Err(e) => return Err(e),
        };

        if let Some(relation) = self.relations.get_mut(&id) {
            relation.state = RelationState::Active;
            relation.constraint = Some(constraint);
        }
        self.record(move |pdb| pdb.deactivate_relation(id));
        trace!("Activated relation {}", id);
        Ok(true)
    }

    /// Retracts the constraint of an active relation; the relation itself
    /// is kept.
    pub fn deactivate_relation(&mut self, id: RelationId) -> Result<()> {
        let relation = self
            .relations
            .get_mut(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown relation {id}")))?;
        let Some(constraint) = relation.constraint.take() else {
            return Ok(());
        };
        relation.state = RelationState::Pending;
        match constraint {
            PropagatedConstraint::Temporal(handle) => self.temporal.retract(handle)?,
            PropagatedConstraint::Parameter(handle) => self.parameters.retract(handle)?,
        }
        self.record(move |pdb| pdb.activate_relation(id).map(|_| ()));
        trace!("Deactivated relation {}", id);
        Ok(())
    }

    /// Destroys a relation, retracting its constraint first.
    ///
    /// Returns a pending snapshot for [`reinsert_relation`](Self::reinsert_relation).
    pub fn delete_relation(&mut self, id: RelationId) -> Result<Relation> {
        self.transaction(|pdb| {
            pdb.deactivate_relation(id)?;
            let snapshot = pdb.relation(id)?.clone();
            pdb.discard_relation(id)?;
            let restored = snapshot.clone();
            pdb.record(move |pdb| pdb.insert_relation(restored).map(|_| ()));
            debug!("Deleted relation {}", snapshot);
            Ok(snapshot)
        })
    }

    /// Replaces the endpoint `from` of a pending relation by `to`.
    pub fn rewrite_relation(
        &mut self,
        id: RelationId,
        from: DecisionId,
        to: DecisionId,
    ) -> Result<()> {
        let relation = self.relation(id)?;
        if !relation.touches(from) {
            return Err(TimeforgeError::Domain(format!(
                "relation {id} does not touch {from}"
            )));
        }
        let (mut reference, mut target) = (relation.reference, relation.target);
        if reference == from {
            reference = to;
        }
        if target == from {
            target = to;
        }
        self.reroute_relation(id, reference, target)?;
        trace!("Rewrote relation {} endpoint {} -> {}", id, from, to);
        Ok(())
    }

    /// Sets both endpoints of a pending relation.
    pub fn reroute_relation(
        &mut self,
        id: RelationId,
        reference: DecisionId,
        target: DecisionId,
    ) -> Result<()> {
        let relation = self.relation(id)?;
        if relation.is_active() {
            return Err(TimeforgeError::Domain(format!(
                "cannot rewrite active relation {id}"
            )));
        }
        let kind = relation.kind.clone();
        self.check_relation(reference, target, &kind)?;
        self.set_endpoints(id, reference, target)
    }

    fn set_endpoints(
        &mut self,
        id: RelationId,
        reference: DecisionId,
        target: DecisionId,
    ) -> Result<()> {
        let relation = self
            .relations
            .get_mut(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown relation {id}")))?;
        let previous = (relation.reference, relation.target);
        relation.reference = reference;
        relation.target = target;
        for endpoint in [previous.0, previous.1] {
            if let Some(set) = self.incidence.get_mut(&endpoint) {
                set.remove(&id);
            }
        }
        for endpoint in [reference, target] {
            self.incidence.entry(endpoint).or_default().insert(id);
        }
        self.record(move |pdb| pdb.set_endpoints(id, previous.0, previous.1));
        Ok(())
    }
}
