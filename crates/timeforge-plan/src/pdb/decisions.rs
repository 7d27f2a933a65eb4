//! Decision lifecycle primitives.

use std::sync::Arc;

use tracing::{debug, trace};

use timeforge_core::{DecisionId, RelationId, Result, TimeforgeError};

use super::PlanDataBase;
use crate::decision::{Decision, DecisionSpec, DecisionState, Token};
use crate::relation::Relation;

impl PlanDataBase {
    /// Creates a pending decision. Temporal and parameter stores are not
    /// touched.
    pub fn create(&mut self, spec: DecisionSpec) -> Result<DecisionId> {
        let domain = Arc::clone(&self.domain);
        let value = domain.value(spec.value)?;
        let component = domain.component(value.component)?;
        if spec.labels.len() > value.arity() {
            return Err(TimeforgeError::Domain(format!(
                "value {} takes {} parameter(s), got {} label(s)",
                value.label,
                value.arity(),
                spec.labels.len()
            )));
        }

        let id = self.ids.next_decision();
        let mut labels = spec.labels;
        for placeholder in &value.parameters[labels.len()..] {
            labels.push(format!("{}{}", placeholder.name, id.0));
        }
        let external = component.kind.is_external();
        let decision = Decision {
            id,
            component: value.component,
            value: value.id,
            labels,
            state: DecisionState::Pending,
            token: None,
            mandatory_expansion: spec.mandatory_expansion && !external,
            mandatory_unification: spec.mandatory_unification || external,
            causal_link: spec.causal_link,
            start: spec.start,
            end: spec.end,
            duration: spec.duration,
        };
        self.decisions.insert(id, decision);
        self.incidence.entry(id).or_default();
        self.components[value.component.0].pending.insert(id);
        self.record(move |pdb| pdb.discard_decision(id));
        trace!("Created decision {} {}", id, value.label);
        Ok(id)
    }

    fn discard_decision(&mut self, id: DecisionId) -> Result<()> {
        let d = self
            .decisions
            .remove(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown decision {id}")))?;
        self.components[d.component.0].remove(id);
        self.incidence.remove(&id);
        Ok(())
    }

    /// Activates a pending decision: creates its token and activates every
    /// relation whose other endpoint is already active.
    ///
    /// Returns the relations activated along the way.
    ///
    /// # Errors
    ///
    /// `DecisionPropagation` if the token or a relation cannot be
    /// propagated; the decision is left pending and nothing else changes.
    pub fn activate(&mut self, id: DecisionId) -> Result<Vec<RelationId>> {
        match self.decision(id)?.state {
            DecisionState::Active => return Ok(Vec::new()),
            DecisionState::Silent => {
                return Err(TimeforgeError::Domain(format!(
                    "cannot activate silent decision {id}"
                )))
            }
            DecisionState::Pending => {}
        }
        let result = self.transaction(|pdb| {
            pdb.install_token(id)?;
            let mut activated = Vec::new();
            for r in pdb.relations_of(id) {
                if !pdb.relation(r)?.is_active() && pdb.activate_relation(r)? {
                    activated.push(r);
                }
            }
            Ok(activated)
        });
        match result {
            Ok(activated) => {
                debug!("Activated decision {} ({} relations)", id, activated.len());
                Ok(activated)
            }
            Err(e) if e.is_propagation_failure() => Err(TimeforgeError::DecisionPropagation(
                format!("decision {id}: {e}"),
            )),
            Err(e) => Err(e),
        }
    }

    /// Mirror of [`activate`](Self::activate): deactivates the relations of
    /// an active decision and drops its token.
    pub fn deactivate(&mut self, id: DecisionId) -> Result<()> {
        match self.decision(id)?.state {
            DecisionState::Pending => return Ok(()),
            DecisionState::Silent => {
                return Err(TimeforgeError::Domain(format!(
                    "cannot deactivate silent decision {id}"
                )))
            }
            DecisionState::Active => {}
        }
        self.transaction(|pdb| {
            for r in pdb.relations_of(id) {
                pdb.deactivate_relation(r)?;
            }
            pdb.remove_token(id)
        })?;
        debug!("Deactivated decision {}", id);
        Ok(())
    }

    /// Deletes every relation touching a decision, frees its token and
    /// makes it silent.
    ///
    /// Returns snapshots of the deleted relations.
    pub fn delete(&mut self, id: DecisionId) -> Result<Vec<Relation>> {
        if self.decision(id)?.state == DecisionState::Silent {
            return Ok(Vec::new());
        }
        let removed = self.transaction(|pdb| {
            pdb.deactivate(id)?;
            let mut removed = Vec::new();
            for r in pdb.relations_of(id) {
                removed.push(pdb.delete_relation(r)?);
            }
            pdb.move_decision(id, DecisionState::Pending, DecisionState::Silent)?;
            pdb.record(move |pdb| {
                pdb.move_decision(id, DecisionState::Silent, DecisionState::Pending)
            });
            Ok(removed)
        })?;
        debug!("Deleted decision {} ({} relations)", id, removed.len());
        Ok(removed)
    }

    /// Brings a silent decision back to pending.
    pub fn restore(&mut self, id: DecisionId) -> Result<()> {
        self.move_decision(id, DecisionState::Silent, DecisionState::Pending)?;
        self.record(move |pdb| pdb.move_decision(id, DecisionState::Pending, DecisionState::Silent));
        trace!("Restored decision {}", id);
        Ok(())
    }

    /// Drops a silent decision from the plan database.
    pub fn free(&mut self, id: DecisionId) -> Result<()> {
        let snapshot = self.decision(id)?.clone();
        if snapshot.state != DecisionState::Silent {
            return Err(TimeforgeError::Domain(format!(
                "cannot free {} decision {id}",
                snapshot.state
            )));
        }
        self.discard_decision(id)?;
        self.record(move |pdb| {
            let component = snapshot.component;
            pdb.decisions.insert(snapshot.id, snapshot);
            pdb.incidence.entry(id).or_default();
            pdb.components[component.0].silent.insert(id);
            Ok(())
        });
        trace!("Freed decision {}", id);
        Ok(())
    }

    /// Creates the interval and parameters of a pending decision.
    pub(crate) fn install_token(&mut self, id: DecisionId) -> Result<()> {
        let domain = Arc::clone(&self.domain);
        let d = self.decision(id)?;
        let value = domain.value(d.value)?;
        let duration = match d.duration {
            Some(requested) => requested.intersect(value.duration).ok_or_else(|| {
                TimeforgeError::InconsistentDistanceConstraint(format!(
                    "requested duration {requested} outside nominal {}",
                    value.duration
                ))
            })?,
            None => value.duration,
        };
        let (start, end) = (d.start, d.end);

        let interval =
            self.temporal
                .create_interval_with(start, end, duration, value.controllable)?;
        let parameters = value
            .parameters
            .iter()
            .map(|p| self.parameters.create_parameter(&p.domain))
            .collect();

        self.move_decision(id, DecisionState::Pending, DecisionState::Active)?;
        if let Some(d) = self.decisions.get_mut(&id) {
            d.token = Some(Token {
                interval,
                parameters,
            });
        }
        self.record(move |pdb| pdb.remove_token(id));
        Ok(())
    }

    /// Deletes the interval and parameters of an active decision.
    pub(crate) fn remove_token(&mut self, id: DecisionId) -> Result<()> {
        let token = self
            .decisions
            .get_mut(&id)
            .and_then(|d| d.token.take())
            .ok_or_else(|| TimeforgeError::Domain(format!("decision {id} has no token")))?;
        self.temporal.delete_interval(token.interval)?;
        for p in &token.parameters {
            self.parameters.delete_parameter(*p)?;
        }
        self.move_decision(id, DecisionState::Active, DecisionState::Pending)?;
        self.record(move |pdb| pdb.install_token(id));
        Ok(())
    }
}
