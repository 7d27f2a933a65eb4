//! Parameter store boundary and the reference domain store.
//!
//! The plan database only sees the [`ParameterStore`] trait: it creates a
//! parameter per decision placeholder, propagates bind/equal/not-equal
//! constraints and reads back the surviving values. [`DomainParameterStore`]
//! recomputes every domain from the initial values and the live constraints,
//! so retraction is exact without any undo bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use timeforge_core::{Result, TimeforgeError};

use crate::domain::{ParameterDomain, ParameterValues};

/// Handle of a parameter variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParameterId(pub usize);

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Handle of a propagated parameter constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParameterConstraintId(pub usize);

/// Constraint over parameter variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterConstraint {
    /// Restricts a parameter to a single literal of its domain.
    Bind { parameter: ParameterId, value: String },
    /// Both parameters take the same value.
    Equal(ParameterId, ParameterId),
    /// The parameters take different values.
    NotEqual(ParameterId, ParameterId),
}

impl ParameterConstraint {
    fn touches(&self, id: ParameterId) -> bool {
        match self {
            ParameterConstraint::Bind { parameter, .. } => *parameter == id,
            ParameterConstraint::Equal(a, b) | ParameterConstraint::NotEqual(a, b) => {
                *a == id || *b == id
            }
        }
    }
}

impl fmt::Display for ParameterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterConstraint::Bind { parameter, value } => write!(f, "{parameter} = {value}"),
            ParameterConstraint::Equal(a, b) => write!(f, "{a} == {b}"),
            ParameterConstraint::NotEqual(a, b) => write!(f, "{a} != {b}"),
        }
    }
}

/// Boundary between the plan database and a parameter constraint solver.
pub trait ParameterStore: Send + Sync + fmt::Debug {
    /// Creates a parameter ranging over `domain`.
    fn create_parameter(&mut self, domain: &ParameterDomain) -> ParameterId;

    /// Deletes a parameter and every constraint touching it.
    fn delete_parameter(&mut self, id: ParameterId) -> Result<()>;

    /// Propagates a constraint.
    ///
    /// # Errors
    ///
    /// `ParameterPropagation` if a domain would become empty; the store is
    /// left unchanged.
    fn propagate(&mut self, constraint: ParameterConstraint) -> Result<ParameterConstraintId>;

    /// Retracts a propagated constraint.
    fn retract(&mut self, id: ParameterConstraintId) -> Result<()>;

    /// Checks that every parameter still has at least one value.
    fn check_consistency(&self) -> Result<()>;

    /// Current values of a parameter.
    fn values(&self, id: ParameterId) -> Result<ParameterValues>;

    /// Domain a parameter was created with.
    fn domain(&self, id: ParameterId) -> Result<&ParameterDomain>;

    /// Number of live parameters.
    fn parameter_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct ParameterSlot {
    domain: ParameterDomain,
    values: ParameterValues,
}

/// Reference store over enumeration and numeric domains.
///
/// # Example
///
/// ```
/// use timeforge_parameter::{
///     DomainParameterStore, ParameterConstraint, ParameterDomain, ParameterStore,
/// };
///
/// let mut store = DomainParameterStore::new();
/// let rooms = ParameterDomain::enumeration("room", ["a", "b"]);
/// let x = store.create_parameter(&rooms);
/// let y = store.create_parameter(&rooms);
///
/// store.propagate(ParameterConstraint::Bind { parameter: x, value: "a".into() }).unwrap();
/// store.propagate(ParameterConstraint::NotEqual(x, y)).unwrap();
/// assert_eq!(rooms.render(&store.values(y).unwrap()), "b");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DomainParameterStore {
    parameters: BTreeMap<ParameterId, ParameterSlot>,
    constraints: BTreeMap<ParameterConstraintId, ParameterConstraint>,
    next_parameter: usize,
    next_constraint: usize,
}

impl DomainParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn slot(&self, id: ParameterId) -> Result<&ParameterSlot> {
        self.parameters
            .get(&id)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown parameter {id}")))
    }

    fn check_compatible(&self, a: ParameterId, b: ParameterId) -> Result<()> {
        let da = &self.slot(a)?.domain;
        let db = &self.slot(b)?.domain;
        let same_kind = matches!(
            (da, db),
            (ParameterDomain::Enumeration { .. }, ParameterDomain::Enumeration { .. })
                | (ParameterDomain::Numeric { .. }, ParameterDomain::Numeric { .. })
        );
        if !same_kind || (matches!(da, ParameterDomain::Enumeration { .. }) && da != db) {
            return Err(TimeforgeError::Domain(format!(
                "parameters {a} ({}) and {b} ({}) have incompatible domains",
                da.name(),
                db.name()
            )));
        }
        Ok(())
    }

    /// Recomputes every domain from its initial values under `constraints`.
    fn solve<'a, I>(&self, constraints: I) -> Result<BTreeMap<ParameterId, ParameterValues>>
    where
        I: Iterator<Item = &'a ParameterConstraint> + Clone,
    {
        let mut values: BTreeMap<ParameterId, ParameterValues> = self
            .parameters
            .iter()
            .map(|(id, slot)| (*id, slot.domain.initial_values()))
            .collect();

        for constraint in constraints.clone() {
            if let ParameterConstraint::Bind { parameter, value } = constraint {
                let bound = self.slot(*parameter)?.domain.parse(value)?;
                narrow(&mut values, *parameter, &bound)?;
            }
        }

        // fixpoint over the binary constraints
        let mut changed = true;
        while changed {
            changed = false;
            for constraint in constraints.clone() {
                match constraint {
                    ParameterConstraint::Bind { .. } => {}
                    ParameterConstraint::Equal(a, b) => {
                        let va = get(&values, *a)?;
                        let vb = get(&values, *b)?;
                        if let Some(both) = va.intersect(&vb) {
                            changed |= narrow(&mut values, *a, &both)?;
                            changed |= narrow(&mut values, *b, &both)?;
                        }
                    }
                    ParameterConstraint::NotEqual(a, b) => {
                        let va = get(&values, *a)?;
                        let vb = get(&values, *b)?;
                        if va.is_singleton() && vb.is_singleton() && va == vb {
                            return Err(TimeforgeError::ParameterPropagation(format!(
                                "{a} and {b} are both bound to {va}"
                            )));
                        }
                        changed |= replace(&mut values, *a, va.exclude(&vb))?;
                        changed |= replace(&mut values, *b, vb.exclude(&va))?;
                    }
                }
            }
        }
        Ok(values)
    }

    fn apply(&mut self, values: BTreeMap<ParameterId, ParameterValues>) {
        for (id, value) in values {
            if let Some(slot) = self.parameters.get_mut(&id) {
                slot.values = value;
            }
        }
    }
}

fn get(values: &BTreeMap<ParameterId, ParameterValues>, id: ParameterId) -> Result<ParameterValues> {
    values
        .get(&id)
        .cloned()
        .ok_or_else(|| TimeforgeError::Domain(format!("unknown parameter {id}")))
}

fn narrow(
    values: &mut BTreeMap<ParameterId, ParameterValues>,
    id: ParameterId,
    with: &ParameterValues,
) -> Result<bool> {
    let current = get(values, id)?;
    let narrowed = current.intersect(with).ok_or_else(|| {
        TimeforgeError::Domain(format!("parameter {id} compared across domain kinds"))
    })?;
    replace(values, id, narrowed)
}

fn replace(
    values: &mut BTreeMap<ParameterId, ParameterValues>,
    id: ParameterId,
    next: ParameterValues,
) -> Result<bool> {
    if next.is_empty() {
        return Err(TimeforgeError::ParameterPropagation(format!(
            "domain of {id} became empty"
        )));
    }
    let changed = values.get(&id) != Some(&next);
    values.insert(id, next);
    Ok(changed)
}

impl ParameterStore for DomainParameterStore {
    fn create_parameter(&mut self, domain: &ParameterDomain) -> ParameterId {
        let id = ParameterId(self.next_parameter);
        self.next_parameter += 1;
        self.parameters.insert(
            id,
            ParameterSlot {
                domain: domain.clone(),
                values: domain.initial_values(),
            },
        );
        trace!("Created parameter {} over {}", id, domain.name());
        id
    }

    fn delete_parameter(&mut self, id: ParameterId) -> Result<()> {
        if self.parameters.remove(&id).is_none() {
            return Err(TimeforgeError::Domain(format!("unknown parameter {id}")));
        }
        self.constraints.retain(|_, c| !c.touches(id));
        let values = self.solve(self.constraints.values())?;
        self.apply(values);
        Ok(())
    }

    fn propagate(&mut self, constraint: ParameterConstraint) -> Result<ParameterConstraintId> {
        match &constraint {
            ParameterConstraint::Bind { parameter, .. } => {
                self.slot(*parameter)?;
            }
            ParameterConstraint::Equal(a, b) | ParameterConstraint::NotEqual(a, b) => {
                self.check_compatible(*a, *b)?;
            }
        }
        let values = self.solve(
            self.constraints
                .values()
                .chain(std::iter::once(&constraint)),
        )?;
        self.apply(values);

        let id = ParameterConstraintId(self.next_constraint);
        self.next_constraint += 1;
        debug!("Propagated parameter constraint {}", constraint);
        self.constraints.insert(id, constraint);
        Ok(id)
    }

    fn retract(&mut self, id: ParameterConstraintId) -> Result<()> {
        if self.constraints.remove(&id).is_none() {
            return Err(TimeforgeError::Domain(format!(
                "unknown parameter constraint {}",
                id.0
            )));
        }
        let values = self.solve(self.constraints.values())?;
        self.apply(values);
        Ok(())
    }

    fn check_consistency(&self) -> Result<()> {
        match self.parameters.iter().find(|(_, slot)| slot.values.is_empty()) {
            Some((id, _)) => Err(TimeforgeError::ParameterPropagation(format!(
                "parameter {id} has no values"
            ))),
            None => Ok(()),
        }
    }

    fn values(&self, id: ParameterId) -> Result<ParameterValues> {
        Ok(self.slot(id)?.values.clone())
    }

    fn domain(&self, id: ParameterId) -> Result<&ParameterDomain> {
        Ok(&self.slot(id)?.domain)
    }

    fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

#[cfg(test)]
mod tests;
