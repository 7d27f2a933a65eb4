//! Component values and transitions.

use std::fmt;

use timeforge_core::{Bounds, ComponentId, ValueId};
use timeforge_parameter::ParameterDomain;

/// Effect of a reservoir value on the resource level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEffect {
    Production,
    Consumption,
}

/// A named placeholder of a value, such as `?amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPlaceholder {
    pub name: String,
    pub domain: ParameterDomain,
}

impl ParameterPlaceholder {
    pub fn new(name: impl Into<String>, domain: ParameterDomain) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

/// A predicate template of a domain component.
///
/// Values are immutable once added to a [`PlanDomain`](crate::PlanDomain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentValue {
    pub id: ValueId,
    pub component: ComponentId,
    pub label: String,
    /// Nominal duration range.
    pub duration: Bounds,
    /// `false` if the duration is decided by the environment.
    pub controllable: bool,
    pub parameters: Vec<ParameterPlaceholder>,
    /// Set for the production and consumption values of reservoirs.
    pub effect: Option<ResourceEffect>,
}

impl ComponentValue {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if !self.parameters.is_empty() {
            let names: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
            write!(f, "({})", names.join(", "))?;
        }
        Ok(())
    }
}

/// Parameter relation carried by a transition or a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterRelationType {
    Equal,
    NotEqual,
}

/// Constraint between the `from_parameter`-th placeholder of the source
/// value and the `to_parameter`-th placeholder of the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionConstraint {
    pub kind: ParameterRelationType,
    pub from_parameter: usize,
    pub to_parameter: usize,
}

/// Allowed succession of two values on a state variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ValueId,
    pub to: ValueId,
    pub constraints: Vec<TransitionConstraint>,
}
