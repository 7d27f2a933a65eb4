//! Synchronization rules: decomposition templates fired by a trigger value.

use timeforge_core::{Bounds, ComponentId, RuleId, ValueId};
use timeforge_temporal::TemporalConstraintType;

use crate::value::ParameterRelationType;

/// A token to instantiate when the rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVariable {
    pub component: ComponentId,
    pub value: ValueId,
    /// Parameter labels, scoped to the rule.
    pub labels: Vec<String>,
    pub mandatory_expansion: bool,
    pub mandatory_unification: bool,
}

impl TokenVariable {
    pub fn new(component: ComponentId, value: ValueId) -> Self {
        Self {
            component,
            value,
            labels: Vec::new(),
            mandatory_expansion: false,
            mandatory_unification: false,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn mandatory_expansion(mut self) -> Self {
        self.mandatory_expansion = true;
        self
    }

    pub fn mandatory_unification(mut self) -> Self {
        self.mandatory_unification = true;
        self
    }
}

/// Endpoint of a rule constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    Trigger,
    /// Index into [`SynchronizationRule::variables`].
    Variable(usize),
}

/// Constraint instantiated together with the rule's tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleConstraint {
    Temporal {
        kind: TemporalConstraintType,
        reference: TokenRef,
        target: TokenRef,
        bounds: Vec<Bounds>,
    },
    /// Equality or inequality between two labels of the rule.
    Parameter {
        kind: ParameterRelationType,
        reference: String,
        target: String,
    },
    /// Binds a label to a literal.
    Bind { label: String, value: String },
}

/// A decomposition template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizationRule {
    pub id: RuleId,
    pub trigger_component: ComponentId,
    pub trigger_value: ValueId,
    /// Labels of the trigger's placeholders, mapped by position.
    pub trigger_labels: Vec<String>,
    pub variables: Vec<TokenVariable>,
    pub constraints: Vec<RuleConstraint>,
}

impl SynchronizationRule {
    pub fn new(trigger_component: ComponentId, trigger_value: ValueId) -> Self {
        Self {
            id: RuleId(0),
            trigger_component,
            trigger_value,
            trigger_labels: Vec::new(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_trigger_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a token variable and returns its reference.
    pub fn add_variable(&mut self, variable: TokenVariable) -> TokenRef {
        self.variables.push(variable);
        TokenRef::Variable(self.variables.len() - 1)
    }

    pub fn add_temporal(
        &mut self,
        kind: TemporalConstraintType,
        reference: TokenRef,
        target: TokenRef,
        bounds: impl Into<Vec<Bounds>>,
    ) {
        self.constraints.push(RuleConstraint::Temporal {
            kind,
            reference,
            target,
            bounds: bounds.into(),
        });
    }

    pub fn add_parameter(
        &mut self,
        kind: ParameterRelationType,
        reference: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.constraints.push(RuleConstraint::Parameter {
            kind,
            reference: reference.into(),
            target: target.into(),
        });
    }

    pub fn add_bind(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.constraints.push(RuleConstraint::Bind {
            label: label.into(),
            value: value.into(),
        });
    }

    /// Finds which token owns `label`, and at which placeholder position.
    pub fn resolve_label(&self, label: &str) -> Option<(TokenRef, usize)> {
        if let Some(i) = self.trigger_labels.iter().position(|l| l == label) {
            return Some((TokenRef::Trigger, i));
        }
        self.variables.iter().enumerate().find_map(|(v, var)| {
            var.labels
                .iter()
                .position(|l| l == label)
                .map(|i| (TokenRef::Variable(v), i))
        })
    }

    /// Target values of the rule.
    pub fn target_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.variables.iter().map(|v| v.value)
    }
}
