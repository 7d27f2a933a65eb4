//! The planning domain: components, values, transitions and rules.
//!
//! Rules are checked for decomposition cycles when added. The component
//! dependency graph, the component hierarchy and the value decomposition
//! tree are derived from the stored rules on demand.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use timeforge_core::{Bounds, ComponentId, Result, RuleId, TimeforgeError, ValueId};
use timeforge_parameter::ParameterDomain;

use crate::component::{ComponentKind, DomainComponent};
use crate::rule::{RuleConstraint, SynchronizationRule, TokenRef};
use crate::value::{
    ComponentValue, ParameterPlaceholder, ResourceEffect, Transition, TransitionConstraint,
};

/// Name of the amount placeholder of reservoir values.
pub const AMOUNT_PARAMETER: &str = "?amount";

/// Duration of reservoir production and consumption events.
pub const RESOURCE_EVENT_DURATION: Bounds = Bounds::new(1, 1);

/// Largest amount a single reservoir event may carry.
pub const MAX_RESOURCE_AMOUNT: i64 = i32::MAX as i64;

/// Immutable planning domain shared by the plan database and the solver.
///
/// # Example
///
/// ```
/// use timeforge_core::Bounds;
/// use timeforge_plan::PlanDomain;
///
/// let mut domain = PlanDomain::new("rover");
/// let nav = domain.add_state_variable("navigation", false);
/// let at = domain.add_value(nav, "At", Bounds::new(1, 100), true).unwrap();
/// let go = domain.add_value(nav, "GoingTo", Bounds::new(10, 20), true).unwrap();
/// domain.add_transition(at, go).unwrap();
/// domain.add_transition(go, at).unwrap();
/// assert_eq!(domain.component(nav).unwrap().paths(at, go), vec![vec![at, go]]);
/// ```
#[derive(Debug, Clone)]
pub struct PlanDomain {
    name: String,
    components: Vec<DomainComponent>,
    values: Vec<ComponentValue>,
    rules: Vec<SynchronizationRule>,
}

impl PlanDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            values: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn add_component(&mut self, name: impl Into<String>, kind: ComponentKind) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components
            .push(DomainComponent::new(id, name.into(), kind));
        id
    }

    pub fn add_state_variable(&mut self, name: impl Into<String>, external: bool) -> ComponentId {
        self.add_component(name, ComponentKind::StateVariable { external })
    }

    pub fn add_unary_resource(&mut self, name: impl Into<String>) -> ComponentId {
        self.add_component(name, ComponentKind::UnaryResource)
    }

    /// Adds a reservoir together with its `produce(?amount)` and
    /// `consume(?amount)` values.
    pub fn add_reservoir(
        &mut self,
        name: impl Into<String>,
        min: i64,
        max: i64,
        initial: i64,
    ) -> Result<ComponentId> {
        let name = name.into();
        if min > max || !(min..=max).contains(&initial) {
            return Err(TimeforgeError::Domain(format!(
                "reservoir {name}: initial level {initial} outside [{min}, {max}]"
            )));
        }
        let id = self.add_component(name, ComponentKind::Reservoir { min, max, initial });
        for (label, effect) in [
            ("produce", ResourceEffect::Production),
            ("consume", ResourceEffect::Consumption),
        ] {
            let amount = ParameterPlaceholder::new(
                AMOUNT_PARAMETER,
                ParameterDomain::numeric("amount", 0, MAX_RESOURCE_AMOUNT),
            );
            self.push_value(
                id,
                label.to_string(),
                RESOURCE_EVENT_DURATION,
                true,
                vec![amount],
                Some(effect),
            )?;
        }
        Ok(id)
    }

    pub fn add_value(
        &mut self,
        component: ComponentId,
        label: impl Into<String>,
        duration: Bounds,
        controllable: bool,
    ) -> Result<ValueId> {
        self.push_value(component, label.into(), duration, controllable, Vec::new(), None)
    }

    pub fn add_value_with_parameters(
        &mut self,
        component: ComponentId,
        label: impl Into<String>,
        duration: Bounds,
        controllable: bool,
        parameters: Vec<ParameterPlaceholder>,
    ) -> Result<ValueId> {
        self.push_value(component, label.into(), duration, controllable, parameters, None)
    }

    fn push_value(
        &mut self,
        component: ComponentId,
        label: String,
        duration: Bounds,
        controllable: bool,
        parameters: Vec<ParameterPlaceholder>,
        effect: Option<ResourceEffect>,
    ) -> Result<ValueId> {
        if duration.is_empty() || duration.lb < 0 {
            return Err(TimeforgeError::Domain(format!(
                "value {label}: invalid duration {duration}"
            )));
        }
        let owner = self.component(component)?;
        if owner
            .values
            .iter()
            .any(|v| self.values[v.0].label == label)
        {
            return Err(TimeforgeError::Domain(format!(
                "component {} already has a value {label}",
                owner.name
            )));
        }
        let id = ValueId(self.values.len());
        self.components[component.0].values.push(id);
        self.values.push(ComponentValue {
            id,
            component,
            label,
            duration,
            controllable,
            parameters,
            effect,
        });
        Ok(id)
    }

    pub fn add_transition(&mut self, from: ValueId, to: ValueId) -> Result<()> {
        self.add_transition_with(from, to, Vec::new())
    }

    /// Adds a transition carrying parameter constraints.
    pub fn add_transition_with(
        &mut self,
        from: ValueId,
        to: ValueId,
        constraints: Vec<TransitionConstraint>,
    ) -> Result<()> {
        let (source, successor) = (self.value(from)?, self.value(to)?);
        if source.component != successor.component {
            return Err(TimeforgeError::Domain(format!(
                "transition {} -> {} crosses components",
                source.label, successor.label
            )));
        }
        for c in &constraints {
            if c.from_parameter >= source.arity() || c.to_parameter >= successor.arity() {
                return Err(TimeforgeError::Domain(format!(
                    "transition {} -> {} refers to a missing placeholder",
                    source.label, successor.label
                )));
            }
        }
        let component = source.component;
        self.components[component.0].add_transition(Transition {
            from,
            to,
            constraints,
        });
        Ok(())
    }

    /// Adds a synchronization rule.
    ///
    /// # Errors
    ///
    /// `SynchronizationCycle` if a target value can reach the trigger value
    /// through the existing rules; the rule is not stored. `Domain` for
    /// dangling values or labels.
    pub fn add_rule(&mut self, mut rule: SynchronizationRule) -> Result<RuleId> {
        self.validate_rule(&rule)?;

        let graph = self.decomposition_tree();
        for target in rule.target_values() {
            if target == rule.trigger_value || reaches(&graph, target, rule.trigger_value) {
                return Err(TimeforgeError::SynchronizationCycle(format!(
                    "{} -> {} closes a decomposition cycle",
                    self.values[rule.trigger_value.0].label, self.values[target.0].label
                )));
            }
        }

        let id = RuleId(self.rules.len());
        rule.id = id;
        debug!(
            "Added synchronization rule {} on {}",
            id, self.values[rule.trigger_value.0].label
        );
        self.rules.push(rule);
        Ok(id)
    }

    fn validate_rule(&self, rule: &SynchronizationRule) -> Result<()> {
        let trigger = self.value(rule.trigger_value)?;
        if trigger.component != rule.trigger_component {
            return Err(TimeforgeError::Domain(format!(
                "rule trigger {} does not belong to {}",
                trigger.label, rule.trigger_component
            )));
        }
        for var in &rule.variables {
            if self.value(var.value)?.component != var.component {
                return Err(TimeforgeError::Domain(format!(
                    "rule variable value {} does not belong to {}",
                    var.value, var.component
                )));
            }
        }
        let check_ref = |r: TokenRef| match r {
            TokenRef::Variable(i) if i >= rule.variables.len() => Err(TimeforgeError::Domain(
                format!("rule refers to missing token variable {i}"),
            )),
            _ => Ok(()),
        };
        for constraint in &rule.constraints {
            match constraint {
                RuleConstraint::Temporal {
                    kind,
                    reference,
                    target,
                    bounds,
                } => {
                    check_ref(*reference)?;
                    check_ref(*target)?;
                    if bounds.len() != kind.arity() {
                        return Err(TimeforgeError::Domain(format!(
                            "rule constraint {kind} expects {} bound pair(s)",
                            kind.arity()
                        )));
                    }
                }
                RuleConstraint::Parameter {
                    reference, target, ..
                } => {
                    for label in [reference, target] {
                        if rule.resolve_label(label).is_none() {
                            return Err(TimeforgeError::Domain(format!(
                                "rule refers to unknown label {label}"
                            )));
                        }
                    }
                }
                RuleConstraint::Bind { label, .. } => {
                    if rule.resolve_label(label).is_none() {
                        return Err(TimeforgeError::Domain(format!(
                            "rule refers to unknown label {label}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn components(&self) -> &[DomainComponent] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Result<&DomainComponent> {
        self.components
            .get(id.0)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown component {id}")))
    }

    pub fn component_by_name(&self, name: &str) -> Result<&DomainComponent> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown component {name}")))
    }

    pub fn value(&self, id: ValueId) -> Result<&ComponentValue> {
        self.values
            .get(id.0)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown value {id}")))
    }

    /// Looks a value up by component and label.
    pub fn value_by_label(&self, component: ComponentId, label: &str) -> Result<&ComponentValue> {
        let owner = self.component(component)?;
        owner
            .values
            .iter()
            .map(|v| &self.values[v.0])
            .find(|v| v.label == label)
            .ok_or_else(|| {
                TimeforgeError::Domain(format!("unknown value {label} on {}", owner.name))
            })
    }

    pub fn rules(&self) -> &[SynchronizationRule] {
        &self.rules
    }

    /// Rules triggered by `value`.
    pub fn rules_for(&self, value: ValueId) -> impl Iterator<Item = &SynchronizationRule> + '_ {
        self.rules.iter().filter(move |r| r.trigger_value == value)
    }

    /// Value decomposition tree: trigger value to the target values of its
    /// rules.
    pub fn decomposition_tree(&self) -> BTreeMap<ValueId, BTreeSet<ValueId>> {
        let mut tree: BTreeMap<ValueId, BTreeSet<ValueId>> = BTreeMap::new();
        for rule in &self.rules {
            tree.entry(rule.trigger_value)
                .or_default()
                .extend(rule.target_values());
        }
        tree
    }

    /// Component dependency graph.
    ///
    /// An edge `target -> trigger` says that the target component is
    /// driven by the trigger component. Edges that would close a cycle are
    /// skipped, so the graph is always acyclic.
    pub fn dependency_graph(&self) -> BTreeMap<ComponentId, BTreeSet<ComponentId>> {
        let mut graph: BTreeMap<ComponentId, BTreeSet<ComponentId>> = self
            .components
            .iter()
            .map(|c| (c.id, BTreeSet::new()))
            .collect();
        for rule in &self.rules {
            for var in &rule.variables {
                let (from, to) = (var.component, rule.trigger_component);
                if from == to || reaches(&graph, to, from) {
                    continue;
                }
                graph.entry(from).or_default().insert(to);
            }
        }
        graph
    }

    /// Hierarchy level of each component; masters (components no other
    /// component drives) sit at level 0.
    pub fn hierarchy(&self) -> BTreeMap<ComponentId, usize> {
        let graph = self.dependency_graph();
        let mut levels = BTreeMap::new();
        for component in &self.components {
            level_of(&graph, component.id, &mut levels);
        }
        levels
    }
}

fn reaches<K: Ord + Copy>(graph: &BTreeMap<K, BTreeSet<K>>, from: K, to: K) -> bool {
    let mut stack = vec![from];
    let mut seen = BTreeSet::new();
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = graph.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

fn level_of(
    graph: &BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    component: ComponentId,
    levels: &mut BTreeMap<ComponentId, usize>,
) -> usize {
    if let Some(level) = levels.get(&component) {
        return *level;
    }
    let level = graph
        .get(&component)
        .map(|drivers| {
            drivers
                .iter()
                .map(|d| level_of(graph, *d, levels) + 1)
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    levels.insert(component, level);
    level
}

#[cfg(test)]
mod tests;
