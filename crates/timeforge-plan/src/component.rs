//! Domain components: state variables and resources.

use std::collections::BTreeMap;
use std::fmt;

use timeforge_core::{ComponentId, ValueId};

use crate::value::Transition;

/// Kind of a domain component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A timeline of values linked by a transition table. External state
    /// variables are not controlled by the planner: their goals can only be
    /// unified.
    StateVariable { external: bool },
    /// Mutually exclusive usage with capacity one.
    UnaryResource,
    /// Consumable resource whose level must stay within `[min, max]`.
    Reservoir { min: i64, max: i64, initial: i64 },
}

impl ComponentKind {
    pub fn is_state_variable(&self) -> bool {
        matches!(self, ComponentKind::StateVariable { .. })
    }

    pub fn is_external(&self) -> bool {
        matches!(self, ComponentKind::StateVariable { external: true })
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::StateVariable { external: false } => write!(f, "state-variable"),
            ComponentKind::StateVariable { external: true } => write!(f, "external-state-variable"),
            ComponentKind::UnaryResource => write!(f, "unary-resource"),
            ComponentKind::Reservoir { min, max, initial } => {
                write!(f, "reservoir[{min}, {max}] initial={initial}")
            }
        }
    }
}

/// A component of the planning domain.
#[derive(Debug, Clone)]
pub struct DomainComponent {
    pub id: ComponentId,
    pub name: String,
    pub kind: ComponentKind,
    pub values: Vec<ValueId>,
    transitions: BTreeMap<ValueId, Vec<Transition>>,
}

impl DomainComponent {
    pub(crate) fn new(id: ComponentId, name: String, kind: ComponentKind) -> Self {
        Self {
            id,
            name,
            kind,
            values: Vec::new(),
            transitions: BTreeMap::new(),
        }
    }

    pub(crate) fn add_transition(&mut self, transition: Transition) {
        self.transitions
            .entry(transition.from)
            .or_default()
            .push(transition);
    }

    /// Outgoing transitions of a value.
    pub fn transitions_from(&self, value: ValueId) -> &[Transition] {
        self.transitions
            .get(&value)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The transition `from -> to`, if allowed.
    pub fn transition(&self, from: ValueId, to: ValueId) -> Option<&Transition> {
        self.transitions_from(from).iter().find(|t| t.to == to)
    }

    /// All simple value paths from `from` to `to`, endpoints included.
    ///
    /// A direct transition yields the path `[from, to]`; paths never visit a
    /// value twice.
    pub fn paths(&self, from: ValueId, to: ValueId) -> Vec<Vec<ValueId>> {
        let mut paths = Vec::new();
        let mut current = vec![from];
        self.collect_paths(to, &mut current, &mut paths);
        paths
    }

    fn collect_paths(&self, to: ValueId, current: &mut Vec<ValueId>, out: &mut Vec<Vec<ValueId>>) {
        let Some(&last) = current.last() else {
            return;
        };
        for transition in self.transitions_from(last) {
            if transition.to == to {
                let mut path = current.clone();
                path.push(to);
                out.push(path);
            } else if !current.contains(&transition.to) {
                current.push(transition.to);
                self.collect_paths(to, current, out);
                current.pop();
            }
        }
    }
}
