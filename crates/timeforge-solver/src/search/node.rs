//! Search space nodes and operators.

use std::fmt;
use std::sync::Arc;

use timeforge_core::{DecisionId, NodeId, SolutionId};

use crate::solution::FlawSolution;

/// A flaw solution chosen by the search, with its cost.
#[derive(Debug, Clone)]
pub struct Operator {
    pub solution: Arc<FlawSolution>,
    /// Index of the resolver that applies the solution.
    pub resolver: usize,
    pub cost: f64,
}

impl Operator {
    pub fn new(solution: FlawSolution, resolver: usize) -> Self {
        let cost = solution.cost;
        Self {
            solution: Arc::new(solution),
            resolver,
            cost,
        }
    }

    #[inline]
    pub fn id(&self) -> SolutionId {
        self.solution.id
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.solution)
    }
}

/// A partial plan, described by the operators leading to it from the root.
///
/// Nodes never change once created; children share their ancestors'
/// operators through `Arc`.
#[derive(Debug, Clone)]
pub struct SearchSpaceNode {
    id: NodeId,
    parent: Option<NodeId>,
    operators: Vec<Arc<Operator>>,
    /// Accumulated operator cost.
    cost: f64,
    /// Makespan estimate of the partial plan.
    makespan: i64,
    /// Open goals of the partial plan, known once the node is materialized.
    agenda: Option<Vec<DecisionId>>,
}

impl SearchSpaceNode {
    /// Creates the root node: no operators.
    pub fn root(id: NodeId, makespan: i64) -> Self {
        Self {
            id,
            parent: None,
            operators: Vec::new(),
            cost: 0.0,
            makespan,
            agenda: None,
        }
    }

    /// Creates the child reached by applying `operator` to `parent`.
    pub fn child(id: NodeId, parent: &SearchSpaceNode, operator: Operator) -> Self {
        let makespan = operator.solution.makespan.unwrap_or(parent.makespan);
        let cost = parent.cost + operator.cost;
        let mut operators = Vec::with_capacity(parent.operators.len() + 1);
        operators.extend(parent.operators.iter().cloned());
        operators.push(Arc::new(operator));
        Self {
            id,
            parent: Some(parent.id),
            operators,
            cost,
            makespan,
            agenda: None,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.operators.len()
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    #[inline]
    pub fn makespan(&self) -> i64 {
        self.makespan
    }

    pub fn is_root(&self) -> bool {
        self.operators.is_empty()
    }

    /// Operators from the root, in application order.
    pub fn operators(&self) -> &[Arc<Operator>] {
        &self.operators
    }

    /// Open goals recorded when the node was materialized.
    pub fn agenda(&self) -> Option<&[DecisionId]> {
        self.agenda.as_deref()
    }

    pub(crate) fn set_agenda(&mut self, agenda: Vec<DecisionId>) {
        self.agenda = Some(agenda);
    }

    /// The operator that generated this node.
    pub fn generator(&self) -> Option<&Arc<Operator>> {
        self.operators.last()
    }
}

impl fmt::Display for SearchSpaceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} depth={} cost={} makespan={}",
            self.id,
            self.depth(),
            self.cost,
            self.makespan
        )
    }
}
