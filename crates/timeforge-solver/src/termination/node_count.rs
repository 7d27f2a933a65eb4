//! Expanded node count termination.

use super::Termination;
use crate::scope::SearchScope;

/// Terminates after a number of node expansions.
///
/// # Example
///
/// ```
/// use timeforge_solver::NodeCountTermination;
///
/// let term = NodeCountTermination::new(10_000);
/// ```
#[derive(Debug, Clone)]
pub struct NodeCountTermination {
    limit: u64,
}

impl NodeCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for NodeCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.nodes_expanded() >= self.limit
    }
}
