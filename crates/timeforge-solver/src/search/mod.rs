//! Search strategies over plan-space nodes.
//!
//! A strategy only decides the order in which the fringe is visited:
//!
//! - [`DepthFirstStrategy`]: most recently generated node first
//! - [`DepthFirstCostFirstStrategy`]: deepest node first, ties broken by
//!   lower accumulated cost, then lower makespan

mod cost_first;
mod depth_first;
mod node;

use std::fmt::Debug;

pub use cost_first::DepthFirstCostFirstStrategy;
pub use depth_first::DepthFirstStrategy;
pub use node::{Operator, SearchSpaceNode};

/// Ordering of the search fringe.
pub trait SearchStrategy: Send + Debug {
    /// Adds a node to the fringe.
    fn enqueue(&mut self, node: SearchSpaceNode);

    /// Adds the children of one expansion, best first.
    fn enqueue_all(&mut self, nodes: Vec<SearchSpaceNode>) {
        for node in nodes {
            self.enqueue(node);
        }
    }

    /// Removes the next node to visit.
    fn dequeue(&mut self) -> Option<SearchSpaceNode>;

    fn fringe_size(&self) -> usize;

    fn clear(&mut self);

    fn name(&self) -> &'static str;
}
