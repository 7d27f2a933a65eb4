//! Depth-first, cost-first search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{SearchSpaceNode, SearchStrategy};

/// A node wrapper for priority queue ordering.
#[derive(Debug)]
struct PriorityNode {
    sequence: u64,
    node: SearchSpaceNode,
}

impl Eq for PriorityNode {}

impl PartialEq for PriorityNode {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Ord for PriorityNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Deeper first, then cheaper, then shorter makespan, then older.
        self.node
            .depth()
            .cmp(&other.node.depth())
            .then_with(|| other.node.cost().total_cmp(&self.node.cost()))
            .then_with(|| other.node.makespan().cmp(&self.node.makespan()))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for PriorityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority fringe keyed by depth, accumulated cost and makespan.
#[derive(Debug, Default)]
pub struct DepthFirstCostFirstStrategy {
    fringe: BinaryHeap<PriorityNode>,
    sequence: u64,
}

impl DepthFirstCostFirstStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchStrategy for DepthFirstCostFirstStrategy {
    fn enqueue(&mut self, node: SearchSpaceNode) {
        let sequence = self.sequence;
        self.sequence += 1;
        self.fringe.push(PriorityNode { sequence, node });
    }

    fn dequeue(&mut self) -> Option<SearchSpaceNode> {
        self.fringe.pop().map(|p| p.node)
    }

    fn fringe_size(&self) -> usize {
        self.fringe.len()
    }

    fn clear(&mut self) {
        self.fringe.clear();
    }

    fn name(&self) -> &'static str {
        "depth-first-cost-first"
    }
}
