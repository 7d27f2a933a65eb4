//! Depth-first search.

use super::{SearchSpaceNode, SearchStrategy};

/// Stack fringe: the most recently generated node is visited first.
///
/// Children of one expansion are pushed in reverse, so the first (best
/// ranked) child is visited first.
#[derive(Debug, Default)]
pub struct DepthFirstStrategy {
    stack: Vec<SearchSpaceNode>,
}

impl DepthFirstStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchStrategy for DepthFirstStrategy {
    fn enqueue(&mut self, node: SearchSpaceNode) {
        self.stack.push(node);
    }

    fn enqueue_all(&mut self, nodes: Vec<SearchSpaceNode>) {
        self.stack.extend(nodes.into_iter().rev());
    }

    fn dequeue(&mut self) -> Option<SearchSpaceNode> {
        self.stack.pop()
    }

    fn fringe_size(&self) -> usize {
        self.stack.len()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }

    fn name(&self) -> &'static str {
        "depth-first"
    }
}
