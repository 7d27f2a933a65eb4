//! Flaw selection heuristics.
//!
//! A heuristic narrows the detected flaws down to the class the planner
//! branches on next. The planner then picks the flaw of the class with the
//! fewest solutions (fail-first).

mod hierarchical;
mod random;

use std::fmt::Debug;

use timeforge_core::Result;
use timeforge_plan::PlanDataBase;

use crate::flaw::Flaw;

pub use hierarchical::HierarchicalFlawSelection;
pub use random::RandomFlawSelection;

/// Chooses which flaws to branch on.
pub trait FlawSelectionHeuristic: Send + Debug {
    /// Returns a non-empty subset of `flaws` when `flaws` is not empty.
    fn select(&mut self, flaws: Vec<Flaw>, pdb: &PlanDataBase) -> Result<Vec<Flaw>>;

    fn name(&self) -> &'static str;
}
