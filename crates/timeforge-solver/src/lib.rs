//! Timeforge Solver - flaw resolution and plan-space search
//!
//! This crate provides:
//! - [`Flaw`] and [`FlawSolution`]: detected defects of a partial plan and
//!   the reversible repairs proposed for them
//! - [`Resolver`]: gap completion, timeline scheduling, reservoir
//!   resolution and plan refinement over a [`PlanDataBase`]
//! - Search strategies, flaw selection heuristics and terminations
//! - [`Planner`]: the solve loop keeping the plan database in sync with
//!   the currently expanded search node
//!
//! [`PlanDataBase`]: timeforge_plan::PlanDataBase

pub mod flaw;
pub mod heuristic;
pub mod planner;
pub mod resolver;
pub mod scope;
pub mod search;
pub mod solution;
pub mod statistics;
pub mod termination;

pub use flaw::{Flaw, FlawKind, FlawType, Peak, PeakDirection};
pub use heuristic::{FlawSelectionHeuristic, HierarchicalFlawSelection, RandomFlawSelection};
pub use planner::Planner;
pub use resolver::{Resolver, ResolverType};
pub use scope::SearchScope;
pub use search::{
    DepthFirstCostFirstStrategy, DepthFirstStrategy, Operator, SearchSpaceNode, SearchStrategy,
};
pub use solution::{Effects, FlawSolution, SolutionKind};
pub use statistics::SearchStatistics;
pub use termination::{
    ExternalTermination, NodeCountTermination, OrTermination, Termination, TimeTermination,
};
