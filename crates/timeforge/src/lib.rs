//! Timeforge - A timeline-based planner in Rust
//!
//! Describe components, values and synchronization rules in a
//! [`PlanDomain`], state facts and goals in a [`Problem`], and call
//! [`solve`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use timeforge::prelude::*;
//!
//! let mut domain = PlanDomain::new("rover");
//! let nav = domain.add_state_variable("navigation", false);
//! let at = domain.add_value(nav, "At", Bounds::new(1, 100), true).unwrap();
//! let go = domain.add_value(nav, "GoingTo", Bounds::new(10, 20), true).unwrap();
//! domain.add_transition(at, go).unwrap();
//! domain.add_transition(go, at).unwrap();
//!
//! let mut problem = Problem::new();
//! problem
//!     .add_fact(ProblemDecision::new("start", at).with_start(Bounds::point(0)))
//!     .add_goal(ProblemDecision::new("drive", go));
//!
//! let config = PlannerConfig::new().with_horizon(100);
//! let plan = timeforge::solve(Arc::new(domain), &problem, &config).unwrap();
//! assert_eq!(plan.timeline("navigation").unwrap().tokens.len(), 2);
//! ```

use std::sync::Arc;

use tracing::info;

pub use timeforge_config::{
    ConfigError, CostConfig, FlawSelectionType, PlannerConfig, SearchStrategyType,
    TerminationConfig,
};
pub use timeforge_core::{Bounds, DecisionId, IdGenerator, Result, TimeforgeError};
pub use timeforge_parameter::ParameterDomain;
pub use timeforge_plan::{
    ParameterPlaceholder, ParameterRelationType, PlanDataBase, PlanDomain, Problem,
    ProblemDecision, SolutionPlan, SynchronizationRule, TokenRef, TokenVariable,
};
pub use timeforge_solver::{Planner, SearchStatistics};
pub use timeforge_temporal::TemporalConstraintType;

#[cfg(feature = "console")]
pub mod console;

/// Sets up `problem` on a fresh plan database and searches for a plan.
///
/// # Errors
///
/// `Config` for an invalid configuration, `ProblemInitialization` if the
/// problem cannot be set up, `NoSolutionFound` if the search fails.
pub fn solve(domain: Arc<PlanDomain>, problem: &Problem, config: &PlannerConfig) -> Result<SolutionPlan> {
    let mut planner = Planner::new(domain, config)?;
    let keys = planner.setup(problem)?;
    info!(event = "problem_loaded", decisions = keys.len());
    planner.solve()
}

pub mod prelude {
    pub use super::{
        Bounds, FlawSelectionType, ParameterDomain, ParameterPlaceholder, PlanDomain, Planner,
        PlannerConfig, Problem, ProblemDecision, SearchStrategyType, SolutionPlan,
        SynchronizationRule, TemporalConstraintType, TimeforgeError, TokenRef, TokenVariable,
    };
}
