//! Error types for Timeforge

use thiserror::Error;

use crate::id::DecisionId;

/// Main error type for Timeforge operations.
///
/// Propagation failures are always recovered by a rollback at the level
/// that detected them; only [`TimeforgeError::Domain`] signals a structural
/// misconfiguration that a caller cannot repair by backtracking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeforgeError {
    /// A time point or distance constraint would make the network infeasible.
    #[error("Inconsistent distance constraint: {0}")]
    InconsistentDistanceConstraint(String),

    /// The temporal network failed a consistency check.
    #[error("Consistency check failed: {0}")]
    ConsistencyCheck(String),

    /// Contingent intervals were squeezed by propagation.
    #[error("Pseudo-controllability check failed for {} decision(s)", squeezed.len())]
    PseudoControllability {
        /// Decisions whose propagated duration is narrower than nominal.
        squeezed: Vec<DecisionId>,
    },

    /// A relation could not be committed.
    #[error("Relation propagation error: {0}")]
    RelationPropagation(String),

    /// A decision could not be committed.
    #[error("Decision propagation error: {0}")]
    DecisionPropagation(String),

    /// A parameter constraint emptied a parameter domain.
    #[error("Parameter propagation error: {0}")]
    ParameterPropagation(String),

    /// A flaw has no feasible solution.
    #[error("Unsolvable flaw: {0}")]
    UnsolvableFlaw(String),

    /// A synchronization rule would introduce a decomposition cycle.
    #[error("Synchronization cycle: {0}")]
    SynchronizationCycle(String),

    /// The search fringe was exhausted or the budget expired.
    #[error("No solution found: {0}")]
    NoSolutionFound(String),

    /// The initial problem could not be set up.
    #[error("Problem initialization error: {0}")]
    ProblemInitialization(String),

    /// Unknown component, value, label or relation type.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Error in planner configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TimeforgeError {
    /// Returns true for failures that a caller recovers from by retracting
    /// the attempted change (as opposed to misconfiguration or terminal
    /// search outcomes).
    pub fn is_propagation_failure(&self) -> bool {
        matches!(
            self,
            TimeforgeError::InconsistentDistanceConstraint(_)
                | TimeforgeError::ConsistencyCheck(_)
                | TimeforgeError::RelationPropagation(_)
                | TimeforgeError::DecisionPropagation(_)
                | TimeforgeError::ParameterPropagation(_)
        )
    }
}

/// Result type alias for Timeforge operations
pub type Result<T> = std::result::Result<T, TimeforgeError>;
