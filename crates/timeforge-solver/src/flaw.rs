//! Flaws of a partial plan.

use std::fmt;

use timeforge_core::{Bounds, ComponentId, DecisionId, FlawId};
use timeforge_plan::ResourceEvent;

use crate::solution::FlawSolution;

/// Category of a flaw, used by selection heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlawType {
    /// A pending decision waiting for expansion or unification.
    Goal,
    /// A temporal hole between two adjacent timeline tokens.
    Gap,
    /// Two adjacent tokens touching without a MEETS relation.
    SemanticConnection,
    /// Two tokens of one timeline that may overlap.
    SchedulingConflict,
    /// A reservoir level leaving its capacity.
    ReservoirOverflow,
}

impl fmt::Display for FlawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlawType::Goal => "goal",
            FlawType::Gap => "gap",
            FlawType::SemanticConnection => "semantic-connection",
            FlawType::SchedulingConflict => "scheduling-conflict",
            FlawType::ReservoirOverflow => "reservoir-overflow",
        };
        f.write_str(name)
    }
}

/// Which capacity bound a reservoir peak violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakDirection {
    /// Level below the minimum capacity.
    Underflow,
    /// Level above the maximum capacity.
    Overflow,
}

/// A maximal stretch of a reservoir profile whose level leaves the
/// capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peak {
    /// Events of the stretch, in profile order.
    pub critical: Vec<ResourceEvent>,
    /// Level reached just before the first critical event.
    pub start_level: i64,
    pub direction: PeakDirection,
}

/// What is wrong, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlawKind {
    Goal {
        decision: DecisionId,
    },
    Gap {
        left: DecisionId,
        right: DecisionId,
        /// Distance from the end of `left` to the start of `right`.
        distance: Bounds,
    },
    SemanticConnection {
        left: DecisionId,
        right: DecisionId,
    },
    SchedulingConflict {
        first: DecisionId,
        second: DecisionId,
    },
    ReservoirOverflow(Peak),
}

impl FlawKind {
    pub fn flaw_type(&self) -> FlawType {
        match self {
            FlawKind::Goal { .. } => FlawType::Goal,
            FlawKind::Gap { .. } => FlawType::Gap,
            FlawKind::SemanticConnection { .. } => FlawType::SemanticConnection,
            FlawKind::SchedulingConflict { .. } => FlawType::SchedulingConflict,
            FlawKind::ReservoirOverflow(_) => FlawType::ReservoirOverflow,
        }
    }

    /// Decisions the flaw is about.
    pub fn decisions(&self) -> Vec<DecisionId> {
        match self {
            FlawKind::Goal { decision } => vec![*decision],
            FlawKind::Gap { left, right, .. } | FlawKind::SemanticConnection { left, right } => {
                vec![*left, *right]
            }
            FlawKind::SchedulingConflict { first, second } => vec![*first, *second],
            FlawKind::ReservoirOverflow(peak) => {
                peak.critical.iter().map(|e| e.decision).collect()
            }
        }
    }
}

/// A defect of the current partial plan.
#[derive(Debug, Clone)]
pub struct Flaw {
    pub id: FlawId,
    pub component: ComponentId,
    pub kind: FlawKind,
    /// Filled by the owning resolver's `compute_solutions`.
    pub solutions: Vec<FlawSolution>,
    /// Index of the resolver that detected the flaw.
    pub resolver: usize,
}

impl Flaw {
    pub fn new(id: FlawId, component: ComponentId, kind: FlawKind) -> Self {
        Self {
            id,
            component,
            kind,
            solutions: Vec::new(),
            resolver: 0,
        }
    }

    #[inline]
    pub fn flaw_type(&self) -> FlawType {
        self.kind.flaw_type()
    }

    pub fn is_solvable(&self) -> bool {
        !self.solutions.is_empty()
    }

    /// True if both flaws describe the same defect, regardless of ids.
    pub fn same_defect(&self, other: &Flaw) -> bool {
        self.component == other.component && self.kind == other.kind
    }
}

impl fmt::Display for Flaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.flaw_type(), self.id, self.component)?;
        let decisions = self.kind.decisions();
        if !decisions.is_empty() {
            let names: Vec<String> = decisions.iter().map(|d| d.to_string()).collect();
            write!(f, " ({})", names.join(", "))?;
        }
        Ok(())
    }
}
