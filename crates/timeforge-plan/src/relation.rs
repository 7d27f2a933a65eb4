//! Relations between decisions.

use std::fmt;

use timeforge_core::{Bounds, DecisionId, RelationId};
use timeforge_parameter::ParameterConstraintId;
use timeforge_temporal::{TemporalConstraintHandle, TemporalConstraintType};

use crate::value::ParameterRelationType;

/// Lifecycle state of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationState {
    Pending,
    Active,
}

/// Parameter relation between placeholders of the two endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterRelation {
    /// `reference[reference_parameter] (==|!=) target[target_parameter]`.
    Compare {
        kind: ParameterRelationType,
        reference_parameter: usize,
        target_parameter: usize,
    },
    /// Binds `reference[parameter]` to a literal. Target is ignored.
    Bind { parameter: usize, value: String },
}

/// Absolute bounds on the schedule of a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<Bounds>,
    pub end: Option<Bounds>,
    pub duration: Option<Bounds>,
}

impl TimeWindow {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.duration.is_none()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WINDOW")?;
        let bounds = [
            ("start", self.start),
            ("end", self.end),
            ("duration", self.duration),
        ];
        for (name, bounds) in bounds {
            if let Some(b) = bounds {
                write!(f, " {name}={b}")?;
            }
        }
        Ok(())
    }
}

/// What a relation constrains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    Temporal {
        kind: TemporalConstraintType,
        bounds: Vec<Bounds>,
    },
    /// Pins the reference decision to a window. Target is the reference.
    Window(TimeWindow),
    Parameter(ParameterRelation),
}

impl RelationKind {
    pub fn temporal(kind: TemporalConstraintType, bounds: impl Into<Vec<Bounds>>) -> Self {
        RelationKind::Temporal {
            kind,
            bounds: bounds.into(),
        }
    }

    pub fn equal(reference_parameter: usize, target_parameter: usize) -> Self {
        RelationKind::Parameter(ParameterRelation::Compare {
            kind: ParameterRelationType::Equal,
            reference_parameter,
            target_parameter,
        })
    }

    pub fn not_equal(reference_parameter: usize, target_parameter: usize) -> Self {
        RelationKind::Parameter(ParameterRelation::Compare {
            kind: ParameterRelationType::NotEqual,
            reference_parameter,
            target_parameter,
        })
    }

    pub fn bind(parameter: usize, value: impl Into<String>) -> Self {
        RelationKind::Parameter(ParameterRelation::Bind {
            parameter,
            value: value.into(),
        })
    }

    pub fn window(window: TimeWindow) -> Self {
        RelationKind::Window(window)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, RelationKind::Temporal { .. } | RelationKind::Window(_))
    }

    /// The Allen kind of a temporal relation.
    pub fn temporal_kind(&self) -> Option<TemporalConstraintType> {
        match self {
            RelationKind::Temporal { kind, .. } => Some(*kind),
            RelationKind::Window(_) | RelationKind::Parameter(_) => None,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Temporal { kind, bounds } => {
                write!(f, "{kind}")?;
                for b in bounds {
                    write!(f, " {b}")?;
                }
                Ok(())
            }
            RelationKind::Window(window) => write!(f, "{window}"),
            RelationKind::Parameter(ParameterRelation::Compare {
                kind,
                reference_parameter,
                target_parameter,
            }) => {
                let op = match kind {
                    ParameterRelationType::Equal => "EQUAL",
                    ParameterRelationType::NotEqual => "NOT-EQUAL",
                };
                write!(f, "{op} #{reference_parameter} #{target_parameter}")
            }
            RelationKind::Parameter(ParameterRelation::Bind { parameter, value }) => {
                write!(f, "BIND #{parameter} {value}")
            }
        }
    }
}

/// Constraint materialised by an active relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagatedConstraint {
    Temporal(TemporalConstraintHandle),
    Parameter(ParameterConstraintId),
}

/// A directed relation between two decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: RelationId,
    pub reference: DecisionId,
    pub target: DecisionId,
    pub kind: RelationKind,
    pub state: RelationState,
    pub constraint: Option<PropagatedConstraint>,
}

impl Relation {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == RelationState::Active
    }

    /// True if `decision` is one of the endpoints.
    #[inline]
    pub fn touches(&self, decision: DecisionId) -> bool {
        self.reference == decision || self.target == decision
    }

    /// The other endpoint, if `decision` is one of them.
    pub fn other(&self, decision: DecisionId) -> Option<DecisionId> {
        if self.reference == decision {
            Some(self.target)
        } else if self.target == decision {
            Some(self.reference)
        } else {
            None
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {}",
            self.id, self.reference, self.target, self.kind
        )
    }
}
