//! Planning problems: facts, goals and constraints.

use timeforge_core::{Bounds, ValueId};
use timeforge_temporal::TemporalConstraintType;

use crate::relation::RelationKind;

/// A fact or goal of the problem, addressed by `key` in constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDecision {
    pub key: String,
    pub value: ValueId,
    pub labels: Vec<String>,
    pub start: Option<Bounds>,
    pub end: Option<Bounds>,
    pub duration: Option<Bounds>,
}

impl ProblemDecision {
    pub fn new(key: impl Into<String>, value: ValueId) -> Self {
        Self {
            key: key.into(),
            value,
            labels: Vec::new(),
            start: None,
            end: None,
            duration: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_start(mut self, start: Bounds) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Bounds) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_duration(mut self, duration: Bounds) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A constraint between two problem decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemConstraint {
    pub reference: String,
    pub target: String,
    pub kind: RelationKind,
}

/// Input of [`PlanDataBase::setup`](crate::PlanDataBase::setup).
///
/// Facts become active decisions, goals become pending decisions that
/// require expansion.
///
/// # Example
///
/// ```
/// use timeforge_core::{Bounds, ValueId};
/// use timeforge_plan::{Problem, ProblemDecision};
/// use timeforge_temporal::TemporalConstraintType;
///
/// let mut problem = Problem::new();
/// problem.add_fact(ProblemDecision::new("f0", ValueId(0)).with_start(Bounds::point(0)));
/// problem.add_goal(ProblemDecision::new("g0", ValueId(1)));
/// problem.add_temporal("f0", "g0", TemporalConstraintType::Before, vec![Bounds::new(0, 50)]);
/// assert_eq!(problem.constraints.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problem {
    pub facts: Vec<ProblemDecision>,
    pub goals: Vec<ProblemDecision>,
    pub constraints: Vec<ProblemConstraint>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fact(&mut self, fact: ProblemDecision) -> &mut Self {
        self.facts.push(fact);
        self
    }

    pub fn add_goal(&mut self, goal: ProblemDecision) -> &mut Self {
        self.goals.push(goal);
        self
    }

    pub fn add_temporal(
        &mut self,
        reference: impl Into<String>,
        target: impl Into<String>,
        kind: TemporalConstraintType,
        bounds: Vec<Bounds>,
    ) -> &mut Self {
        self.add_constraint(reference, target, RelationKind::temporal(kind, bounds))
    }

    pub fn add_constraint(
        &mut self,
        reference: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
    ) -> &mut Self {
        self.constraints.push(ProblemConstraint {
            reference: reference.into(),
            target: target.into(),
            kind,
        });
        self
    }

    /// Binds a placeholder of a fact or goal to a literal.
    pub fn bind(&mut self, key: impl Into<String>, parameter: usize, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.add_constraint(key.clone(), key, RelationKind::bind(parameter, value))
    }
}
