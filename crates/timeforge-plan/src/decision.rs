//! Decisions and their tokens.

use std::fmt;

use timeforge_core::{Bounds, ComponentId, DecisionId, ValueId};
use timeforge_parameter::ParameterId;
use timeforge_temporal::IntervalId;

use crate::relation::TimeWindow;

/// Lifecycle state of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecisionState {
    /// Created but not temporally anchored.
    Pending,
    /// Propagated into the plan.
    Active,
    /// Retracted but kept for restoration.
    Silent,
}

impl fmt::Display for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionState::Pending => write!(f, "pending"),
            DecisionState::Active => write!(f, "active"),
            DecisionState::Silent => write!(f, "silent"),
        }
    }
}

/// Temporal and parameter instantiation of an active decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub interval: IntervalId,
    /// One parameter per placeholder of the value.
    pub parameters: Vec<ParameterId>,
}

/// An instance of a component value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub id: DecisionId,
    pub component: ComponentId,
    pub value: ValueId,
    /// Parameter labels, one per placeholder.
    pub labels: Vec<String>,
    pub state: DecisionState,
    pub token: Option<Token>,
    pub mandatory_expansion: bool,
    pub mandatory_unification: bool,
    /// Decision whose expansion created this one.
    pub causal_link: Option<DecisionId>,
    pub start: Option<Bounds>,
    pub end: Option<Bounds>,
    pub duration: Option<Bounds>,
}

impl Decision {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == DecisionState::Active
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state == DecisionState::Pending
    }

    #[inline]
    pub fn interval(&self) -> Option<IntervalId> {
        self.token.as_ref().map(|t| t.interval)
    }

    /// Requested start, end and duration bounds.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
            duration: self.duration,
        }
    }
}

/// Everything needed to create a decision.
///
/// # Example
///
/// ```
/// use timeforge_core::{Bounds, ValueId};
/// use timeforge_plan::DecisionSpec;
///
/// let spec = DecisionSpec::new(ValueId(3))
///     .with_labels(["?x"])
///     .with_start(Bounds::new(0, 10))
///     .with_mandatory_expansion(true);
/// assert_eq!(spec.labels, vec!["?x".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSpec {
    pub value: ValueId,
    pub labels: Vec<String>,
    pub start: Option<Bounds>,
    pub end: Option<Bounds>,
    pub duration: Option<Bounds>,
    pub mandatory_expansion: bool,
    pub mandatory_unification: bool,
    pub causal_link: Option<DecisionId>,
}

impl DecisionSpec {
    pub fn new(value: ValueId) -> Self {
        Self {
            value,
            labels: Vec::new(),
            start: None,
            end: None,
            duration: None,
            mandatory_expansion: false,
            mandatory_unification: false,
            causal_link: None,
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

    pub fn with_mandatory_expansion(mut self, mandatory: bool) -> Self {
        self.mandatory_expansion = mandatory;
        self
    }

    pub fn with_mandatory_unification(mut self, mandatory: bool) -> Self {
        self.mandatory_unification = mandatory;
        self
    }

    pub fn with_causal_link(mut self, cause: DecisionId) -> Self {
        self.causal_link = Some(cause);
        self
    }
}
