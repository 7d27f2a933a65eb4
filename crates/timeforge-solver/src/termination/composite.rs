//! Search budgets made of several limits.

use super::Termination;
use crate::scope::SearchScope;

/// Stops the search as soon as any of its limits does.
///
/// The planner assembles one from the configured limits:
///
/// ```
/// use timeforge_solver::{NodeCountTermination, OrTermination, TimeTermination};
/// use std::time::Duration;
///
/// let limits = OrTermination::new()
///     .with(TimeTermination::new(Duration::from_secs(30)))
///     .with(NodeCountTermination::new(1000));
/// assert_eq!(limits.len(), 2);
/// assert!(limits.into_single().is_some());
/// ```
#[derive(Debug, Default)]
pub struct OrTermination {
    limits: Vec<Box<dyn Termination>>,
}

impl OrTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, limit: impl Termination + 'static) -> Self {
        self.push(limit);
        self
    }

    pub fn push(&mut self, limit: impl Termination + 'static) {
        self.limits.push(Box::new(limit));
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Collapses the budget: `None` without limits, the limit itself when
    /// there is only one.
    pub fn into_single(mut self) -> Option<Box<dyn Termination>> {
        match self.limits.len() {
            0 => None,
            1 => self.limits.pop(),
            _ => Some(Box::new(self)),
        }
    }
}

impl Termination for OrTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        self.limits.iter().any(|limit| limit.is_terminated(scope))
    }
}
