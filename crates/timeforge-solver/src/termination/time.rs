//! Wall-clock budget.

use std::time::Duration;

use super::Termination;
use crate::scope::SearchScope;

/// Stops the search once it has run for `budget`.
///
/// Nothing is spent before `start_solving`, so a scope that never started
/// is never out of time.
///
/// ```
/// use std::time::Duration;
/// use timeforge_solver::{SearchScope, Termination, TimeTermination};
///
/// let budget = TimeTermination::new(Duration::from_secs(30));
/// let mut scope = SearchScope::new();
/// assert_eq!(budget.remaining(&scope), Duration::from_secs(30));
///
/// scope.start_solving();
/// assert!(!budget.is_terminated(&scope));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTermination {
    budget: Duration,
}

impl TimeTermination {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the search must stop.
    pub fn remaining(&self, scope: &SearchScope) -> Duration {
        self.budget
            .saturating_sub(scope.elapsed().unwrap_or(Duration::ZERO))
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.elapsed().is_some() && self.remaining(scope).is_zero()
    }
}
