//! Search scope handed to terminations.

use std::time::Duration;

use crate::statistics::SearchStatistics;

/// Read-only view of a running search.
#[derive(Debug, Default)]
pub struct SearchScope {
    stats: SearchStatistics,
    fringe_size: usize,
}

impl SearchScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_solving(&mut self) {
        self.stats = SearchStatistics::default();
        self.stats.start();
        self.fringe_size = 0;
    }

    /// Elapsed time since solving started, if started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.stats.is_started().then(|| self.stats.elapsed())
    }

    pub fn nodes_expanded(&self) -> u64 {
        self.stats.nodes_expanded
    }

    pub fn fringe_size(&self) -> usize {
        self.fringe_size
    }

    pub(crate) fn set_fringe_size(&mut self, size: usize) {
        self.fringe_size = size;
    }

    pub fn stats(&self) -> &SearchStatistics {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SearchStatistics {
        &mut self.stats
    }
}
