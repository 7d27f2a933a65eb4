//! Search statistics.

use std::time::{Duration, Instant};

/// Counters of one solve run.
///
/// # Example
///
/// ```
/// use timeforge_solver::SearchStatistics;
///
/// let mut stats = SearchStatistics::default();
/// stats.start();
/// stats.record_expansion(3);
/// stats.record_backtrack();
///
/// assert_eq!(stats.nodes_expanded, 1);
/// assert_eq!(stats.nodes_generated, 3);
/// assert_eq!(stats.backtracks, 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SearchStatistics {
    start_time: Option<Instant>,
    /// Child nodes pushed on the fringe.
    pub nodes_generated: u64,
    /// Nodes whose flaws were detected and branched on.
    pub nodes_expanded: u64,
    /// Nodes discarded because they could not be reached or refined.
    pub backtracks: u64,
    /// Solutions applied or restored on the plan database.
    pub solutions_applied: u64,
    /// Flaws detected over all expansions.
    pub flaws_detected: u64,
}

impl SearchStatistics {
    /// Marks the start of solving.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns the elapsed time since solving started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Records an expansion that generated `children` nodes.
    pub fn record_expansion(&mut self, children: usize) {
        self.nodes_expanded += 1;
        self.nodes_generated += children as u64;
    }

    pub fn record_backtrack(&mut self) {
        self.backtracks += 1;
    }

    pub fn record_applied(&mut self) {
        self.solutions_applied += 1;
    }

    pub fn record_flaws(&mut self, count: usize) {
        self.flaws_detected += count as u64;
    }

    /// Returns the expanded nodes per second rate.
    pub fn nodes_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.nodes_expanded as f64 / secs
        } else {
            0.0
        }
    }
}
