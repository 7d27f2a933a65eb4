//! Temporal intervals and query results.

use std::fmt;

use timeforge_core::Bounds;

use crate::network::TimePointId;

/// Handle of a temporal interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntervalId(pub usize);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// A pair of time points with a nominal duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalInterval {
    pub id: IntervalId,
    pub start: TimePointId,
    pub end: TimePointId,
    /// Nominal duration bounds.
    pub duration: Bounds,
    /// `false` for contingent intervals.
    pub controllable: bool,
}

/// Propagated schedule of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSchedule {
    pub start: Bounds,
    pub end: Bounds,
    /// Propagated duration bounds (`end - start`).
    pub duration: Bounds,
}

impl fmt::Display for IntervalSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start={} end={} duration={}",
            self.start, self.end, self.duration
        )
    }
}

/// Result of the makespan query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Makespan {
    /// Largest end lower bound over controllable intervals.
    pub min: i64,
    /// Largest end upper bound over controllable intervals.
    pub max: i64,
}
