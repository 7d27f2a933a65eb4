//! Allen interval constraints.
//!
//! Each interval constraint translates to one or two distance edges
//! between the start/end time points of its reference and target
//! intervals.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use timeforge_core::{Bounds, Result, TimeforgeError};

use crate::interval::TemporalInterval;
use crate::network::Edge;

/// Kinds of interval constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalConstraintType {
    /// `reference.end -> target.start` within one bound pair.
    Before,
    /// `target.end -> reference.start` within one bound pair.
    After,
    /// `reference.end == target.start`.
    Meets,
    /// `target.end == reference.start`.
    MetBy,
    /// Target lies within reference (start and end bound pairs).
    Contains,
    /// Reference lies within target (start and end bound pairs).
    During,
    /// Reference starts while target is running.
    StartsDuring,
    /// Reference ends while target is running.
    EndsDuring,
    /// Same start and same end.
    Equals,
    /// `reference.start -> target.start` within one bound pair.
    StartStart,
    /// `reference.end -> target.end` within one bound pair.
    EndEnd,
}

impl TemporalConstraintType {
    /// Number of bound pairs the constraint carries.
    pub fn arity(self) -> usize {
        use TemporalConstraintType::*;
        match self {
            Meets | MetBy | Equals => 0,
            Before | After | StartStart | EndEnd => 1,
            Contains | During | StartsDuring | EndsDuring => 2,
        }
    }

    /// Default bounds `[0, horizon]` for each bound pair.
    pub fn default_bounds(self, horizon: i64) -> SmallVec<[Bounds; 2]> {
        (0..self.arity()).map(|_| Bounds::new(0, horizon)).collect()
    }

    /// Parses a lowercase name such as `"before"` or `"starts-during"`.
    pub fn parse(name: &str) -> Option<Self> {
        use TemporalConstraintType::*;
        let normalized = name.to_ascii_lowercase().replace(['-', ' '], "_");
        Some(match normalized.as_str() {
            "before" => Before,
            "after" => After,
            "meets" => Meets,
            "met_by" => MetBy,
            "contains" => Contains,
            "during" => During,
            "starts_during" => StartsDuring,
            "ends_during" => EndsDuring,
            "equals" => Equals,
            "start_start" => StartStart,
            "end_end" => EndEnd,
            _ => return None,
        })
    }
}

impl fmt::Display for TemporalConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TemporalConstraintType::*;
        let name = match self {
            Before => "BEFORE",
            After => "AFTER",
            Meets => "MEETS",
            MetBy => "MET-BY",
            Contains => "CONTAINS",
            During => "DURING",
            StartsDuring => "STARTS-DURING",
            EndsDuring => "ENDS-DURING",
            Equals => "EQUALS",
            StartStart => "START-START",
            EndEnd => "END-END",
        };
        f.write_str(name)
    }
}

/// Translates an interval constraint into distance edges.
///
/// # Errors
///
/// `Domain` if `bounds` does not carry exactly `kind.arity()` pairs.
pub fn translate(
    kind: TemporalConstraintType,
    reference: &TemporalInterval,
    target: &TemporalInterval,
    bounds: &[Bounds],
) -> Result<SmallVec<[Edge; 2]>> {
    use TemporalConstraintType::*;
    if bounds.len() != kind.arity() {
        return Err(TimeforgeError::Domain(format!(
            "{kind} expects {} bound pair(s), got {}",
            kind.arity(),
            bounds.len()
        )));
    }
    let (rs, re) = (reference.start, reference.end);
    let (ts, te) = (target.start, target.end);
    let zero = Bounds::point(0);
    Ok(match kind {
        Before => smallvec![Edge::new(re, ts, bounds[0])],
        After => smallvec![Edge::new(te, rs, bounds[0])],
        Meets => smallvec![Edge::new(re, ts, zero)],
        MetBy => smallvec![Edge::new(te, rs, zero)],
        Contains => smallvec![Edge::new(rs, ts, bounds[0]), Edge::new(te, re, bounds[1])],
        During => smallvec![Edge::new(ts, rs, bounds[0]), Edge::new(re, te, bounds[1])],
        StartsDuring => smallvec![Edge::new(ts, rs, bounds[0]), Edge::new(rs, te, bounds[1])],
        EndsDuring => smallvec![Edge::new(ts, re, bounds[0]), Edge::new(re, te, bounds[1])],
        Equals => smallvec![Edge::new(rs, ts, zero), Edge::new(re, te, zero)],
        StartStart => smallvec![Edge::new(rs, ts, bounds[0])],
        EndEnd => smallvec![Edge::new(re, te, bounds[0])],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IntervalId;
    use crate::network::TimePointId;

    fn interval(id: usize, start: usize, end: usize) -> TemporalInterval {
        TemporalInterval {
            id: IntervalId(id),
            start: TimePointId(start),
            end: TimePointId(end),
            duration: Bounds::new(1, 10),
            controllable: true,
        }
    }

    #[test]
    fn test_before_links_end_to_start() {
        let a = interval(0, 2, 3);
        let b = interval(1, 4, 5);
        let edges = translate(
            TemporalConstraintType::Before,
            &a,
            &b,
            &[Bounds::new(0, 50)],
        )
        .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, TimePointId(3));
        assert_eq!(edges[0].to, TimePointId(4));
        assert_eq!(edges[0].bounds, Bounds::new(0, 50));
    }

    #[test]
    fn test_contains_produces_two_edges() {
        let a = interval(0, 2, 3);
        let b = interval(1, 4, 5);
        let edges = translate(
            TemporalConstraintType::Contains,
            &a,
            &b,
            &[Bounds::new(0, 5), Bounds::new(1, 6)],
        )
        .unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].from, edges[0].to), (TimePointId(2), TimePointId(4)));
        assert_eq!((edges[1].from, edges[1].to), (TimePointId(5), TimePointId(3)));
    }

    #[test]
    fn test_wrong_arity_is_a_domain_error() {
        let a = interval(0, 2, 3);
        let b = interval(1, 4, 5);
        let err = translate(TemporalConstraintType::Meets, &a, &b, &[Bounds::new(0, 1)])
            .unwrap_err();
        assert!(matches!(err, TimeforgeError::Domain(_)));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            TemporalConstraintType::parse("starts-during"),
            Some(TemporalConstraintType::StartsDuring)
        );
        assert_eq!(
            TemporalConstraintType::parse("MET_BY"),
            Some(TemporalConstraintType::MetBy)
        );
        assert_eq!(TemporalConstraintType::parse("overlaps"), None);
    }
}
