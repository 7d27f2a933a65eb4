//! Interval-level facade over the temporal network.
//!
//! The facade owns the network and hands out interval and constraint
//! handles. Plan-level code never touches time points directly: it creates
//! intervals for decision tokens, propagates Allen constraints between
//! them, and reads back schedules through pure queries.

use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use timeforge_core::{Bounds, Result, TimeforgeError};

use crate::constraint::{translate, TemporalConstraintType};
use crate::interval::{IntervalId, IntervalSchedule, Makespan, TemporalInterval};
use crate::network::{ConstraintId, Edge, TemporalNetwork, TimePoint, TimePointId};

/// Handle of a propagated interval constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemporalConstraintHandle(pub usize);

#[derive(Debug, Clone)]
struct Propagated {
    edges: SmallVec<[ConstraintId; 2]>,
    intervals: SmallVec<[IntervalId; 2]>,
}

#[derive(Debug, Clone)]
struct IntervalSlot {
    interval: TemporalInterval,
    /// Duration edge and any start/end bound edges.
    own_edges: SmallVec<[ConstraintId; 3]>,
}

/// Temporal facade used by the plan database and the resolvers.
///
/// # Example
///
/// ```
/// use timeforge_core::Bounds;
/// use timeforge_temporal::{TemporalConstraintType, TemporalFacade};
///
/// let mut tdb = TemporalFacade::new(100);
/// let a = tdb.create_interval(Bounds::new(10, 10), true).unwrap();
/// let b = tdb.create_interval(Bounds::new(5, 20), true).unwrap();
/// assert!(tdb.can_overlap(a, b).unwrap());
///
/// let meets = tdb
///     .propagate(TemporalConstraintType::Meets, a, b, &[])
///     .unwrap();
/// assert!(!tdb.can_overlap(a, b).unwrap());
/// assert_eq!(tdb.distance(a, b).unwrap(), Bounds::point(0));
///
/// tdb.retract(meets).unwrap();
/// assert!(tdb.can_overlap(a, b).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct TemporalFacade {
    network: TemporalNetwork,
    intervals: Vec<Option<IntervalSlot>>,
    constraints: Vec<Option<Propagated>>,
}

impl TemporalFacade {
    pub fn new(horizon: i64) -> Self {
        Self {
            network: TemporalNetwork::new(horizon),
            intervals: Vec::new(),
            constraints: Vec::new(),
        }
    }

    #[inline]
    pub fn horizon(&self) -> i64 {
        self.network.horizon()
    }

    #[inline]
    pub fn network(&self) -> &TemporalNetwork {
        &self.network
    }

    /// Number of live intervals.
    pub fn interval_count(&self) -> usize {
        self.intervals.iter().flatten().count()
    }

    /// Number of live interval constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.iter().flatten().count()
    }

    /// Creates an interval with a nominal duration.
    pub fn create_interval(&mut self, duration: Bounds, controllable: bool) -> Result<IntervalId> {
        self.create_interval_with(None, None, duration, controllable)
    }

    /// Creates an interval with optional start/end windows.
    ///
    /// # Errors
    ///
    /// `InconsistentDistanceConstraint` if the windows and the duration
    /// cannot be satisfied together; nothing is left in the network.
    pub fn create_interval_with(
        &mut self,
        start: Option<Bounds>,
        end: Option<Bounds>,
        duration: Bounds,
        controllable: bool,
    ) -> Result<IntervalId> {
        let horizon = self.horizon();
        let duration = Bounds::new(duration.lb.max(0), duration.ub.min(horizon));
        if duration.is_empty() {
            return Err(TimeforgeError::InconsistentDistanceConstraint(format!(
                "interval duration {duration} is not feasible within horizon {horizon}"
            )));
        }

        let s = self.network.add_time_point()?;
        let e = match self.network.add_time_point() {
            Ok(e) => e,
            Err(err) => {
                self.network.remove_time_point(s)?;
                return Err(err);
            }
        };

        let origin = self.network.origin();
        let mut edges: SmallVec<[Edge; 3]> = smallvec![Edge {
            from: s,
            to: e,
            bounds: duration,
            controllable,
        }];
        if let Some(window) = start {
            edges.push(Edge::new(origin, s, window));
        }
        if let Some(window) = end {
            edges.push(Edge::new(origin, e, window));
        }

        let own_edges = match self.network.add_constraints(&edges) {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                self.network.remove_time_points(&[s, e])?;
                return Err(err);
            }
        };

        let id = IntervalId(self.intervals.len());
        let interval = TemporalInterval {
            id,
            start: s,
            end: e,
            duration,
            controllable,
        };
        self.intervals.push(Some(IntervalSlot {
            interval,
            own_edges,
        }));
        trace!("Created interval {} with duration {}", id, duration);
        Ok(id)
    }

    /// Deletes an interval, dropping every constraint that touches it.
    pub fn delete_interval(&mut self, id: IntervalId) -> Result<()> {
        let slot = self
            .intervals
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown interval {id}")))?;
        for entry in self.constraints.iter_mut() {
            if entry.as_ref().is_some_and(|p| p.intervals.contains(&id)) {
                *entry = None;
            }
        }
        self.network
            .remove_time_points(&[slot.interval.start, slot.interval.end])?;
        trace!("Deleted interval {}", id);
        Ok(())
    }

    pub fn interval(&self, id: IntervalId) -> Result<&TemporalInterval> {
        self.intervals
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|slot| &slot.interval)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown interval {id}")))
    }

    /// Propagates an interval constraint between two intervals.
    ///
    /// Multi-edge constraints are inserted atomically: on failure the
    /// network is left unchanged.
    pub fn propagate(
        &mut self,
        kind: TemporalConstraintType,
        reference: IntervalId,
        target: IntervalId,
        bounds: &[Bounds],
    ) -> Result<TemporalConstraintHandle> {
        let r = *self.interval(reference)?;
        let t = *self.interval(target)?;
        let edges = translate(kind, &r, &t, bounds)?;
        let handle = self.insert(&edges, smallvec![reference, target])?;
        debug!(
            "Propagated {} {} -> {} {:?}",
            kind, reference, target, bounds
        );
        Ok(handle)
    }

    /// Restricts the start of an interval to `window` (relative to origin).
    pub fn fix_start(&mut self, id: IntervalId, window: Bounds) -> Result<TemporalConstraintHandle> {
        let i = *self.interval(id)?;
        let edge = Edge::new(self.network.origin(), i.start, window);
        self.insert(&[edge], smallvec![id])
    }

    /// Restricts the end of an interval to `window` (relative to origin).
    pub fn fix_end(&mut self, id: IntervalId, window: Bounds) -> Result<TemporalConstraintHandle> {
        let i = *self.interval(id)?;
        let edge = Edge::new(self.network.origin(), i.end, window);
        self.insert(&[edge], smallvec![id])
    }

    /// Restricts the duration of an interval.
    pub fn fix_duration(
        &mut self,
        id: IntervalId,
        duration: Bounds,
    ) -> Result<TemporalConstraintHandle> {
        let i = *self.interval(id)?;
        let edge = Edge::new(i.start, i.end, duration);
        self.insert(&[edge], smallvec![id])
    }

    /// Restricts start, end and duration of an interval at once. Missing
    /// bounds are left free; the edges are inserted atomically.
    pub fn fix_window(
        &mut self,
        id: IntervalId,
        start: Option<Bounds>,
        end: Option<Bounds>,
        duration: Option<Bounds>,
    ) -> Result<TemporalConstraintHandle> {
        let i = *self.interval(id)?;
        let origin = self.network.origin();
        let edges: SmallVec<[Edge; 3]> = [
            start.map(|w| Edge::new(origin, i.start, w)),
            end.map(|w| Edge::new(origin, i.end, w)),
            duration.map(|d| Edge::new(i.start, i.end, d)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if edges.is_empty() {
            return Err(TimeforgeError::Domain(format!(
                "empty window on interval {id}"
            )));
        }
        self.insert(&edges, smallvec![id])
    }

    fn insert(
        &mut self,
        edges: &[Edge],
        intervals: SmallVec<[IntervalId; 2]>,
    ) -> Result<TemporalConstraintHandle> {
        let ids = self.network.add_constraints(edges)?;
        let handle = TemporalConstraintHandle(self.constraints.len());
        self.constraints.push(Some(Propagated {
            edges: ids,
            intervals,
        }));
        Ok(handle)
    }

    /// Retracts a previously propagated constraint.
    pub fn retract(&mut self, handle: TemporalConstraintHandle) -> Result<()> {
        let propagated = self
            .constraints
            .get_mut(handle.0)
            .and_then(Option::take)
            .ok_or_else(|| {
                TimeforgeError::Domain(format!("unknown temporal constraint {}", handle.0))
            })?;
        self.network.remove_constraints(&propagated.edges)
    }

    /// True if the constraint is still in the network.
    pub fn is_propagated(&self, handle: TemporalConstraintHandle) -> bool {
        self.constraints
            .get(handle.0)
            .is_some_and(|entry| entry.is_some())
    }

    /// Verifies the consistency of the network.
    pub fn verify(&self) -> Result<()> {
        self.network.check_consistency()
    }

    /// Contingent intervals whose propagated duration is narrower than
    /// their nominal duration.
    pub fn check_pseudo_controllability(&self) -> Vec<IntervalId> {
        let squeezed = self.network.squeezed_contingent_constraints();
        self.intervals
            .iter()
            .flatten()
            .filter(|slot| !slot.interval.controllable)
            .filter(|slot| slot.own_edges.first().is_some_and(|c| squeezed.contains(c)))
            .map(|slot| slot.interval.id)
            .collect()
    }

    /// Distance between the end of `source` and the start of `target`.
    pub fn distance(&self, source: IntervalId, target: IntervalId) -> Result<Bounds> {
        let s = self.interval(source)?;
        let t = self.interval(target)?;
        self.network.distance(s.end, t.start)
    }

    /// True if the two intervals may share some instant in a schedule.
    pub fn can_overlap(&self, a: IntervalId, b: IntervalId) -> Result<bool> {
        let ia = self.interval(a)?;
        let ib = self.interval(b)?;
        let a_before_b_end = self.network.distance(ia.start, ib.end)?.ub > 0;
        let b_before_a_end = self.network.distance(ib.start, ia.end)?.ub > 0;
        Ok(a_before_b_end && b_before_a_end)
    }

    /// Propagated start, end and duration bounds of an interval.
    pub fn schedule(&self, id: IntervalId) -> Result<IntervalSchedule> {
        let i = self.interval(id)?;
        Ok(IntervalSchedule {
            start: self.network.time_point(i.start)?.bounds(),
            end: self.network.time_point(i.end)?.bounds(),
            duration: self.network.distance(i.start, i.end)?,
        })
    }

    /// Propagated domain of a time point relative to the origin.
    pub fn time_point_distance_from_origin(&self, tp: TimePointId) -> Result<TimePoint> {
        self.network.time_point(tp)
    }

    /// Makespan over controllable intervals.
    pub fn makespan(&self) -> Makespan {
        let mut makespan = Makespan::default();
        for slot in self.intervals.iter().flatten() {
            if !slot.interval.controllable {
                continue;
            }
            if let Ok(end) = self.network.time_point(slot.interval.end) {
                makespan.min = makespan.min.max(end.lb);
                makespan.max = makespan.max.max(end.ub);
            }
        }
        makespan
    }
}

#[cfg(test)]
mod tests;
