//! Simple temporal network with uncertainty.
//!
//! The network keeps an all-pairs shortest path matrix over its time
//! points. `dist[i][j]` is the tightest known upper bound of `t_j - t_i`;
//! time point bounds and pairwise distances are read directly from it.
//!
//! - Insertions tighten the matrix incrementally in `O(n^2)` per edge.
//! - Removals rebuild it with Floyd–Warshall, so an undo is always exact.
//! - An insertion closing a negative cycle is rejected and the matrix is
//!   restored, leaving the network unchanged.

use std::fmt;

use smallvec::SmallVec;
use tracing::trace;

use timeforge_core::{Bounds, Result, TimeforgeError};

/// Sentinel for "no path".
pub(crate) const INF: i64 = i64::MAX / 4;

/// Handle of a time point. Slots are recycled after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointId(pub usize);

impl fmt::Display for TimePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tp{}", self.0)
    }
}

/// Handle of a distance constraint. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub usize);

/// Snapshot of a time point's propagated domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePoint {
    pub id: TimePointId,
    pub lb: i64,
    pub ub: i64,
}

impl TimePoint {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lb, self.ub)
    }
}

/// Directed distance edge `to - from in [dmin, dmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceConstraint {
    pub id: ConstraintId,
    pub from: TimePointId,
    pub to: TimePointId,
    pub bounds: Bounds,
    /// `false` marks a contingent link whose actual duration is chosen by
    /// the environment.
    pub controllable: bool,
}

/// A constraint not yet inserted in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: TimePointId,
    pub to: TimePointId,
    pub bounds: Bounds,
    pub controllable: bool,
}

impl Edge {
    pub fn new(from: TimePointId, to: TimePointId, bounds: Bounds) -> Self {
        Self {
            from,
            to,
            bounds,
            controllable: true,
        }
    }

    pub fn contingent(from: TimePointId, to: TimePointId, bounds: Bounds) -> Self {
        Self {
            from,
            to,
            bounds,
            controllable: false,
        }
    }
}

/// The temporal network.
///
/// Two time points always exist: the origin (fixed at 0) and the horizon
/// (fixed at `horizon`). Every other time point is confined to
/// `[0, horizon]`.
///
/// # Example
///
/// ```
/// use timeforge_core::Bounds;
/// use timeforge_temporal::TemporalNetwork;
///
/// let mut tn = TemporalNetwork::new(100);
/// let a = tn.add_time_point().unwrap();
/// let b = tn.add_time_point_with_bounds(10, 50).unwrap();
/// tn.add_constraint(a, b, Bounds::new(5, 5), true).unwrap();
///
/// assert_eq!(tn.time_point(a).unwrap().bounds(), Bounds::new(5, 45));
///
/// // a negative cycle is rejected and nothing changes
/// assert!(tn.add_constraint(b, a, Bounds::new(1, 2), true).is_err());
/// assert_eq!(tn.time_point(a).unwrap().bounds(), Bounds::new(5, 45));
/// ```
#[derive(Debug, Clone)]
pub struct TemporalNetwork {
    horizon: i64,
    alive: Vec<bool>,
    free_slots: Vec<usize>,
    constraints: Vec<Option<DistanceConstraint>>,
    dist: Vec<Vec<i64>>,
}

impl TemporalNetwork {
    /// Creates a network with origin and horizon time points.
    pub fn new(horizon: i64) -> Self {
        let horizon = horizon.max(0);
        let mut dist = vec![vec![INF; 2]; 2];
        dist[0][0] = 0;
        dist[1][1] = 0;
        dist[0][1] = horizon;
        dist[1][0] = -horizon;
        Self {
            horizon,
            alive: vec![true, true],
            free_slots: Vec::new(),
            constraints: Vec::new(),
            dist,
        }
    }

    #[inline]
    pub fn origin(&self) -> TimePointId {
        TimePointId(0)
    }

    #[inline]
    pub fn horizon_point(&self) -> TimePointId {
        TimePointId(1)
    }

    #[inline]
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// Number of live time points, origin and horizon included.
    pub fn time_point_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Number of live distance constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.iter().flatten().count()
    }

    pub fn contains(&self, tp: TimePointId) -> bool {
        self.alive.get(tp.0).copied().unwrap_or(false)
    }

    /// Adds a free time point with domain `[0, horizon]`.
    pub fn add_time_point(&mut self) -> Result<TimePointId> {
        let id = match self.free_slots.pop() {
            Some(slot) => {
                self.alive[slot] = true;
                TimePointId(slot)
            }
            None => {
                let slot = self.alive.len();
                self.alive.push(true);
                for row in &mut self.dist {
                    row.push(INF);
                }
                self.dist.push(vec![INF; slot + 1]);
                TimePointId(slot)
            }
        };

        // the only edges touching the new point go through the origin
        let n = self.dist.len();
        let k = id.0;
        for i in 0..n {
            self.dist[i][k] = INF;
            self.dist[k][i] = INF;
        }
        for i in 0..n {
            if i == k || !self.alive[i] {
                continue;
            }
            let to_origin = self.dist[i][0];
            if to_origin < INF {
                self.dist[i][k] = to_origin + self.horizon;
            }
            self.dist[k][i] = self.dist[0][i];
        }
        self.dist[k][k] = 0;
        self.dist[0][k] = self.horizon;
        self.dist[k][0] = 0;

        trace!("Added time point {}", id);
        Ok(id)
    }

    /// Adds a time point fixed at `at`.
    pub fn add_time_point_at(&mut self, at: i64) -> Result<TimePointId> {
        self.add_time_point_with_bounds(at, at)
    }

    /// Adds a time point with domain `[lb, ub]`.
    ///
    /// # Errors
    ///
    /// `InconsistentDistanceConstraint` if the bounds are empty or fall
    /// outside `[0, horizon]`; the network is left unchanged.
    pub fn add_time_point_with_bounds(&mut self, lb: i64, ub: i64) -> Result<TimePointId> {
        if lb > ub || lb < 0 || ub > self.horizon {
            return Err(TimeforgeError::InconsistentDistanceConstraint(format!(
                "time point bounds [{lb}, {ub}] are not feasible within [0, {}]",
                self.horizon
            )));
        }
        let tp = self.add_time_point()?;
        if let Err(err) = self.add_constraint(self.origin(), tp, Bounds::new(lb, ub), true) {
            self.release_slot(tp);
            return Err(err);
        }
        Ok(tp)
    }

    /// Removes a time point and every constraint touching it.
    pub fn remove_time_point(&mut self, tp: TimePointId) -> Result<()> {
        self.remove_time_points(&[tp])
    }

    /// Removes several time points with a single rebuild.
    pub fn remove_time_points(&mut self, tps: &[TimePointId]) -> Result<()> {
        for tp in tps {
            if *tp == self.origin() || *tp == self.horizon_point() {
                return Err(TimeforgeError::Domain(
                    "origin and horizon cannot be removed".to_string(),
                ));
            }
            if !self.contains(*tp) {
                return Err(TimeforgeError::Domain(format!("unknown time point {tp}")));
            }
        }
        for slot in self.constraints.iter_mut() {
            if slot.is_some_and(|c| tps.contains(&c.from) || tps.contains(&c.to)) {
                *slot = None;
            }
        }
        for tp in tps {
            self.release_slot(*tp);
            trace!("Removed time point {}", tp);
        }
        self.dist = self.compute_distances();
        Ok(())
    }

    fn release_slot(&mut self, tp: TimePointId) {
        let k = tp.0;
        self.alive[k] = false;
        for i in 0..self.dist.len() {
            self.dist[i][k] = INF;
            self.dist[k][i] = INF;
        }
        self.dist[k][k] = 0;
        self.free_slots.push(k);
    }

    /// Inserts a single distance constraint.
    pub fn add_constraint(
        &mut self,
        from: TimePointId,
        to: TimePointId,
        bounds: Bounds,
        controllable: bool,
    ) -> Result<ConstraintId> {
        let edge = Edge {
            from,
            to,
            bounds,
            controllable,
        };
        let ids = self.add_constraints(&[edge])?;
        Ok(ids[0])
    }

    /// Inserts a group of constraints atomically.
    ///
    /// Either every edge is inserted and propagated, or the call fails with
    /// `InconsistentDistanceConstraint` and the network is left unchanged.
    pub fn add_constraints(&mut self, edges: &[Edge]) -> Result<SmallVec<[ConstraintId; 2]>> {
        for edge in edges {
            if !self.contains(edge.from) || !self.contains(edge.to) {
                return Err(TimeforgeError::Domain(format!(
                    "constraint {} -> {} refers to an unknown time point",
                    edge.from, edge.to
                )));
            }
            if edge.bounds.is_empty() {
                return Err(TimeforgeError::InconsistentDistanceConstraint(format!(
                    "empty distance bounds {} on {} -> {}",
                    edge.bounds, edge.from, edge.to
                )));
            }
        }

        let snapshot = self.dist.clone();
        let mut ids = SmallVec::new();
        for edge in edges {
            if let Err(err) = self.tighten(edge) {
                self.dist = snapshot;
                return Err(err);
            }
        }
        for edge in edges {
            let id = ConstraintId(self.constraints.len());
            self.constraints.push(Some(DistanceConstraint {
                id,
                from: edge.from,
                to: edge.to,
                bounds: edge.bounds,
                controllable: edge.controllable,
            }));
            ids.push(id);
        }
        Ok(ids)
    }

    fn tighten(&mut self, edge: &Edge) -> Result<()> {
        let (u, v) = (edge.from.0, edge.to.0);
        // t_v - t_u <= dmax closes a negative cycle iff dist[v][u] + dmax < 0
        if self.dist[v][u] < INF && self.dist[v][u].saturating_add(edge.bounds.ub) < 0 {
            return Err(TimeforgeError::InconsistentDistanceConstraint(format!(
                "{} -> {} {} conflicts with propagated lower distance {}",
                edge.from, edge.to, edge.bounds, -self.dist[v][u]
            )));
        }
        // t_u - t_v <= -dmin closes a negative cycle iff dist[u][v] - dmin < 0
        if self.dist[u][v] < INF && self.dist[u][v].saturating_sub(edge.bounds.lb) < 0 {
            return Err(TimeforgeError::InconsistentDistanceConstraint(format!(
                "{} -> {} {} conflicts with propagated upper distance {}",
                edge.from, edge.to, edge.bounds, self.dist[u][v]
            )));
        }
        self.relax(u, v, edge.bounds.ub);
        self.relax(v, u, edge.bounds.lb.saturating_neg());
        Ok(())
    }

    fn relax(&mut self, u: usize, v: usize, w: i64) {
        if w >= INF || self.dist[u][v] <= w {
            return;
        }
        let n = self.dist.len();
        let into_u: Vec<i64> = (0..n).map(|i| self.dist[i][u]).collect();
        let from_v = self.dist[v].clone();
        for i in 0..n {
            if !self.alive[i] || into_u[i] >= INF {
                continue;
            }
            let through = into_u[i] + w;
            let row = &mut self.dist[i];
            for j in 0..n {
                if !self.alive[j] || from_v[j] >= INF {
                    continue;
                }
                let candidate = through + from_v[j];
                if candidate < row[j] {
                    row[j] = candidate;
                }
            }
        }
    }

    /// Removes a constraint and restores the bounds it had tightened.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<DistanceConstraint> {
        let slot = self
            .constraints
            .get_mut(id.0)
            .ok_or_else(|| TimeforgeError::Domain(format!("unknown constraint {}", id.0)))?;
        let removed = slot
            .take()
            .ok_or_else(|| TimeforgeError::Domain(format!("constraint {} already removed", id.0)))?;
        self.dist = self.compute_distances();
        Ok(removed)
    }

    /// Removes a group of constraints with a single rebuild.
    pub fn remove_constraints(&mut self, ids: &[ConstraintId]) -> Result<()> {
        for id in ids {
            if self.constraint(*id).is_none() {
                return Err(TimeforgeError::Domain(format!(
                    "unknown constraint {}",
                    id.0
                )));
            }
        }
        for id in ids {
            self.constraints[id.0] = None;
        }
        self.dist = self.compute_distances();
        Ok(())
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&DistanceConstraint> {
        self.constraints.get(id.0).and_then(Option::as_ref)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &DistanceConstraint> {
        self.constraints.iter().flatten()
    }

    /// Propagated domain of a time point.
    pub fn time_point(&self, tp: TimePointId) -> Result<TimePoint> {
        if !self.contains(tp) {
            return Err(TimeforgeError::Domain(format!("unknown time point {tp}")));
        }
        Ok(TimePoint {
            id: tp,
            lb: -self.dist[tp.0][0],
            ub: self.dist[0][tp.0],
        })
    }

    /// Bounds of `t_to - t_from` implied by the network.
    pub fn distance(&self, from: TimePointId, to: TimePointId) -> Result<Bounds> {
        if !self.contains(from) || !self.contains(to) {
            return Err(TimeforgeError::Domain(format!(
                "distance query on unknown time point {from} or {to}"
            )));
        }
        let ub = self.dist[from.0][to.0];
        let back = self.dist[to.0][from.0];
        Ok(Bounds::new(
            if back >= INF { -INF } else { -back },
            ub,
        ))
    }

    /// Verifies that no negative cycle exists.
    pub fn check_consistency(&self) -> Result<()> {
        for (i, alive) in self.alive.iter().enumerate() {
            if *alive && self.dist[i][i] < 0 {
                return Err(TimeforgeError::ConsistencyCheck(format!(
                    "negative cycle through tp{i}"
                )));
            }
        }
        Ok(())
    }

    /// Rebuilds the distance matrix from scratch and compares it with the
    /// incrementally maintained one.
    pub fn audit(&self) -> Result<()> {
        let fresh = self.compute_distances();
        for (i, alive) in self.alive.iter().enumerate() {
            if !*alive {
                continue;
            }
            if fresh[i][i] < 0 {
                return Err(TimeforgeError::ConsistencyCheck(format!(
                    "negative cycle through tp{i}"
                )));
            }
            for (j, other) in self.alive.iter().enumerate() {
                if *other && fresh[i][j] != self.dist[i][j] {
                    return Err(TimeforgeError::ConsistencyCheck(format!(
                        "distance tp{i} -> tp{j} is {} but recomputation gives {}",
                        self.dist[i][j], fresh[i][j]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Contingent constraints whose propagated distance is narrower than
    /// their nominal bounds.
    pub fn squeezed_contingent_constraints(&self) -> Vec<ConstraintId> {
        self.constraints()
            .filter(|c| !c.controllable)
            .filter(|c| {
                let propagated =
                    Bounds::new(-self.dist[c.to.0][c.from.0], self.dist[c.from.0][c.to.0]);
                propagated.lb > c.bounds.lb || propagated.ub < c.bounds.ub
            })
            .map(|c| c.id)
            .collect()
    }

    /// Floyd–Warshall over the implicit domain edges and every live
    /// constraint.
    fn compute_distances(&self) -> Vec<Vec<i64>> {
        let n = self.alive.len();
        let mut d = vec![vec![INF; n]; n];
        let update = |d: &mut Vec<Vec<i64>>, i: usize, j: usize, w: i64| {
            if w < d[i][j] {
                d[i][j] = w;
            }
        };
        for i in 0..n {
            d[i][i] = 0;
        }
        update(&mut d, 0, 1, self.horizon);
        update(&mut d, 1, 0, -self.horizon);
        for k in 2..n {
            if self.alive[k] {
                update(&mut d, 0, k, self.horizon);
                update(&mut d, k, 0, 0);
            }
        }
        for c in self.constraints() {
            update(&mut d, c.from.0, c.to.0, c.bounds.ub);
            update(&mut d, c.to.0, c.from.0, c.bounds.lb.saturating_neg());
        }
        for k in 0..n {
            if !self.alive[k] {
                continue;
            }
            for i in 0..n {
                if !self.alive[i] || d[i][k] >= INF {
                    continue;
                }
                for j in 0..n {
                    if !self.alive[j] || d[k][j] >= INF {
                        continue;
                    }
                    let through = d[i][k] + d[k][j];
                    if through < d[i][j] {
                        d[i][j] = through;
                    }
                }
            }
        }
        d
    }
}

#[cfg(test)]
mod tests;
