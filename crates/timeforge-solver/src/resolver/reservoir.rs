//! Reservoir resources.
//!
//! Each direction gets its own pessimistic level profile. For underflows
//! consumptions are placed at their earliest start and productions at
//! their latest; overflows swap the roles. Necessary precedences between
//! events always hold in the profile, and unbound amounts read as the
//! smallest production and the largest consumption. Every maximal stretch
//! of a profile outside the capacity is a peak; its minimal critical sets
//! (MCS) drive two kinds of repairs:
//!
//! - scheduling: move an existing opposite event before a culprit
//! - planning: insert a new opposite event of the missing amount

use std::sync::Arc;

use tracing::trace;

use timeforge_core::{Bounds, ComponentId, DecisionId, Result, TimeforgeError, ValueId};
use timeforge_plan::{
    DecisionSpec, DecisionState, PlanDataBase, RelationKind, ResourceEffect, ResourceEvent,
};
use timeforge_temporal::TemporalConstraintType;

use super::scheduling::order;
use super::{probe, unexpected, ResolverType};
use crate::flaw::{Flaw, FlawKind, Peak, PeakDirection};
use crate::solution::{Effects, FlawSolution, SolutionKind};

/// Keeps the level of one reservoir within `[min, max]`.
#[derive(Debug, Clone)]
pub struct ReservoirResolver {
    component: ComponentId,
    min: i64,
    max: i64,
    initial: i64,
    scheduling_cost: f64,
    planning_cost: f64,
}

impl ReservoirResolver {
    pub fn new(
        component: ComponentId,
        min: i64,
        max: i64,
        initial: i64,
        scheduling_cost: f64,
        planning_cost: f64,
    ) -> Self {
        Self {
            component,
            min,
            max,
            initial,
            scheduling_cost,
            planning_cost,
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Active events in the pessimistic order of `direction`.
    ///
    /// An event is placed once every event that necessarily ends before it
    /// starts has been placed. Among the placeable events, culprits go
    /// first by earliest start, then remedies by latest start.
    pub fn profile(
        &self,
        pdb: &PlanDataBase,
        direction: PeakDirection,
    ) -> Result<Vec<ResourceEvent>> {
        let mut events = Vec::new();
        for d in pdb.decisions_in(self.component, DecisionState::Active) {
            if let Some(event) = pdb.resource_event(d)? {
                events.push((pdb.schedule(d)?.start, event));
            }
        }

        let n = events.len();
        let mut predecessors = vec![0usize; n];
        let mut successors = vec![Vec::new(); n];
        for i in 0..n {
            for j in 0..n {
                if i != j && pdb.distance(events[i].1.decision, events[j].1.decision)?.lb >= 0 {
                    predecessors[j] += 1;
                    successors[i].push(j);
                }
            }
        }

        let culprit = culprit_effect(direction);
        let mut placed = vec![false; n];
        let mut profile = Vec::with_capacity(n);
        while profile.len() < n {
            let next = (0..n)
                .filter(|&i| !placed[i] && predecessors[i] == 0)
                .min_by_key(|&i| {
                    let (start, event) = &events[i];
                    if event.effect == culprit {
                        (false, start.lb, event.decision)
                    } else {
                        (true, -start.ub, event.decision)
                    }
                })
                .or_else(|| (0..n).find(|&i| !placed[i]));
            let Some(i) = next else {
                break;
            };
            placed[i] = true;
            for &j in &successors[i] {
                predecessors[j] = predecessors[j].saturating_sub(1);
            }
            profile.push(events[i].1);
        }
        Ok(profile)
    }

    fn violation(&self, level: i64) -> Option<PeakDirection> {
        if level < self.min {
            Some(PeakDirection::Underflow)
        } else if level > self.max {
            Some(PeakDirection::Overflow)
        } else {
            None
        }
    }

    /// Every peak of both profiles, underflows first.
    pub fn find_flaws(&self, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        let mut flaws = Vec::new();
        for direction in [PeakDirection::Underflow, PeakDirection::Overflow] {
            for peak in self.peaks(self.profile(pdb, direction)?, direction) {
                trace!(
                    "Reservoir {} {:?} peak of {} event(s) from level {}",
                    self.component,
                    direction,
                    peak.critical.len(),
                    peak.start_level
                );
                flaws.push(Flaw::new(
                    pdb.ids().next_flaw(),
                    self.component,
                    FlawKind::ReservoirOverflow(peak),
                ));
            }
        }
        Ok(flaws)
    }

    /// Maximal runs of `profile` beyond the bound `direction` checks.
    fn peaks(&self, profile: Vec<ResourceEvent>, direction: PeakDirection) -> Vec<Peak> {
        let mut level = self.initial;
        let mut peaks = Vec::new();
        let mut open: Option<Peak> = None;
        for event in profile {
            let next = level + event.delta();
            if self.violation(next) != Some(direction) {
                peaks.extend(open.take());
            } else if let Some(peak) = open.as_mut() {
                peak.critical.push(event);
            } else {
                open = Some(Peak {
                    critical: vec![event],
                    start_level: level,
                    direction,
                });
            }
            level = next;
        }
        peaks.extend(open);
        peaks
    }

    /// Samples the minimal critical sets of a peak.
    ///
    /// Culprits are the consumptions of an underflow or the productions of
    /// an overflow. Each set is the shortest run of culprits, accumulated
    /// from the peak's start level, that leaves the capacity; a single
    /// culprit can form a set on its own. If no run does, all culprits
    /// form one set.
    pub fn minimal_critical_sets(&self, peak: &Peak) -> Vec<Vec<ResourceEvent>> {
        let culprit = culprit_effect(peak.direction);
        let culprits: Vec<ResourceEvent> = peak
            .critical
            .iter()
            .filter(|e| e.effect == culprit)
            .copied()
            .collect();
        let mut sets = Vec::new();
        for first in 0..culprits.len() {
            let mut level = peak.start_level;
            for last in first..culprits.len() {
                level += culprits[last].delta();
                if self.violation(level) == Some(peak.direction) {
                    sets.push(culprits[first..=last].to_vec());
                    break;
                }
            }
        }
        if sets.is_empty() && !culprits.is_empty() {
            sets.push(culprits);
        }
        sets
    }

    /// Amount missing to bring the level of a critical set back within
    /// capacity; at least 1.
    fn deficit(&self, peak: &Peak, set: &[ResourceEvent]) -> i64 {
        let level = peak.start_level + set.iter().map(ResourceEvent::delta).sum::<i64>();
        let missing = match peak.direction {
            PeakDirection::Underflow => self.min - level,
            PeakDirection::Overflow => level - self.max,
        };
        missing.max(1)
    }

    pub fn compute_solutions(&self, pdb: &mut PlanDataBase, flaw: &Flaw) -> Result<Vec<FlawSolution>> {
        let FlawKind::ReservoirOverflow(peak) = &flaw.kind else {
            return Err(TimeforgeError::Domain(format!(
                "reservoir resolver cannot solve {flaw}"
            )));
        };
        let profile = self.profile(pdb, peak.direction)?;
        let sets = self.minimal_critical_sets(peak);

        let mut best: Option<(f64, Vec<FlawSolution>)> = None;
        for set in &sets {
            let candidates = self.scheduling_solutions(pdb, flaw, peak, set, &profile)?;
            if candidates.is_empty() {
                continue;
            }
            let average =
                candidates.iter().map(preserved_of).sum::<f64>() / candidates.len() as f64;
            if best.as_ref().map_or(true, |(score, _)| average > *score) {
                best = Some((average, candidates));
            }
        }
        let mut solutions = best.map(|(_, s)| s).unwrap_or_default();
        solutions.sort_by(|a, b| preserved_of(b).total_cmp(&preserved_of(a)));

        for set in &sets {
            let planned = self.planning_solutions(pdb, flaw, peak, set)?;
            if !planned.is_empty() {
                solutions.extend(planned);
                break;
            }
        }
        Ok(solutions)
    }

    fn scheduling_solutions(
        &self,
        pdb: &mut PlanDataBase,
        flaw: &Flaw,
        peak: &Peak,
        set: &[ResourceEvent],
        profile: &[ResourceEvent],
    ) -> Result<Vec<FlawSolution>> {
        let remedy = remedy_effect(peak.direction);
        let mut solutions = Vec::new();
        for culprit in set {
            let Some(position) = profile.iter().position(|e| e.decision == culprit.decision) else {
                continue;
            };
            for event in &profile[position + 1..] {
                // Any positive amount helps; what it leaves uncovered shows up
                // as a smaller peak.
                if event.effect != remedy || event.amount <= 0 {
                    continue;
                }
                let preserved = preserved_space(
                    pdb.schedule(event.decision)?.end,
                    pdb.schedule(culprit.decision)?.start,
                );
                let kind = SolutionKind::ResourceScheduling {
                    precedences: vec![(event.decision, culprit.decision)],
                    preserved,
                };
                let Some(makespan) = probe(pdb, |pdb, effects| apply(pdb, &kind, effects))? else {
                    continue;
                };
                solutions.push(FlawSolution {
                    id: pdb.ids().next_solution(),
                    flaw: flaw.id,
                    flaw_type: flaw.flaw_type(),
                    component: self.component,
                    kind,
                    cost: self.scheduling_cost,
                    makespan: Some(makespan),
                });
            }
        }
        Ok(solutions)
    }

    fn planning_solutions(
        &self,
        pdb: &mut PlanDataBase,
        flaw: &Flaw,
        peak: &Peak,
        set: &[ResourceEvent],
    ) -> Result<Vec<FlawSolution>> {
        let value = self.remedy_value(pdb, peak.direction)?;
        let amount = self.deficit(peak, set);
        let mut solutions = Vec::new();
        for head in set {
            let before: Vec<DecisionId> = set
                .iter()
                .filter(|e| e.decision != head.decision)
                .map(|e| e.decision)
                .collect();
            let kind = SolutionKind::ResourcePlanning {
                value,
                amount,
                before,
                head: head.decision,
            };
            let Some(makespan) = probe(pdb, |pdb, effects| apply(pdb, &kind, effects))? else {
                continue;
            };
            solutions.push(FlawSolution {
                id: pdb.ids().next_solution(),
                flaw: flaw.id,
                flaw_type: flaw.flaw_type(),
                component: self.component,
                kind,
                cost: self.planning_cost,
                makespan: Some(makespan),
            });
        }
        Ok(solutions)
    }

    fn remedy_value(&self, pdb: &PlanDataBase, direction: PeakDirection) -> Result<ValueId> {
        let domain = Arc::clone(pdb.domain());
        let remedy = remedy_effect(direction);
        for value in &domain.component(self.component)?.values {
            if domain.value(*value)?.effect == Some(remedy) {
                return Ok(*value);
            }
        }
        Err(TimeforgeError::Domain(format!(
            "reservoir {} has no {remedy:?} value",
            self.component
        )))
    }
}

fn culprit_effect(direction: PeakDirection) -> ResourceEffect {
    match direction {
        PeakDirection::Underflow => ResourceEffect::Consumption,
        PeakDirection::Overflow => ResourceEffect::Production,
    }
}

fn remedy_effect(direction: PeakDirection) -> ResourceEffect {
    match direction {
        PeakDirection::Underflow => ResourceEffect::Production,
        PeakDirection::Overflow => ResourceEffect::Consumption,
    }
}

fn preserved_of(solution: &FlawSolution) -> f64 {
    match solution.kind {
        SolutionKind::ResourceScheduling { preserved, .. } => preserved,
        _ => 0.0,
    }
}

/// Fraction of the pairs `(x, y)` in `tp1 x tp2` satisfying `x <= y`.
///
/// Measures how much temporal freedom the precedence `tp1 <= tp2` keeps;
/// 1 when it is already entailed, 0 when it is infeasible.
pub fn preserved_space(tp1: Bounds, tp2: Bounds) -> f64 {
    let (x_min, x_max) = (tp1.lb as f64, tp1.ub as f64);
    let (y_min, y_max) = (tp2.lb as f64, tp2.ub as f64);
    let total = (y_max - y_min + 1.0) * (x_max - x_min + 1.0);
    if total <= 0.0 {
        return 0.0;
    }
    // Pairs x <= y of the triangle [x_min, y_max], minus those with
    // y < y_min or x > x_max, plus those counted twice.
    let triangle = |n: f64| if n > 0.0 { n * (n + 1.0) / 2.0 } else { 0.0 };
    let kept = triangle(y_max - x_min + 1.0)
        - triangle(y_min - x_min)
        - triangle(y_max - x_max)
        + triangle(y_min - x_max - 1.0);
    (kept / total).clamp(0.0, 1.0)
}

pub(super) fn apply(pdb: &mut PlanDataBase, kind: &SolutionKind, effects: &mut Effects) -> Result<()> {
    match kind {
        SolutionKind::ResourceScheduling { precedences, .. } => {
            for (reference, target) in precedences {
                order(pdb, *reference, *target, effects)?;
            }
            Ok(())
        }
        SolutionKind::ResourcePlanning {
            value,
            amount,
            before,
            head,
        } => {
            let event = effects.create(pdb, DecisionSpec::new(*value))?;
            effects.relate(pdb, event, event, RelationKind::bind(0, amount.to_string()))?;
            let bounds = TemporalConstraintType::Before
                .default_bounds(pdb.horizon())
                .into_vec();
            for other in before {
                effects.relate(
                    pdb,
                    *other,
                    event,
                    RelationKind::temporal(TemporalConstraintType::Before, bounds.clone()),
                )?;
            }
            effects.relate(
                pdb,
                event,
                *head,
                RelationKind::temporal(TemporalConstraintType::Before, bounds),
            )?;
            effects.activate(pdb, event)
        }
        _ => Err(unexpected(ResolverType::Reservoir, kind)),
    }
}
