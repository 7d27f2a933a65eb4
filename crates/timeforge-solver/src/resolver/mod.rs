//! Flaw resolvers.
//!
//! Each resolver owns one concern of plan validity. Detection is a pure
//! read of the plan database; candidate repairs are checked by probing
//! (apply, verify, roll back) before they are offered to the search.

mod gap;
mod refinement;
mod reservoir;
mod scheduling;

use std::fmt;

use tracing::{debug, trace};

use timeforge_config::CostConfig;
use timeforge_core::{ComponentId, Result, TimeforgeError};
use timeforge_plan::{ComponentKind, PlanDataBase, PlanDomain};

use crate::flaw::Flaw;
use crate::solution::{Effects, FlawSolution};

pub use gap::GapResolver;
pub use refinement::PlanRefinementResolver;
pub use reservoir::{preserved_space, ReservoirResolver};
pub use scheduling::SchedulingResolver;

/// Kinds of resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverType {
    Gap,
    Scheduling,
    Reservoir,
    PlanRefinement,
}

impl fmt::Display for ResolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolverType::Gap => "gap",
            ResolverType::Scheduling => "scheduling",
            ResolverType::Reservoir => "reservoir",
            ResolverType::PlanRefinement => "plan-refinement",
        };
        f.write_str(name)
    }
}

/// A flaw resolver, dispatched by match.
#[derive(Debug, Clone)]
pub enum Resolver {
    Gap(GapResolver),
    Scheduling(SchedulingResolver),
    Reservoir(ReservoirResolver),
    PlanRefinement(PlanRefinementResolver),
}

impl Resolver {
    /// Builds the resolvers of a domain: timeline resolvers per component,
    /// plus one plan refinement resolver.
    ///
    /// External state variables get no gap resolver: their timelines are
    /// observed, not completed.
    pub fn for_domain(domain: &PlanDomain, costs: &CostConfig) -> Vec<Resolver> {
        let mut resolvers = Vec::new();
        for component in domain.components() {
            match component.kind {
                ComponentKind::StateVariable { external } => {
                    if !external {
                        resolvers.push(Resolver::Gap(GapResolver::new(
                            component.id,
                            costs.completion_cost,
                        )));
                    }
                    resolvers.push(Resolver::Scheduling(SchedulingResolver::new(
                        component.id,
                        costs.scheduling_cost,
                    )));
                }
                ComponentKind::UnaryResource => {
                    resolvers.push(Resolver::Scheduling(SchedulingResolver::new(
                        component.id,
                        costs.scheduling_cost,
                    )));
                }
                ComponentKind::Reservoir { min, max, initial } => {
                    resolvers.push(Resolver::Reservoir(ReservoirResolver::new(
                        component.id,
                        min,
                        max,
                        initial,
                        costs.scheduling_cost,
                        costs.planning_cost,
                    )));
                }
            }
        }
        resolvers.push(Resolver::PlanRefinement(PlanRefinementResolver::new(
            costs.expansion_cost,
            costs.unification_cost,
        )));
        debug!("Built {} resolvers for domain {}", resolvers.len(), domain.name());
        resolvers
    }

    pub fn resolver_type(&self) -> ResolverType {
        match self {
            Resolver::Gap(_) => ResolverType::Gap,
            Resolver::Scheduling(_) => ResolverType::Scheduling,
            Resolver::Reservoir(_) => ResolverType::Reservoir,
            Resolver::PlanRefinement(_) => ResolverType::PlanRefinement,
        }
    }

    /// Component the resolver watches; `None` for plan refinement.
    pub fn component(&self) -> Option<ComponentId> {
        match self {
            Resolver::Gap(r) => Some(r.component()),
            Resolver::Scheduling(r) => Some(r.component()),
            Resolver::Reservoir(r) => Some(r.component()),
            Resolver::PlanRefinement(_) => None,
        }
    }

    /// Detects the flaws of the current plan. Never mutates it.
    pub fn find_flaws(&self, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        match self {
            Resolver::Gap(r) => r.find_flaws(pdb),
            Resolver::Scheduling(r) => r.find_flaws(pdb),
            Resolver::Reservoir(r) => r.find_flaws(pdb),
            Resolver::PlanRefinement(r) => r.find_flaws(pdb),
        }
    }

    /// Fills `flaw.solutions` with the feasible repairs.
    ///
    /// # Errors
    ///
    /// `UnsolvableFlaw` if no repair survives probing.
    pub fn compute_solutions(&self, pdb: &mut PlanDataBase, flaw: &mut Flaw) -> Result<()> {
        let solutions = match self {
            Resolver::Gap(r) => r.compute_solutions(pdb, flaw)?,
            Resolver::Scheduling(r) => r.compute_solutions(pdb, flaw)?,
            Resolver::Reservoir(r) => r.compute_solutions(pdb, flaw)?,
            Resolver::PlanRefinement(r) => r.compute_solutions(pdb, flaw)?,
        };
        trace!("{} has {} solution(s)", flaw, solutions.len());
        flaw.solutions = solutions;
        if flaw.solutions.is_empty() {
            return Err(TimeforgeError::UnsolvableFlaw(flaw.to_string()));
        }
        Ok(())
    }

    /// Commits a solution. On failure the plan database is left as before
    /// the call.
    pub fn apply(&self, pdb: &mut PlanDataBase, solution: &FlawSolution) -> Result<Effects> {
        let effects = pdb.transaction(|pdb| {
            let mut effects = Effects::default();
            self.apply_into(pdb, solution, &mut effects)?;
            Ok(effects)
        });
        let mut effects = effects?;
        effects.mark_applied();
        debug!("Applied {}", solution);
        Ok(effects)
    }

    /// Undoes an applied solution.
    pub fn retract(&self, pdb: &mut PlanDataBase, effects: &mut Effects) -> Result<()> {
        effects.retract(pdb)
    }

    /// Replays a retracted solution.
    pub fn restore(&self, pdb: &mut PlanDataBase, effects: &mut Effects) -> Result<()> {
        effects.restore(pdb)
    }

    fn apply_into(
        &self,
        pdb: &mut PlanDataBase,
        solution: &FlawSolution,
        effects: &mut Effects,
    ) -> Result<()> {
        match self {
            Resolver::Gap(_) => gap::apply(pdb, &solution.kind, effects),
            Resolver::Scheduling(_) => scheduling::apply(pdb, &solution.kind, effects),
            Resolver::Reservoir(_) => reservoir::apply(pdb, &solution.kind, effects),
            Resolver::PlanRefinement(_) => refinement::apply(pdb, &solution.kind, effects),
        }
    }
}

/// Applies a candidate inside a probe and verifies the plan.
///
/// Returns the makespan reached by the candidate, or `None` if it does not
/// propagate. The plan database is always left unchanged.
pub(crate) fn probe<F>(pdb: &mut PlanDataBase, apply: F) -> Result<Option<i64>>
where
    F: FnOnce(&mut PlanDataBase, &mut Effects) -> Result<()>,
{
    let outcome = pdb.probe(|pdb| {
        let mut effects = Effects::default();
        apply(pdb, &mut effects)?;
        pdb.verify()?;
        Ok(pdb.makespan().min)
    });
    match outcome {
        Ok(makespan) => Ok(Some(makespan)),
        Err(e) if e.is_propagation_failure() => {
            trace!("Probe rejected: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn unexpected(resolver: ResolverType, kind: &crate::solution::SolutionKind) -> TimeforgeError {
    TimeforgeError::Domain(format!("{resolver} resolver cannot apply \"{kind}\""))
}

#[cfg(test)]
mod tests;
