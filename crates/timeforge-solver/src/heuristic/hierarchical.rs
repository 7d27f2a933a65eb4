//! Hierarchical flaw selection.
//!
//! Three filters run in order, each keeping the best class of the flaws
//! that survived the previous one:
//!
//! 1. component hierarchy: flaws on the most dominant components
//! 2. flaw type: scheduling conflicts, then reservoir peaks, then goals,
//!    then gaps
//! 3. goal ordering: goals that no other goal must follow

use std::collections::{BTreeMap, BTreeSet};

use timeforge_core::{ComponentId, DecisionId, Result};
use timeforge_plan::{PlanDataBase, PlanDomain};
use timeforge_temporal::TemporalConstraintType;

use super::FlawSelectionHeuristic;
use crate::flaw::{Flaw, FlawKind, FlawType};

/// Filters flaws by component hierarchy, flaw type and goal ordering.
#[derive(Debug, Clone)]
pub struct HierarchicalFlawSelection {
    hierarchy: BTreeMap<ComponentId, usize>,
}

impl HierarchicalFlawSelection {
    pub fn new(domain: &PlanDomain) -> Self {
        Self {
            hierarchy: domain.hierarchy(),
        }
    }

    fn level(&self, component: ComponentId) -> usize {
        self.hierarchy.get(&component).copied().unwrap_or(0)
    }

    fn hierarchy_filter(&self, flaws: Vec<Flaw>) -> Vec<Flaw> {
        let Some(top) = flaws.iter().map(|f| self.level(f.component)).min() else {
            return flaws;
        };
        flaws
            .into_iter()
            .filter(|f| self.level(f.component) == top)
            .collect()
    }
}

/// Rank of a flaw type; lower goes first.
pub(crate) fn type_rank(flaw_type: FlawType) -> u8 {
    match flaw_type {
        FlawType::SchedulingConflict => 0,
        FlawType::ReservoirOverflow => 1,
        FlawType::Goal => 2,
        FlawType::Gap | FlawType::SemanticConnection => 3,
    }
}

fn type_filter(flaws: Vec<Flaw>) -> Vec<Flaw> {
    let Some(best) = flaws.iter().map(|f| type_rank(f.flaw_type())).min() else {
        return flaws;
    };
    flaws
        .into_iter()
        .filter(|f| type_rank(f.flaw_type()) == best)
        .collect()
}

/// Keeps the goals at the root of the ordering graph induced by pending
/// temporal relations among them.
fn semantic_filter(flaws: Vec<Flaw>, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
    let goals: BTreeSet<DecisionId> = flaws
        .iter()
        .filter_map(|f| match f.kind {
            FlawKind::Goal { decision } => Some(decision),
            _ => None,
        })
        .collect();
    if goals.len() != flaws.len() || goals.len() < 2 {
        return Ok(flaws);
    }

    let mut followers: BTreeSet<DecisionId> = BTreeSet::new();
    for goal in &goals {
        for id in pdb.relations_of(*goal) {
            let r = pdb.relation(id)?;
            if r.is_active() || !goals.contains(&r.reference) || !goals.contains(&r.target) {
                continue;
            }
            match r.kind.temporal_kind() {
                Some(TemporalConstraintType::Before | TemporalConstraintType::Meets) => {
                    followers.insert(r.target);
                }
                Some(TemporalConstraintType::After | TemporalConstraintType::MetBy) => {
                    followers.insert(r.reference);
                }
                _ => {}
            }
        }
    }
    if followers.len() == goals.len() {
        return Ok(flaws);
    }
    Ok(flaws
        .into_iter()
        .filter(|f| match f.kind {
            FlawKind::Goal { decision } => !followers.contains(&decision),
            _ => true,
        })
        .collect())
}

impl FlawSelectionHeuristic for HierarchicalFlawSelection {
    fn select(&mut self, flaws: Vec<Flaw>, pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        let flaws = self.hierarchy_filter(flaws);
        let flaws = type_filter(flaws);
        semantic_filter(flaws, pdb)
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}
