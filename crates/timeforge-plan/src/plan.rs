//! Solution plan snapshot.

use std::fmt;

use serde::Serialize;

use timeforge_core::{Bounds, DecisionId, RelationId};

/// A scheduled token of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanToken {
    pub decision: DecisionId,
    pub value: String,
    pub start: Bounds,
    pub end: Bounds,
    pub duration: Bounds,
    /// Rendered parameter values, one per placeholder.
    pub parameters: Vec<String>,
}

/// Tokens of one component ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanTimeline {
    pub component: String,
    pub kind: String,
    pub tokens: Vec<PlanToken>,
}

/// An active relation of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRelation {
    pub id: RelationId,
    pub reference: DecisionId,
    pub target: DecisionId,
    pub description: String,
}

/// Snapshot of the plan database produced on search success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionPlan {
    pub horizon: i64,
    pub timelines: Vec<PlanTimeline>,
    pub relations: Vec<PlanRelation>,
    /// Makespan over controllable tokens: `[min, max]` end time.
    pub makespan: Bounds,
}

impl SolutionPlan {
    pub fn token_count(&self) -> usize {
        self.timelines.iter().map(|t| t.tokens.len()).sum()
    }

    pub fn timeline(&self, component: &str) -> Option<&PlanTimeline> {
        self.timelines.iter().find(|t| t.component == component)
    }
}

impl fmt::Display for SolutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "plan: horizon={} makespan={} tokens={} relations={}",
            self.horizon,
            self.makespan,
            self.token_count(),
            self.relations.len()
        )?;
        for timeline in &self.timelines {
            writeln!(f, "  {} ({})", timeline.component, timeline.kind)?;
            for token in &timeline.tokens {
                write!(
                    f,
                    "    {} {} start={} end={} duration={}",
                    token.decision, token.value, token.start, token.end, token.duration
                )?;
                if !token.parameters.is_empty() {
                    write!(f, " params=({})", token.parameters.join(", "))?;
                }
                writeln!(f)?;
            }
        }
        for relation in &self.relations {
            writeln!(
                f,
                "  {} {} -> {} {}",
                relation.id, relation.reference, relation.target, relation.description
            )?;
        }
        Ok(())
    }
}
