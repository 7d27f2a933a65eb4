//! Unary resource fixtures.

use std::sync::Arc;

use timeforge_core::{Bounds, ComponentId, Result, ValueId};
use timeforge_plan::{PlanDomain, Problem, ProblemDecision};

/// A drill usable by one activity at a time.
#[derive(Debug, Clone)]
pub struct DrillDomain {
    pub domain: Arc<PlanDomain>,
    pub drill: ComponentId,
    pub drilling: ValueId,
}

impl DrillDomain {
    pub fn new() -> Result<Self> {
        let mut domain = PlanDomain::new("drill");
        let drill = domain.add_unary_resource("drill");
        let drilling = domain.add_value(drill, "Drilling", Bounds::new(10, 10), true)?;
        Ok(Self {
            domain: Arc::new(domain),
            drill,
            drilling,
        })
    }

    /// Two drilling activities with the same flexible start window.
    pub fn overlapping_problem(&self) -> Problem {
        let mut problem = Problem::new();
        for key in ["first", "second"] {
            problem.add_fact(
                ProblemDecision::new(key, self.drilling).with_start(Bounds::new(0, 50)),
            );
        }
        problem
    }

    /// A fixed drilling at time 0 and a goal drilling requested at time 5:
    /// the two can be neither unified nor ordered.
    pub fn conflicting_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(ProblemDecision::new("fixed", self.drilling).with_start(Bounds::point(0)))
            .add_goal(ProblemDecision::new("late", self.drilling).with_start(Bounds::point(5)));
        problem
    }
}
