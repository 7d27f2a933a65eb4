//! Reservoir fixtures.

use std::sync::Arc;

use timeforge_core::{Bounds, ComponentId, Result, ValueId};
use timeforge_plan::{PlanDomain, Problem, ProblemDecision};

/// A battery with capacity `[0, 100]` and initial level 10.
#[derive(Debug, Clone)]
pub struct BatteryDomain {
    pub domain: Arc<PlanDomain>,
    pub battery: ComponentId,
    pub produce: ValueId,
    pub consume: ValueId,
}

impl BatteryDomain {
    pub fn new() -> Result<Self> {
        let mut domain = PlanDomain::new("power");
        let battery = domain.add_reservoir("battery", 0, 100, 10)?;
        let produce = domain.value_by_label(battery, "produce")?.id;
        let consume = domain.value_by_label(battery, "consume")?.id;
        Ok(Self {
            domain: Arc::new(domain),
            battery,
            produce,
            consume,
        })
    }

    /// A single consumption of 15 at time 20.
    pub fn over_consumption_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(ProblemDecision::new("drain", self.consume).with_start(Bounds::point(20)))
            .bind("drain", 0, "15");
        problem
    }

    /// A consumption of 25 from time 10 drains the battery before a
    /// production of 20 scheduled from time 30: the production can be
    /// moved before the consumption, or a new one planned.
    pub fn late_production_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(ProblemDecision::new("drain", self.consume).with_start(Bounds::new(10, 60)))
            .add_fact(ProblemDecision::new("charge", self.produce).with_start(Bounds::new(30, 40)))
            .bind("drain", 0, "25")
            .bind("charge", 0, "20");
        problem
    }

    /// A consumption of 12 from time 10 against two productions of 1
    /// scheduled from time 30: moving both before the consumption covers
    /// the deficit of 2.
    pub fn partial_charges_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(ProblemDecision::new("drain", self.consume).with_start(Bounds::new(10, 60)))
            .add_fact(ProblemDecision::new("trickle", self.produce).with_start(Bounds::new(30, 40)))
            .add_fact(ProblemDecision::new("drip", self.produce).with_start(Bounds::new(30, 40)))
            .bind("drain", 0, "12")
            .bind("trickle", 0, "1")
            .bind("drip", 0, "1");
        problem
    }

    /// A consumption of 15 at time 20, a production of 20 at time 40 and
    /// a consumption of 30 at time 60: the level dips below zero twice.
    pub fn two_dips_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(ProblemDecision::new("morning", self.consume).with_start(Bounds::point(20)))
            .add_fact(ProblemDecision::new("charge", self.produce).with_start(Bounds::point(40)))
            .add_fact(ProblemDecision::new("evening", self.consume).with_start(Bounds::point(60)))
            .bind("morning", 0, "15")
            .bind("charge", 0, "20")
            .bind("evening", 0, "30");
        problem
    }
}
