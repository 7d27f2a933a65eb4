//! Satellite pointing fixtures.
//!
//! One state variable `pointing` with values `Earth`, `Slewing [5, 5]`,
//! `Maneuver [7, 9]` and `Science`, and transitions
//! `Earth -> Slewing -> Science` and `Earth -> Maneuver -> Science`.

use std::sync::Arc;

use timeforge_core::{Bounds, ComponentId, Result, ValueId};
use timeforge_plan::{PlanDomain, Problem, ProblemDecision};

use crate::HORIZON;

/// The satellite domain and its handles.
#[derive(Debug, Clone)]
pub struct SatelliteDomain {
    pub domain: Arc<PlanDomain>,
    pub pointing: ComponentId,
    pub earth: ValueId,
    pub slewing: ValueId,
    pub maneuver: ValueId,
    pub science: ValueId,
}

impl SatelliteDomain {
    pub fn new() -> Result<Self> {
        let mut domain = PlanDomain::new("satellite");
        let pointing = domain.add_state_variable("pointing", false);
        let earth = domain.add_value(pointing, "Earth", Bounds::new(1, HORIZON), true)?;
        let slewing = domain.add_value(pointing, "Slewing", Bounds::new(5, 5), true)?;
        let maneuver = domain.add_value(pointing, "Maneuver", Bounds::new(7, 9), true)?;
        let science = domain.add_value(pointing, "Science", Bounds::new(1, HORIZON), true)?;
        domain.add_transition(earth, slewing)?;
        domain.add_transition(slewing, science)?;
        domain.add_transition(earth, maneuver)?;
        domain.add_transition(maneuver, science)?;
        domain.add_transition(earth, science)?;
        Ok(Self {
            domain: Arc::new(domain),
            pointing,
            earth,
            slewing,
            maneuver,
            science,
        })
    }

    /// `Earth` on `[0, 10]` immediately followed by `Science` from 10,
    /// with no relation between them.
    pub fn semantic_connection_problem(&self) -> Problem {
        self.two_facts(10)
    }

    /// `Earth` on `[0, 10]` and `Science` from 15: a `[5, 5]` gap.
    pub fn gap_problem(&self) -> Problem {
        self.two_facts(15)
    }

    fn two_facts(&self, science_start: i64) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(
                ProblemDecision::new("earth", self.earth)
                    .with_start(Bounds::point(0))
                    .with_end(Bounds::point(10)),
            )
            .add_fact(
                ProblemDecision::new("science", self.science)
                    .with_start(Bounds::point(science_start))
                    .with_end(Bounds::point(science_start + 20)),
            );
        problem
    }
}
