//! Rover fixtures.
//!
//! A master `mission` timeline (`Idle`, `Observe`) drives a `camera`
//! timeline (`Idle`, `TakePicture`): every `Observe` contains a
//! `TakePicture`.

use std::sync::Arc;

use timeforge_core::{Bounds, ComponentId, Result, ValueId};
use timeforge_plan::{
    PlanDomain, Problem, ProblemDecision, SynchronizationRule, TokenRef, TokenVariable,
};
use timeforge_temporal::TemporalConstraintType;

use crate::HORIZON;

/// The rover domain and its handles.
#[derive(Debug, Clone)]
pub struct RoverDomain {
    pub domain: Arc<PlanDomain>,
    pub mission: ComponentId,
    pub camera: ComponentId,
    pub mission_idle: ValueId,
    pub observe: ValueId,
    pub camera_idle: ValueId,
    pub take_picture: ValueId,
}

impl RoverDomain {
    pub fn new() -> Result<Self> {
        let mut domain = PlanDomain::new("rover");
        let mission = domain.add_state_variable("mission", false);
        let camera = domain.add_state_variable("camera", false);

        let mission_idle = domain.add_value(mission, "Idle", Bounds::new(1, HORIZON), true)?;
        let observe = domain.add_value(mission, "Observe", Bounds::new(10, 30), true)?;
        domain.add_transition(mission_idle, observe)?;
        domain.add_transition(observe, mission_idle)?;

        let camera_idle = domain.add_value(camera, "Idle", Bounds::new(1, HORIZON), true)?;
        let take_picture = domain.add_value(camera, "TakePicture", Bounds::new(5, 8), true)?;
        domain.add_transition(camera_idle, take_picture)?;
        domain.add_transition(take_picture, camera_idle)?;

        let mut rule = SynchronizationRule::new(mission, observe);
        let picture = rule.add_variable(TokenVariable::new(camera, take_picture));
        rule.add_temporal(
            TemporalConstraintType::Contains,
            TokenRef::Trigger,
            picture,
            vec![Bounds::new(0, HORIZON), Bounds::new(0, HORIZON)],
        );
        domain.add_rule(rule)?;

        Ok(Self {
            domain: Arc::new(domain),
            mission,
            camera,
            mission_idle,
            observe,
            camera_idle,
            take_picture,
        })
    }

    /// Both timelines start idle at 0; the goal is one observation.
    pub fn observation_problem(&self) -> Problem {
        let mut problem = Problem::new();
        problem
            .add_fact(
                ProblemDecision::new("mission-idle", self.mission_idle)
                    .with_start(Bounds::point(0)),
            )
            .add_fact(
                ProblemDecision::new("camera-idle", self.camera_idle)
                    .with_start(Bounds::point(0)),
            )
            .add_goal(ProblemDecision::new("observe", self.observe));
        problem
    }
}
