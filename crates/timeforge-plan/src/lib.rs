//! Timeforge Plan - domain components and the plan database
//!
//! This crate provides:
//! - [`PlanDomain`]: components, values, transitions and synchronization
//!   rules, with decomposition cycle detection and derived hierarchy views
//! - [`PlanDataBase`]: arenas of decisions and relations with the
//!   pending/active/silent lifecycle and a reversible transaction log
//! - [`Problem`] input and [`SolutionPlan`] output

pub mod component;
pub mod decision;
pub mod domain;
pub mod pdb;
pub mod plan;
pub mod problem;
pub mod relation;
pub mod rule;
pub mod transaction;
pub mod value;

pub use component::{ComponentKind, DomainComponent};
pub use decision::{Decision, DecisionSpec, DecisionState, Token};
pub use domain::{PlanDomain, AMOUNT_PARAMETER, MAX_RESOURCE_AMOUNT, RESOURCE_EVENT_DURATION};
pub use pdb::{DecisionSets, PlanDataBase, ResourceEvent};
pub use plan::{PlanRelation, PlanTimeline, PlanToken, SolutionPlan};
pub use problem::{Problem, ProblemConstraint, ProblemDecision};
pub use relation::{
    ParameterRelation, PropagatedConstraint, Relation, RelationKind, RelationState, TimeWindow,
};
pub use rule::{RuleConstraint, SynchronizationRule, TokenRef, TokenVariable};
pub use transaction::Undo;
pub use value::{
    ComponentValue, ParameterPlaceholder, ParameterRelationType, ResourceEffect, Transition,
    TransitionConstraint,
};
