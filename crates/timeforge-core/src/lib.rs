//! Timeforge Core - shared types for timeline-based planning
//!
//! This crate provides the vocabulary used by every other Timeforge crate:
//! - Error kinds raised by temporal propagation, plan commits and search
//! - Handle newtypes addressing decisions, relations, components and values
//! - An injectable monotonic id generator
//! - Closed integer bounds used for time points, distances and durations

pub mod bounds;
pub mod error;
pub mod id;

pub use bounds::Bounds;
pub use error::{Result, TimeforgeError};
pub use id::{
    ComponentId, DecisionId, FlawId, IdGenerator, NodeId, RelationId, RuleId, SolutionId, ValueId,
};
