//! Timeforge Temporal - simple temporal network with uncertainty
//!
//! This crate provides:
//! - [`TemporalNetwork`]: time points and distance constraints with
//!   incremental shortest-path propagation and exact removal
//! - [`TemporalFacade`]: intervals, Allen constraints and pure queries
//!   (distance, overlap, schedule, makespan)
//! - Pseudo-controllability checking of contingent intervals

pub mod constraint;
pub mod facade;
pub mod interval;
pub mod network;

pub use constraint::{translate, TemporalConstraintType};
pub use facade::{TemporalConstraintHandle, TemporalFacade};
pub use interval::{IntervalId, IntervalSchedule, Makespan, TemporalInterval};
pub use network::{ConstraintId, DistanceConstraint, Edge, TemporalNetwork, TimePoint, TimePointId};
