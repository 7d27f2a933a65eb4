//! Timeforge Parameter - parameter variables of decision tokens
//!
//! Decisions carry parameter placeholders (`?x`) typed by enumeration or
//! numeric domains. This crate provides the [`ParameterStore`] boundary the
//! plan database talks to and a [`DomainParameterStore`] reference
//! implementation supporting bind, equal and not-equal constraints.

pub mod domain;
pub mod store;

pub use domain::{ParameterDomain, ParameterValues};
pub use store::{
    DomainParameterStore, ParameterConstraint, ParameterConstraintId, ParameterId, ParameterStore,
};
