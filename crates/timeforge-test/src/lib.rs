//! Shared test fixtures for Timeforge crates.
//!
//! This crate provides planning domains and problems for testing.
//!
//! - [`satellite`] - Pointing timeline with transition paths (gap completion)
//! - [`unary`] - Unary resource with overlapping usages (scheduling)
//! - [`reservoir`] - Battery reservoir with an over-consumption
//! - [`rover`] - Two-level domain with a synchronization rule (full search)
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! timeforge-test = { workspace = true }
//! ```
//!
//! Then build the fixture you need:
//!
//! ```
//! use timeforge_test::satellite::SatelliteDomain;
//!
//! let fixture = SatelliteDomain::new().unwrap();
//! let problem = fixture.gap_problem();
//! assert_eq!(problem.facts.len(), 2);
//! ```

pub mod reservoir;
pub mod rover;
pub mod satellite;
pub mod unary;

pub use reservoir::BatteryDomain;
pub use rover::RoverDomain;
pub use satellite::SatelliteDomain;
pub use unary::DrillDomain;

/// Horizon used by every fixture.
pub const HORIZON: i64 = 100;
