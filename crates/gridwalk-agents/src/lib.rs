//! Agent shells for the Gridwalk simulation.
//!
//! Each shell is a set of state handlers run by the core
//! [`Executor`](gridwalk_core::Executor), plus the memory those handlers
//! keep between turns. Shells talk to each other only through the
//! [`Bulletin`](gridwalk_core::Bulletin).
//!
//! # Modules
//!
//! - [`courier`] -- Gathers resource and delivers it to the base ([`Courier`]).
//! - [`builder`] -- Raises a wall ring around the base ([`Builder`], [`plan_wall`]).
//! - [`config`] -- Tunables from the `agents` config section ([`AgentTuning`]).
//! - [`walk`] -- Hazard-aware walkability, step execution, and stall detection.

pub mod builder;
pub mod config;
pub mod courier;
pub mod walk;

pub use builder::{Builder, BuilderState, plan_wall};
pub use config::{AgentTuning, BuilderTuning, CourierTuning, DigPreference, PopulationTuning};
pub use courier::{Courier, CourierState};
