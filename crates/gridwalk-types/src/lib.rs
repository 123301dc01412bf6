//! Shared type definitions for the Gridwalk workspace.
//!
//! This crate is the vocabulary every other crate speaks: grid cells,
//! compass directions, obstacle-following sides, and agent identifiers.
//! It has no behaviour beyond geometry on those values.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for agent identifiers
//! - [`direction`] -- The nine-valued compass [`Direction`]
//! - [`position`] -- Integer grid [`Position`] and distance helpers
//! - [`side`] -- [`FollowSide`], the obstacle-hugging preference

pub mod direction;
pub mod ids;
pub mod position;
pub mod side;

// Re-export all public types at crate root for convenience.
pub use direction::Direction;
pub use ids::AgentId;
pub use position::Position;
pub use side::FollowSide;
