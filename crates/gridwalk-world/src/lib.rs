//! The grid world the Gridwalk agents move on.
//!
//! This crate is the Grid Adapter: it answers adjacency and walkability
//! questions and executes single-step world mutations. Navigation and
//! decision making live elsewhere and only reach the grid through the
//! narrow [`GridAdapter`] trait and the mutation methods on [`GridMap`].
//!
//! # Modules
//!
//! - [`adapter`] -- The [`GridAdapter`] trait consumed by agent shells.
//! - [`cell`] -- Per-cell terrain, elevation, and resource state.
//! - [`error`] -- Error types for grid operations.
//! - [`grid`] -- [`GridMap`]: cells, occupancy, moves, digging, delivery.
//! - [`layout`] -- ASCII layouts and the built-in default map.
//! - [`sense`] -- Fold-based sensing over a radius ([`Closest`]).

pub mod adapter;
pub mod cell;
pub mod error;
pub mod grid;
pub mod layout;
pub mod sense;

// Re-export primary types at crate root.
pub use adapter::GridAdapter;
pub use cell::{Cell, Terrain};
pub use error::WorldError;
pub use grid::{DEFAULT_MAX_CLIMB, GridMap, GridSnapshot};
pub use layout::{DEFAULT_LAYOUT, Layout};
pub use sense::{Closest, closest_cell};
