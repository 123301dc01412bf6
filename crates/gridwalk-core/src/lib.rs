//! Navigation, decision making, and the turn cycle for the Gridwalk agents.
//!
//! The two pieces every agent is built from live here: the [`Navigator`],
//! a memory-light "bug" walker that detours around obstacles using only
//! walkability queries, and the [`Executor`], a generic state machine that
//! chains free transitions until a handler acts.
//!
//! # Modules
//!
//! - [`navigator`] -- Obstacle-following navigation sessions.
//! - [`executor`] -- [`Executor`], the handler contract, and [`Turn`].
//! - [`bulletin`] -- The shared broadcast board agents publish facts to.
//! - [`clock`] -- Turn counter.
//! - [`config`] -- Configuration loading from `gridwalk-config.yaml`.
//! - [`tick`] -- The [`Agent`] trait and the round-robin turn cycle.
//! - [`runner`] -- The async simulation loop.
//!
//! [`Agent`]: tick::Agent

pub mod bulletin;
pub mod clock;
pub mod config;
pub mod executor;
pub mod navigator;
pub mod runner;
pub mod tick;

pub use bulletin::{Bulletin, Fact, Hazard};
pub use executor::{AgentState, Executor, ExecutorError, Handler, HandlerTable, TickReport, Transition, Turn};
pub use navigator::{Navigator, Step};
