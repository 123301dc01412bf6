//! Error types for the `gridwalk-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

use gridwalk_types::{AgentId, Position};

use crate::cell::Terrain;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The position lies outside the grid.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    /// The agent is not on the grid.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The agent was placed twice.
    #[error("agent already placed: {0}")]
    DuplicateAgent(AgentId),

    /// Another agent already stands on the cell.
    #[error("cell {at} is occupied by {by}")]
    CellOccupied {
        /// The contested cell.
        at: Position,
        /// The agent standing there.
        by: AgentId,
    },

    /// The cell's terrain cannot be entered.
    #[error("cell {at} is impassable ({terrain:?})")]
    Impassable {
        /// The blocked cell.
        at: Position,
        /// Its terrain.
        terrain: Terrain,
    },

    /// The elevation difference exceeds the climb limit.
    #[error("step from {from} to {to} is too steep (limit {limit})")]
    TooSteep {
        /// Origin cell.
        from: Position,
        /// Destination cell.
        to: Position,
        /// Maximum allowed elevation difference.
        limit: u32,
    },

    /// The cell has no resource left.
    #[error("nothing to collect at {0}")]
    NothingToCollect(Position),

    /// Deliveries are only accepted by base cells.
    #[error("cell {0} is not a base")]
    NotABase(Position),

    /// Only open terrain can be dug or built up.
    #[error("cell {0} cannot be dug or raised")]
    NotDiggable(Position),

    /// A layout could not be parsed.
    #[error("invalid layout at line {line}: {reason}")]
    InvalidLayout {
        /// One-based line number in the layout text.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in grid calculation")]
    ArithmeticOverflow,
}
