//! Turn counter.
//!
//! The clock is the single source of truth for which turn the simulation
//! is on. Bulletin entries and turn summaries are stamped with it.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Counts completed turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnClock {
    /// Current turn number (0 before the first turn runs).
    turn: u64,
}

impl TurnClock {
    /// A clock at turn 0.
    pub const fn new() -> Self {
        Self { turn: 0 }
    }

    /// A clock resumed at `turn`.
    pub const fn starting_at(turn: u64) -> Self {
        Self { turn }
    }

    /// Advance by one turn. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.turn = self.turn.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.turn)
    }

    /// The current turn number.
    pub const fn turn(&self) -> u64 {
        self.turn
    }
}
