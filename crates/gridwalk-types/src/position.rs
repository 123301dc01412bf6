//! Integer grid positions.
//!
//! Distances are computed in `i64` and returned unsigned so that no
//! coordinate pair on an `i32` grid can overflow.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing eastward.
    pub x: i32,
    /// Row, growing northward.
    pub y: i32,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `direction` (saturating at the `i32` range).
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(self, other: Self) -> u64 {
        let (dx, dy) = self.abs_deltas(other);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Chebyshev (king-move) distance to `other`.
    pub fn chebyshev_distance(self, other: Self) -> u64 {
        let (dx, dy) = self.abs_deltas(other);
        dx.max(dy)
    }

    /// The single step that best closes the gap to `other`.
    ///
    /// Each axis moves by the sign of its delta, so every step toward a
    /// distinct target reduces the Chebyshev distance by exactly one.
    /// Returns [`Direction::Center`] when `other == self`.
    pub fn direction_to(self, other: Self) -> Direction {
        let dx = i64::from(other.x).saturating_sub(i64::from(self.x)).signum();
        let dy = i64::from(other.y).saturating_sub(i64::from(self.y)).signum();
        // signum is always in -1..=1, so narrowing is lossless.
        Direction::from_delta(i32::try_from(dx).unwrap_or(0), i32::try_from(dy).unwrap_or(0))
    }

    /// Whether `other` is one of the eight neighbours of this cell.
    pub fn is_adjacent_to(self, other: Self) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }

    fn abs_deltas(self, other: Self) -> (u64, u64) {
        let dx = i64::from(self.x).saturating_sub(i64::from(other.x)).unsigned_abs();
        let dy = i64::from(self.y).saturating_sub(i64::from(other.y)).unsigned_abs();
        (dx, dy)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
