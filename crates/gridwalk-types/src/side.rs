//! Which side of an obstacle a navigating agent keeps in contact with.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// The side of the agent that stays against the obstacle while following it.
///
/// [`FollowSide::Left`] and [`FollowSide::Right`] are mirror images: every
/// rotation one of them performs clockwise, the other performs
/// counterclockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowSide {
    /// Obstacle on the agent's left; detours swing clockwise.
    Left,
    /// Obstacle on the agent's right; detours swing counterclockwise.
    Right,
}

impl FollowSide {
    /// Both sides, in declaration order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Turn one step toward the wall (used to hug the obstacle tighter).
    pub const fn along_wall(self, heading: Direction) -> Direction {
        match self {
            Self::Left => heading.rotate_counterclockwise(),
            Self::Right => heading.rotate_clockwise(),
        }
    }

    /// Turn one step away from the wall (used to find a way around it).
    pub const fn against_wall(self, heading: Direction) -> Direction {
        match self {
            Self::Left => heading.rotate_clockwise(),
            Self::Right => heading.rotate_counterclockwise(),
        }
    }

    /// The other side.
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl core::fmt::Display for FollowSide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}
