//! The nine-valued compass direction.
//!
//! Eight directions move an agent to a neighbouring cell of the
//! 8-connected grid; [`Direction::Center`] is the "no movement" value.
//! North is `+y` and East is `+x`.

use serde::{Deserialize, Serialize};

/// A single-step direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `(0, +1)`.
    North,
    /// `(+1, +1)`.
    NorthEast,
    /// `(+1, 0)`.
    East,
    /// `(+1, -1)`.
    SouthEast,
    /// `(0, -1)`.
    South,
    /// `(-1, -1)`.
    SouthWest,
    /// `(-1, 0)`.
    West,
    /// `(-1, +1)`.
    NorthWest,
    /// No movement, `(0, 0)`.
    Center,
}

impl Direction {
    /// The eight moving directions in clockwise order starting at North.
    pub const MOVES: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Unit coordinate delta `(dx, dy)` for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::NorthEast => (1, 1),
            Self::East => (1, 0),
            Self::SouthEast => (1, -1),
            Self::South => (0, -1),
            Self::SouthWest => (-1, -1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, 1),
            Self::Center => (0, 0),
        }
    }

    /// The direction whose delta is `(signum(dx), signum(dy))`.
    pub const fn from_delta(dx: i32, dy: i32) -> Self {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Self::North,
            (1, 1) => Self::NorthEast,
            (1, 0) => Self::East,
            (1, -1) => Self::SouthEast,
            (0, -1) => Self::South,
            (-1, -1) => Self::SouthWest,
            (-1, 0) => Self::West,
            (-1, 1) => Self::NorthWest,
            _ => Self::Center,
        }
    }

    /// Rotate 45 degrees clockwise. [`Direction::Center`] is a fixed point.
    pub const fn rotate_clockwise(self) -> Self {
        match self {
            Self::North => Self::NorthEast,
            Self::NorthEast => Self::East,
            Self::East => Self::SouthEast,
            Self::SouthEast => Self::South,
            Self::South => Self::SouthWest,
            Self::SouthWest => Self::West,
            Self::West => Self::NorthWest,
            Self::NorthWest => Self::North,
            Self::Center => Self::Center,
        }
    }

    /// Rotate 45 degrees counterclockwise. [`Direction::Center`] is a fixed point.
    pub const fn rotate_counterclockwise(self) -> Self {
        match self {
            Self::North => Self::NorthWest,
            Self::NorthWest => Self::West,
            Self::West => Self::SouthWest,
            Self::SouthWest => Self::South,
            Self::South => Self::SouthEast,
            Self::SouthEast => Self::East,
            Self::East => Self::NorthEast,
            Self::NorthEast => Self::North,
            Self::Center => Self::Center,
        }
    }

    /// The direction pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
            Self::Center => Self::Center,
        }
    }

    /// Whether this is one of the four diagonal directions.
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Whether this direction actually moves (anything but `Center`).
    pub const fn is_move(self) -> bool {
        !matches!(self, Self::Center)
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::East => "E",
            Self::SouthEast => "SE",
            Self::South => "S",
            Self::SouthWest => "SW",
            Self::West => "W",
            Self::NorthWest => "NW",
            Self::Center => "C",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_clockwise_rotations_return_home() {
        for start in Direction::MOVES {
            let mut d = start;
            for _ in 0..8 {
                d = d.rotate_clockwise();
            }
            assert_eq!(d, start);
        }
    }

    #[test]
    fn rotations_are_inverse() {
        for d in Direction::MOVES {
            assert_eq!(d.rotate_clockwise().rotate_counterclockwise(), d);
            assert_eq!(d.rotate_counterclockwise().rotate_clockwise(), d);
        }
    }

    #[test]
    fn moves_are_listed_clockwise() {
        for pair in Direction::MOVES.windows(2) {
            if let [a, b] = pair {
                assert_eq!(a.rotate_clockwise(), *b);
            }
        }
    }

    #[test]
    fn opposite_is_four_rotations() {
        for d in Direction::MOVES {
            let rotated = d
                .rotate_clockwise()
                .rotate_clockwise()
                .rotate_clockwise()
                .rotate_clockwise();
            assert_eq!(d.opposite(), rotated);
        }
        assert_eq!(Direction::Center.opposite(), Direction::Center);
    }

    #[test]
    fn delta_round_trips_through_from_delta() {
        for d in Direction::MOVES {
            let (dx, dy) = d.delta();
            assert_eq!(Direction::from_delta(dx, dy), d);
        }
        assert_eq!(Direction::from_delta(0, 0), Direction::Center);
        assert_eq!(Direction::from_delta(7, -3), Direction::SouthEast);
    }

    #[test]
    fn center_is_fixed_under_rotation() {
        assert_eq!(Direction::Center.rotate_clockwise(), Direction::Center);
        assert_eq!(Direction::Center.rotate_counterclockwise(), Direction::Center);
        assert!(!Direction::Center.is_move());
    }

    #[test]
    fn diagonals() {
        let diagonals = Direction::MOVES.iter().filter(|d| d.is_diagonal()).count();
        assert_eq!(diagonals, 4);
    }
}
