//! Local obstacle-avoiding navigation ("bug" pathfinding).
//!
//! A [`Navigator`] owns one goal-directed walk. Each call to
//! [`Navigator::step`] looks at the agent's current cell and a caller
//! supplied walkability predicate and recommends a single step. It never
//! mutates the world; the caller executes the move.
//!
//! # Algorithm
//!
//! While the straight line toward the goal is open, the navigator walks it.
//! When the direct step is blocked it starts following the obstacle's
//! boundary on its preferred side, remembering the squared distance to the
//! goal at the moment it engaged. It stops following as soon as it is at
//! least that close again and the direct step is open.
//!
//! While following, each step first tries to turn one notch toward the wall
//! (corner cutting), then rotates away from the wall until an open heading
//! is found. A full rotation without an open heading means the agent is
//! boxed in and [`Step::NoMoveAvailable`] is returned.
//!
//! Every call costs at most ten predicate evaluations, independent of
//! obstacle size.

use gridwalk_types::{Direction, FollowSide, Position};
use tracing::trace;

/// The navigator's recommendation for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The goal is reached; nothing to do.
    Arrived,
    /// Take one step in this direction.
    Move(Direction),
    /// Every neighbouring cell is blocked. Try again later or do something else.
    NoMoveAvailable,
}

impl Step {
    /// The recommended direction: `Center` on arrival, `None` when boxed in.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Arrived => Some(Direction::Center),
            Self::Move(direction) => Some(direction),
            Self::NoMoveAvailable => None,
        }
    }

    /// Whether the step is an actual move.
    pub const fn is_move(self) -> bool {
        matches!(self, Self::Move(_))
    }
}

/// Heading recorded the first time a cell was probed while following.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    position: Position,
    heading: Direction,
}

/// One in-progress walk toward a fixed goal.
///
/// A navigator is only meaningful for the goal and agent state it was
/// created for. Callers must replace it when they adopt a different goal;
/// the executor drops it whenever the agent's state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    goal: Position,
    preferred_side: FollowSide,
    allow_adjacent: bool,
    following: bool,
    heading: Direction,
    engaged_distance: u64,
    probe: Option<Probe>,
}

impl Navigator {
    /// Start a walk toward `goal`.
    ///
    /// With `allow_adjacent`, standing next to the goal counts as arrival
    /// (useful when the goal cell itself cannot be entered).
    pub const fn new(goal: Position, preferred_side: FollowSide, allow_adjacent: bool) -> Self {
        Self {
            goal,
            preferred_side,
            allow_adjacent,
            following: false,
            heading: Direction::Center,
            engaged_distance: 0,
            probe: None,
        }
    }

    /// The goal this walk is aimed at.
    pub const fn goal(&self) -> Position {
        self.goal
    }

    /// The side kept against obstacles.
    pub const fn preferred_side(&self) -> FollowSide {
        self.preferred_side
    }

    /// Whether standing next to the goal counts as arrival.
    pub const fn allows_adjacent(&self) -> bool {
        self.allow_adjacent
    }

    /// Whether the walk is currently circling an obstacle.
    pub const fn is_following(&self) -> bool {
        self.following
    }

    /// Current following heading (`Center` when not following yet).
    pub const fn heading(&self) -> Direction {
        self.heading
    }

    /// Squared distance to the goal recorded when following began.
    pub const fn engaged_distance(&self) -> u64 {
        self.engaged_distance
    }

    /// Whether this walk already targets `goal` with the same arrival rule.
    pub fn aims_at(&self, goal: Position, allow_adjacent: bool) -> bool {
        self.goal == goal && self.allow_adjacent == allow_adjacent
    }

    /// Whether `position` counts as having arrived.
    pub fn is_finished(&self, position: Position) -> bool {
        position == self.goal || (self.allow_adjacent && position.is_adjacent_to(self.goal))
    }

    /// Recommend the next step from `position`.
    ///
    /// `is_walkable` answers whether a single step in a direction is
    /// currently permitted; it may encode more than terrain (hazard zones,
    /// reserved cells). Calling this again from the same cell with the same
    /// walkability gives the same answer.
    pub fn step<F>(&mut self, position: Position, mut is_walkable: F) -> Step
    where
        F: FnMut(Direction) -> bool,
    {
        if self.is_finished(position) {
            return Step::Arrived;
        }

        let direct = position.direction_to(self.goal);
        if !self.following {
            if is_walkable(direct) {
                return Step::Move(direct);
            }
            self.engage(position, direct);
        }

        // Re-probing a cell restarts from the heading held on arrival there.
        match self.probe {
            Some(probe) if probe.position == position => self.heading = probe.heading,
            _ => {
                self.probe = Some(Probe {
                    position,
                    heading: self.heading,
                });
            }
        }

        if position.distance_squared(self.goal) <= self.engaged_distance && is_walkable(direct) {
            self.following = false;
            self.probe = None;
            trace!(%position, goal = %self.goal, %direct, "obstacle cleared, heading straight");
            return Step::Move(direct);
        }

        let desired = self.preferred_side.along_wall(self.heading);
        if is_walkable(desired) {
            self.heading = desired;
            return Step::Move(desired);
        }

        let start = self.heading;
        let mut candidate = start;
        loop {
            if is_walkable(candidate) {
                self.heading = candidate;
                return Step::Move(candidate);
            }
            candidate = self.preferred_side.against_wall(candidate);
            if candidate == start {
                trace!(%position, goal = %self.goal, "boxed in");
                return Step::NoMoveAvailable;
            }
        }
    }

    fn engage(&mut self, position: Position, direct: Direction) {
        self.following = true;
        self.engaged_distance = position.distance_squared(self.goal);
        self.heading = direct;
        self.probe = None;
        trace!(
            %position,
            goal = %self.goal,
            side = %self.preferred_side,
            engaged_distance = self.engaged_distance,
            "direct route blocked, following obstacle"
        );
    }
}
