//! Tunables for the agent shells.
//!
//! These values live under the `agents` key of `gridwalk-config.yaml`. The
//! engine parses them once at startup into an [`AgentTuning`], wraps it in
//! an `Arc`, and hands a clone to every shell it spawns. Nothing here is
//! global or mutable after startup.

use gridwalk_types::FollowSide;
use serde::Deserialize;

/// Root of the `agents` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentTuning {
    /// How many of each shell to spawn.
    #[serde(default)]
    pub population: PopulationTuning,

    /// Resource carrier settings.
    #[serde(default)]
    pub courier: CourierTuning,

    /// Wall builder settings.
    #[serde(default)]
    pub builder: BuilderTuning,
}

impl AgentTuning {
    /// Settings the shells cannot work with, one message per problem.
    /// An empty list means the tuning is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.courier.capacity == 0 {
            problems.push("courier.capacity must be at least 1".to_owned());
        }
        if self.builder.dirt_capacity == 0 {
            problems.push("builder.dirt_capacity must be at least 1".to_owned());
        }
        problems
    }
}

/// Spawn counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationTuning {
    /// Number of couriers (default: 4).
    #[serde(default = "default_couriers")]
    pub couriers: u32,

    /// Number of builders (default: 2).
    #[serde(default = "default_builders")]
    pub builders: u32,
}

impl Default for PopulationTuning {
    fn default() -> Self {
        Self {
            couriers: default_couriers(),
            builders: default_builders(),
        }
    }
}

/// Courier settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourierTuning {
    /// Units a courier can carry (default: 10).
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Units collected per gather action (default: 2).
    #[serde(default = "default_gather_per_turn")]
    pub gather_per_turn: u32,

    /// Squared sensing radius (default: 25).
    #[serde(default = "default_sense_radius_sq")]
    pub sense_radius_sq: u64,

    /// Turns spent on one goal before giving up on it (default: 60).
    #[serde(default = "default_stall_turns")]
    pub stall_turns: u32,

    /// Obstacle-following side; random per courier when unset.
    #[serde(default)]
    pub follow_side: Option<FollowSide>,
}

impl Default for CourierTuning {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            gather_per_turn: default_gather_per_turn(),
            sense_radius_sq: default_sense_radius_sq(),
            stall_turns: default_stall_turns(),
            follow_side: None,
        }
    }
}

/// Which neighbouring cell a builder digs first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigPreference {
    /// The neighbour farthest from the base, leaving a ditch outside the wall.
    #[default]
    Outward,
    /// The lowest neighbour, deepening the same hole.
    Lowest,
}

/// Builder settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuilderTuning {
    /// Dirt a builder can carry (default: 3).
    #[serde(default = "default_dirt_capacity")]
    pub dirt_capacity: u32,

    /// Elevation wall cells are raised to (default: 2).
    #[serde(default = "default_target_height")]
    pub target_height: i32,

    /// Lowest elevation a builder digs down to (default: -1).
    #[serde(default = "default_dig_floor")]
    pub dig_floor: i32,

    /// Where builders take dirt from.
    #[serde(default)]
    pub dig_preference: DigPreference,

    /// Chebyshev distance of the wall ring from the base (default: 3).
    #[serde(default = "default_wall_radius")]
    pub wall_radius: u32,

    /// Leave the four axis-aligned ring cells open as gates (default: true).
    #[serde(default = "default_true")]
    pub gates: bool,

    /// Turns spent reaching a slot before releasing it (default: 60).
    #[serde(default = "default_stall_turns")]
    pub stall_turns: u32,

    /// Obstacle-following side; random per builder when unset.
    #[serde(default)]
    pub follow_side: Option<FollowSide>,
}

impl Default for BuilderTuning {
    fn default() -> Self {
        Self {
            dirt_capacity: default_dirt_capacity(),
            target_height: default_target_height(),
            dig_floor: default_dig_floor(),
            dig_preference: DigPreference::default(),
            wall_radius: default_wall_radius(),
            gates: default_true(),
            stall_turns: default_stall_turns(),
            follow_side: None,
        }
    }
}

const fn default_couriers() -> u32 {
    4
}

const fn default_builders() -> u32 {
    2
}

const fn default_capacity() -> u32 {
    10
}

const fn default_gather_per_turn() -> u32 {
    2
}

const fn default_sense_radius_sq() -> u64 {
    25
}

const fn default_stall_turns() -> u32 {
    60
}

const fn default_dirt_capacity() -> u32 {
    3
}

const fn default_target_height() -> i32 {
    2
}

const fn default_dig_floor() -> i32 {
    -1
}

const fn default_wall_radius() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}
