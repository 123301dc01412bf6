//! Per-cell state.

use serde::{Deserialize, Serialize};

/// What a cell is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Walkable ground.
    Open,
    /// Permanent obstacle.
    Wall,
    /// Flooded ground; not walkable.
    Water,
    /// A home base. Not walkable; accepts deliveries.
    Base,
}

impl Terrain {
    /// Whether an agent may stand on this terrain.
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain type.
    pub terrain: Terrain,
    /// Height of the ground; steps may only climb or drop a bounded amount.
    pub elevation: i32,
    /// Collectable resource units lying on the cell.
    pub resource: u32,
    /// Units delivered into this cell (bases only).
    pub stored: u32,
}

impl Cell {
    /// A flat open cell with nothing on it.
    pub const fn open() -> Self {
        Self::with_terrain(Terrain::Open)
    }

    /// A cell of the given terrain at elevation 0.
    pub const fn with_terrain(terrain: Terrain) -> Self {
        Self {
            terrain,
            elevation: 0,
            resource: 0,
            stored: 0,
        }
    }

    /// Whether any resource remains on the cell.
    pub const fn has_resource(&self) -> bool {
        self.resource > 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::open()
    }
}
