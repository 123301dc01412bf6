//! The grid map: cells, occupancy, and single-step world mutations.
//!
//! Cells are stored row-major. Occupancy is indexed both ways
//! (`Position -> AgentId` and `AgentId -> Position`) so that walkability
//! checks and position lookups are both logarithmic.
//!
//! A step is legal when the destination is in bounds, passable, unoccupied,
//! and no more than `max_climb` elevation units above or below the origin.

use std::collections::BTreeMap;

use gridwalk_types::{AgentId, Direction, Position};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cell::{Cell, Terrain};
use crate::error::WorldError;

/// Default maximum elevation difference a single step may cross.
pub const DEFAULT_MAX_CLIMB: u32 = 3;

/// The grid world holding all cells and agent positions.
#[derive(Debug, Clone)]
pub struct GridMap {
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Row-major cells, `width * height` entries.
    cells: Vec<Cell>,
    /// Occupancy: cell -> agent standing on it.
    occupants: BTreeMap<Position, AgentId>,
    /// Reverse occupancy: agent -> cell.
    positions: BTreeMap<AgentId, Position>,
    /// Maximum elevation difference per step.
    max_climb: u32,
}

/// Serializable summary of a grid for end-of-run reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Where every agent stands.
    pub agents: BTreeMap<AgentId, Position>,
    /// Units delivered into bases so far.
    pub total_stored: u64,
    /// Units still lying on the ground.
    pub resource_remaining: u64,
}

impl GridMap {
    /// Create a flat, open grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if `width * height` does
    /// not fit in memory indices.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        let len = cell_count(width, height)?;
        Ok(Self::from_parts(width, height, vec![Cell::open(); len]))
    }

    /// Create a grid from row-major cells.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidLayout`] if the cell count does not match
    /// the dimensions.
    pub fn from_cells(width: u32, height: u32, cells: Vec<Cell>) -> Result<Self, WorldError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(WorldError::InvalidLayout {
                line: 0,
                reason: format!("expected {expected} cells, got {}", cells.len()),
            });
        }
        Ok(Self::from_parts(width, height, cells))
    }

    const fn from_parts(width: u32, height: u32, cells: Vec<Cell>) -> Self {
        Self {
            width,
            height,
            cells,
            occupants: BTreeMap::new(),
            positions: BTreeMap::new(),
            max_climb: DEFAULT_MAX_CLIMB,
        }
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Maximum elevation difference per step.
    pub const fn max_climb(&self) -> u32 {
        self.max_climb
    }

    /// Change the climb limit.
    pub const fn set_max_climb(&mut self, max_climb: u32) {
        self.max_climb = max_climb;
    }

    // -------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------

    /// Whether `position` lies on the grid.
    pub fn in_bounds(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// The cell at `position`, if in bounds.
    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.index(position).and_then(|i| self.cells.get(i))
    }

    /// Mutable access to the cell at `position`, if in bounds.
    pub fn cell_mut(&mut self, position: Position) -> Option<&mut Cell> {
        self.index(position).and_then(|i| self.cells.get_mut(i))
    }

    /// Replace the terrain of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the position is off the grid.
    pub fn set_terrain(&mut self, position: Position, terrain: Terrain) -> Result<(), WorldError> {
        let cell = self
            .cell_mut(position)
            .ok_or(WorldError::OutOfBounds(position))?;
        cell.terrain = terrain;
        Ok(())
    }

    /// All in-bounds cells within `radius_sq` (squared Euclidean) of `center`,
    /// ordered by row then column.
    pub fn positions_within(&self, center: Position, radius_sq: u64) -> Vec<Position> {
        let span = u64::from(self.width.max(self.height));
        let reach = i64::try_from(radius_sq.isqrt().min(span)).unwrap_or(0);
        let low = 0_i64.saturating_sub(reach);

        let mut found = Vec::new();
        for dy in low..=reach {
            for dx in low..=reach {
                let x = i64::from(center.x).saturating_add(dx);
                let y = i64::from(center.y).saturating_add(dy);
                let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                    continue;
                };
                let candidate = Position::new(x, y);
                if self.in_bounds(candidate) && center.distance_squared(candidate) <= radius_sq {
                    found.push(candidate);
                }
            }
        }
        found
    }

    /// Units delivered into all bases.
    pub fn total_stored(&self) -> u64 {
        self.cells
            .iter()
            .fold(0_u64, |acc, c| acc.saturating_add(u64::from(c.stored)))
    }

    /// Units of resource still on the ground.
    pub fn total_resource(&self) -> u64 {
        self.cells
            .iter()
            .fold(0_u64, |acc, c| acc.saturating_add(u64::from(c.resource)))
    }

    // -------------------------------------------------------------------
    // Agents
    // -------------------------------------------------------------------

    /// Put an agent on the grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateAgent`], [`WorldError::OutOfBounds`],
    /// [`WorldError::Impassable`], or [`WorldError::CellOccupied`].
    pub fn place_agent(&mut self, agent: AgentId, at: Position) -> Result<(), WorldError> {
        if self.positions.contains_key(&agent) {
            return Err(WorldError::DuplicateAgent(agent));
        }
        let cell = self.cell(at).ok_or(WorldError::OutOfBounds(at))?;
        if !cell.terrain.is_passable() {
            return Err(WorldError::Impassable {
                at,
                terrain: cell.terrain,
            });
        }
        if let Some(&by) = self.occupants.get(&at) {
            return Err(WorldError::CellOccupied { at, by });
        }
        self.occupants.insert(at, agent);
        self.positions.insert(agent, at);
        Ok(())
    }

    /// Where an agent stands.
    pub fn position_of(&self, agent: AgentId) -> Option<Position> {
        self.positions.get(&agent).copied()
    }

    /// Who stands on a cell.
    pub fn occupant(&self, at: Position) -> Option<AgentId> {
        self.occupants.get(&at).copied()
    }

    /// Number of agents on the grid.
    pub fn agent_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over all agents and their positions.
    pub fn agents(&self) -> impl Iterator<Item = (&AgentId, &Position)> {
        self.positions.iter()
    }

    // -------------------------------------------------------------------
    // Walkability and mutations
    // -------------------------------------------------------------------

    /// Whether `agent` may take a single step in `direction` right now.
    ///
    /// [`Direction::Center`] is never a step.
    pub fn can_step(&self, agent: AgentId, direction: Direction) -> bool {
        self.position_of(agent)
            .is_some_and(|from| self.can_step_from(from, direction))
    }

    /// Whether a step from `from` in `direction` is legal, ignoring who takes it.
    pub fn can_step_from(&self, from: Position, direction: Direction) -> bool {
        direction.is_move() && self.check_step(from, direction).is_ok()
    }

    /// Move an agent one cell.
    ///
    /// Moving toward [`Direction::Center`] is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] or the reason the step is illegal.
    pub fn apply_move(&mut self, agent: AgentId, direction: Direction) -> Result<Position, WorldError> {
        let from = self
            .position_of(agent)
            .ok_or(WorldError::AgentNotFound(agent))?;
        if !direction.is_move() {
            return Ok(from);
        }
        let to = self.check_step(from, direction)?;
        self.occupants.remove(&from);
        self.occupants.insert(to, agent);
        self.positions.insert(agent, to);
        trace!(%agent, %from, %to, "agent moved");
        Ok(to)
    }

    /// Pick up to `amount` resource units from the cell in `direction`
    /// (or underfoot for [`Direction::Center`]). Returns the units taken.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NothingToCollect`] if the cell is empty.
    pub fn collect(&mut self, agent: AgentId, direction: Direction, amount: u32) -> Result<u32, WorldError> {
        let at = self.target_of(agent, direction)?;
        let cell = self.cell_mut(at).ok_or(WorldError::OutOfBounds(at))?;
        if !cell.has_resource() {
            return Err(WorldError::NothingToCollect(at));
        }
        let taken = amount.min(cell.resource);
        cell.resource = cell
            .resource
            .checked_sub(taken)
            .ok_or(WorldError::ArithmeticOverflow)?;
        trace!(%agent, %at, taken, left = cell.resource, "resource collected");
        Ok(taken)
    }

    /// Hand `amount` units to the base in `direction`. Returns the base's
    /// new stored total.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotABase`] if the target cell is not a base.
    pub fn deliver(&mut self, agent: AgentId, direction: Direction, amount: u32) -> Result<u32, WorldError> {
        let at = self.target_of(agent, direction)?;
        let cell = self.cell_mut(at).ok_or(WorldError::OutOfBounds(at))?;
        if cell.terrain != Terrain::Base {
            return Err(WorldError::NotABase(at));
        }
        cell.stored = cell
            .stored
            .checked_add(amount)
            .ok_or(WorldError::ArithmeticOverflow)?;
        trace!(%agent, %at, amount, stored = cell.stored, "resource delivered");
        Ok(cell.stored)
    }

    /// Lower the open cell in `direction` by one. Returns its new elevation.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotDiggable`] unless the cell is open ground.
    pub fn dig(&mut self, agent: AgentId, direction: Direction) -> Result<i32, WorldError> {
        let at = self.target_of(agent, direction)?;
        let cell = self.open_cell_mut(at)?;
        cell.elevation = cell
            .elevation
            .checked_sub(1)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(cell.elevation)
    }

    /// Raise the open cell in `direction` (or underfoot) by one. Returns its
    /// new elevation.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotDiggable`] unless the cell is open ground.
    pub fn deposit_dirt(&mut self, agent: AgentId, direction: Direction) -> Result<i32, WorldError> {
        let at = self.target_of(agent, direction)?;
        let cell = self.open_cell_mut(at)?;
        cell.elevation = cell
            .elevation
            .checked_add(1)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(cell.elevation)
    }

    /// Summarize the grid for reporting.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            agents: self.positions.clone(),
            total_stored: self.total_stored(),
            resource_remaining: self.total_resource(),
        }
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn index(&self, position: Position) -> Option<usize> {
        let x = u32::try_from(position.x).ok()?;
        let y = u32::try_from(position.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = u64::from(y)
            .checked_mul(u64::from(self.width))?
            .checked_add(u64::from(x))?;
        usize::try_from(idx).ok()
    }

    fn check_step(&self, from: Position, direction: Direction) -> Result<Position, WorldError> {
        let to = from.offset(direction);
        let target = self.cell(to).ok_or(WorldError::OutOfBounds(to))?;
        if !target.terrain.is_passable() {
            return Err(WorldError::Impassable {
                at: to,
                terrain: target.terrain,
            });
        }
        if let Some(&by) = self.occupants.get(&to) {
            return Err(WorldError::CellOccupied { at: to, by });
        }
        let origin = self.cell(from).map_or(0, |c| c.elevation);
        let rise = i64::from(target.elevation)
            .saturating_sub(i64::from(origin))
            .unsigned_abs();
        if rise > u64::from(self.max_climb) {
            return Err(WorldError::TooSteep {
                from,
                to,
                limit: self.max_climb,
            });
        }
        Ok(to)
    }

    fn target_of(&self, agent: AgentId, direction: Direction) -> Result<Position, WorldError> {
        let from = self
            .position_of(agent)
            .ok_or(WorldError::AgentNotFound(agent))?;
        let at = from.offset(direction);
        if !self.in_bounds(at) {
            return Err(WorldError::OutOfBounds(at));
        }
        Ok(at)
    }

    fn open_cell_mut(&mut self, at: Position) -> Result<&mut Cell, WorldError> {
        let cell = self.cell_mut(at).ok_or(WorldError::OutOfBounds(at))?;
        if cell.terrain != Terrain::Open {
            return Err(WorldError::NotDiggable(at));
        }
        Ok(cell)
    }
}

fn cell_count(width: u32, height: u32) -> Result<usize, WorldError> {
    let count = u64::from(width)
        .checked_mul(u64::from(height))
        .ok_or(WorldError::ArithmeticOverflow)?;
    usize::try_from(count).map_err(|_err| WorldError::ArithmeticOverflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open_map() -> GridMap {
        GridMap::new(10, 10).unwrap()
    }

    #[test]
    fn bounds() {
        let map = open_map();
        assert!(map.in_bounds(Position::new(0, 0)));
        assert!(map.in_bounds(Position::new(9, 9)));
        assert!(!map.in_bounds(Position::new(10, 0)));
        assert!(!map.in_bounds(Position::new(-1, 3)));
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(GridMap::from_cells(2, 2, vec![Cell::open(); 3]).is_err());
        assert!(GridMap::from_cells(2, 2, vec![Cell::open(); 4]).is_ok());
    }

    #[test]
    fn place_and_move_agent() {
        let mut map = open_map();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(2, 2)).unwrap();

        let to = map.apply_move(agent, Direction::NorthEast).unwrap();
        assert_eq!(to, Position::new(3, 3));
        assert_eq!(map.position_of(agent), Some(to));
        assert_eq!(map.occupant(to), Some(agent));
        assert_eq!(map.occupant(Position::new(2, 2)), None);
    }

    #[test]
    fn duplicate_placement_rejected() {
        let mut map = open_map();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(1, 1)).unwrap();
        assert!(matches!(
            map.place_agent(agent, Position::new(2, 2)),
            Err(WorldError::DuplicateAgent(_))
        ));
    }

    #[test]
    fn center_move_is_noop_and_never_walkable() {
        let mut map = open_map();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(4, 4)).unwrap();
        assert!(!map.can_step(agent, Direction::Center));
        assert_eq!(map.apply_move(agent, Direction::Center).unwrap(), Position::new(4, 4));
    }

    #[test]
    fn occupied_cells_block() {
        let mut map = open_map();
        let a = AgentId::new();
        let b = AgentId::new();
        map.place_agent(a, Position::new(1, 1)).unwrap();
        map.place_agent(b, Position::new(2, 1)).unwrap();
        assert!(!map.can_step(a, Direction::East));
        assert!(matches!(
            map.apply_move(a, Direction::East),
            Err(WorldError::CellOccupied { .. })
        ));
    }

    #[test]
    fn walls_and_edges_block() {
        let mut map = open_map();
        map.set_terrain(Position::new(1, 0), Terrain::Wall).unwrap();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(0, 0)).unwrap();
        assert!(!map.can_step(agent, Direction::East));
        assert!(!map.can_step(agent, Direction::West));
        assert!(!map.can_step(agent, Direction::South));
        assert!(map.can_step(agent, Direction::North));
    }

    #[test]
    fn steep_steps_block() {
        let mut map = open_map();
        if let Some(cell) = map.cell_mut(Position::new(1, 0)) {
            cell.elevation = 4;
        }
        if let Some(cell) = map.cell_mut(Position::new(0, 1)) {
            cell.elevation = -3;
        }
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(0, 0)).unwrap();
        assert!(!map.can_step(agent, Direction::East));
        assert!(map.can_step(agent, Direction::North));

        map.set_max_climb(4);
        assert!(map.can_step(agent, Direction::East));
    }

    #[test]
    fn collect_drains_resource() {
        let mut map = open_map();
        if let Some(cell) = map.cell_mut(Position::new(3, 2)) {
            cell.resource = 5;
        }
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(2, 2)).unwrap();

        assert_eq!(map.collect(agent, Direction::East, 3).unwrap(), 3);
        assert_eq!(map.collect(agent, Direction::East, 3).unwrap(), 2);
        assert!(matches!(
            map.collect(agent, Direction::East, 3),
            Err(WorldError::NothingToCollect(_))
        ));
        assert_eq!(map.total_resource(), 0);
    }

    #[test]
    fn deliveries_only_into_bases() {
        let mut map = open_map();
        map.set_terrain(Position::new(5, 5), Terrain::Base).unwrap();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(4, 5)).unwrap();

        assert_eq!(map.deliver(agent, Direction::East, 7).unwrap(), 7);
        assert_eq!(map.deliver(agent, Direction::East, 1).unwrap(), 8);
        assert!(matches!(
            map.deliver(agent, Direction::West, 1),
            Err(WorldError::NotABase(_))
        ));
        assert_eq!(map.total_stored(), 8);
    }

    #[test]
    fn dig_and_deposit_change_elevation() {
        let mut map = open_map();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(5, 5)).unwrap();

        assert_eq!(map.dig(agent, Direction::South).unwrap(), -1);
        assert_eq!(map.deposit_dirt(agent, Direction::Center).unwrap(), 1);
        assert_eq!(map.cell(Position::new(5, 4)).map(|c| c.elevation), Some(-1));
        assert_eq!(map.cell(Position::new(5, 5)).map(|c| c.elevation), Some(1));

        map.set_terrain(Position::new(6, 5), Terrain::Wall).unwrap();
        assert!(matches!(
            map.dig(agent, Direction::East),
            Err(WorldError::NotDiggable(_))
        ));
    }

    #[test]
    fn positions_within_radius() {
        let map = open_map();
        // radius_sq 2 covers the full 3x3 block.
        assert_eq!(map.positions_within(Position::new(5, 5), 2).len(), 9);
        // radius_sq 1 is the plus shape.
        assert_eq!(map.positions_within(Position::new(5, 5), 1).len(), 5);
        // Corners are clipped by the grid.
        assert_eq!(map.positions_within(Position::new(0, 0), 2).len(), 4);
    }

    #[test]
    fn snapshot_serializes() {
        let mut map = open_map();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(3, 3)).unwrap();
        let snapshot = map.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GridSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
