//! The narrow grid interface agent shells consume.
//!
//! Navigation never touches the grid directly: a shell turns
//! [`GridAdapter::can_step`] into the walkability predicate it hands to the
//! navigator, and calls [`GridAdapter::apply_move`] itself with the
//! direction the navigator recommends.

use gridwalk_types::{AgentId, Direction, Position};

use crate::error::WorldError;
use crate::grid::GridMap;

/// Adjacency, walkability, and single-step movement on a grid.
pub trait GridAdapter {
    /// Where the agent currently stands.
    fn position_of(&self, agent: AgentId) -> Option<Position>;

    /// Whether the agent may step one cell in `direction` right now.
    fn can_step(&self, agent: AgentId, direction: Direction) -> bool;

    /// Execute a one-cell step. Returns the new position.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the agent is unknown or the step is illegal.
    fn apply_move(&mut self, agent: AgentId, direction: Direction) -> Result<Position, WorldError>;
}

impl GridAdapter for GridMap {
    fn position_of(&self, agent: AgentId) -> Option<Position> {
        Self::position_of(self, agent)
    }

    fn can_step(&self, agent: AgentId, direction: Direction) -> bool {
        Self::can_step(self, agent, direction)
    }

    fn apply_move(&mut self, agent: AgentId, direction: Direction) -> Result<Position, WorldError> {
        Self::apply_move(self, agent, direction)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn walk_east<G: GridAdapter>(grid: &mut G, agent: AgentId, steps: usize) -> Option<Position> {
        for _ in 0..steps {
            if !grid.can_step(agent, Direction::East) {
                break;
            }
            grid.apply_move(agent, Direction::East).ok()?;
        }
        grid.position_of(agent)
    }

    #[test]
    fn grid_map_is_an_adapter() {
        let mut map = GridMap::new(5, 1).unwrap();
        let agent = AgentId::new();
        map.place_agent(agent, Position::new(0, 0)).unwrap();
        assert_eq!(walk_east(&mut map, agent, 10), Some(Position::new(4, 0)));
    }
}
