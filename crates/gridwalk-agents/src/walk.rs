//! Walkability and step execution shared by every shell.
//!
//! The grid decides what terrain can be entered; the shells add the
//! bulletin's hazard zones on top. A step into a hazard is refused unless
//! the agent already stands inside one, so an agent caught in a newly
//! reported zone can still walk out.

use gridwalk_core::{Bulletin, Step};
use gridwalk_types::{AgentId, Direction, Position};
use gridwalk_world::GridAdapter;
use tracing::warn;

/// Whether `agent` may step in `direction`, honouring reported hazards.
pub fn may_step<G: GridAdapter>(grid: &G, bulletin: &Bulletin, agent: AgentId, direction: Direction) -> bool {
    let Some(from) = grid.position_of(agent) else {
        return false;
    };
    if !grid.can_step(agent, direction) {
        return false;
    }
    !bulletin.in_hazard(from.offset(direction)) || bulletin.in_hazard(from)
}

/// What executing a navigator recommendation achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The navigator reports arrival.
    Arrived,
    /// The agent moved and now stands here.
    Moved(Position),
    /// No step was possible this turn.
    Blocked,
}

/// Carry out `step` on the grid.
///
/// A rejected move (the world changed since the predicate was asked) is
/// logged and reported as [`Progress::Blocked`].
pub fn follow<G: GridAdapter>(grid: &mut G, agent: AgentId, step: Step) -> Progress {
    match step {
        Step::Arrived => Progress::Arrived,
        Step::NoMoveAvailable => Progress::Blocked,
        Step::Move(direction) => match grid.apply_move(agent, direction) {
            Ok(position) => Progress::Moved(position),
            Err(err) => {
                warn!(%agent, %direction, error = %err, "move rejected");
                Progress::Blocked
            }
        },
    }
}

/// Counts turns spent on one goal and trips once a limit is exceeded.
///
/// Bug navigation gives no progress guarantee around every obstacle shape,
/// so shells bound how long they chase a single goal. The count restarts
/// whenever the goal changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallGuard {
    goal: Option<Position>,
    turns: u32,
    limit: u32,
}

impl StallGuard {
    /// A guard that trips after `limit` turns on the same goal.
    pub const fn new(limit: u32) -> Self {
        Self {
            goal: None,
            turns: 0,
            limit,
        }
    }

    /// Count one more turn toward `goal`. Returns `true` once the limit is
    /// exceeded.
    pub fn tick(&mut self, goal: Position) -> bool {
        if self.goal != Some(goal) {
            self.goal = Some(goal);
            self.turns = 0;
        }
        self.turns = self.turns.saturating_add(1);
        self.turns > self.limit
    }

    /// Forget the goal and start counting afresh.
    pub const fn reset(&mut self) {
        self.goal = None;
        self.turns = 0;
    }

    /// Turns counted toward the current goal.
    pub const fn turns(&self) -> u32 {
        self.turns
    }
}
