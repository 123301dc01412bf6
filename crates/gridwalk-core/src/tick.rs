//! Turn cycle: one round-robin pass over every agent.
//!
//! Each turn advances the clock, then gives every agent, in spawn order,
//! exactly one call to [`Agent::take_turn`] with exclusive access to the
//! grid and the bulletin. An agent whose state machine faults forfeits its
//! turn; the fault is logged and recorded in the [`TurnSummary`] and the
//! remaining agents still move.
//!
//! The cycle is deterministic given the same initial state and agents.

use std::fmt::Debug;

use gridwalk_types::AgentId;
use gridwalk_world::GridMap;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::bulletin::Bulletin;
use crate::clock::{ClockError, TurnClock};
use crate::executor::ExecutorError;

/// Errors an agent can raise from [`Agent::take_turn`].
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The agent's handlers transitioned without acting until the cap.
    #[error("agent {agent} made no action after {cap} handler evaluations ({trail})")]
    TransitionCycle {
        /// The faulting agent.
        agent: AgentId,
        /// The cap that was hit.
        cap: usize,
        /// States evaluated during the failed tick.
        trail: String,
    },

    /// The agent is not on the grid.
    #[error("agent {agent} is not on the grid")]
    NotPlaced {
        /// The missing agent.
        agent: AgentId,
    },
}

impl TurnError {
    /// Attach an agent to an executor failure.
    pub fn transition_cycle<S: Debug>(agent: AgentId, err: ExecutorError<S>) -> Self {
        let ExecutorError::InvalidTransitionCycle { cap, visited } = err;
        Self::TransitionCycle {
            agent,
            cap,
            trail: format!("{visited:?}"),
        }
    }

    /// The agent the error belongs to.
    pub const fn agent(&self) -> AgentId {
        match *self {
            Self::TransitionCycle { agent, .. } | Self::NotPlaced { agent } => agent,
        }
    }
}

/// Errors that abort a whole turn.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Everything an agent may touch during its turn.
#[derive(Debug)]
pub struct TurnEnv<'a> {
    /// The turn being played.
    pub turn: u64,
    /// The grid.
    pub world: &'a mut GridMap,
    /// The shared broadcast board.
    pub bulletin: &'a mut Bulletin,
}

/// What an agent did with its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// State name after the turn.
    pub state: String,
    /// Handler evaluations spent.
    pub evaluations: usize,
}

/// A grid agent driven by the scheduler.
pub trait Agent: Send + Debug {
    /// The agent's identifier (also its key on the grid).
    fn id(&self) -> AgentId;

    /// Short agent type name for logs and summaries.
    fn kind(&self) -> &'static str;

    /// Play one turn.
    fn take_turn(&mut self, env: &mut TurnEnv<'_>) -> Result<TurnReport, TurnError>;
}

/// An agent that forfeited its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnFault {
    /// The agent.
    pub agent: AgentId,
    /// Its type name.
    pub kind: &'static str,
    /// What went wrong.
    pub message: String,
}

/// Summary of a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    /// The turn number that was executed.
    pub turn: u64,
    /// Agents that completed their turn.
    pub agents_acted: u32,
    /// Agents that forfeited their turn.
    pub faults: Vec<TurnFault>,
    /// Units delivered to bases so far.
    pub total_stored: u64,
    /// Units still on the ground.
    pub resource_remaining: u64,
    /// Bulletin entries published this turn.
    pub bulletin_entries: usize,
}

/// The mutable simulation state passed through the turn cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// The turn clock.
    pub clock: TurnClock,
    /// The grid.
    pub world: GridMap,
    /// The shared broadcast board.
    pub bulletin: Bulletin,
    /// Agents in turn order.
    pub agents: Vec<Box<dyn Agent>>,
}

impl SimulationState {
    /// Bundle a grid, a board, and agents at turn 0.
    pub fn new(world: GridMap, bulletin: Bulletin, agents: Vec<Box<dyn Agent>>) -> Self {
        Self {
            clock: TurnClock::new(),
            world,
            bulletin,
            agents,
        }
    }
}

/// Execute one turn.
///
/// # Errors
///
/// Returns [`TickError`] if the clock cannot advance. Agent failures do not
/// abort the turn; they are reported in [`TurnSummary::faults`].
pub fn run_turn(state: &mut SimulationState) -> Result<TurnSummary, TickError> {
    let turn = state.clock.advance()?;
    let logged_before = state.bulletin.len();
    let mut agents_acted: u32 = 0;
    let mut faults = Vec::new();

    for agent in &mut state.agents {
        let mut env = TurnEnv {
            turn,
            world: &mut state.world,
            bulletin: &mut state.bulletin,
        };
        match agent.take_turn(&mut env) {
            Ok(report) => {
                agents_acted = agents_acted.saturating_add(1);
                debug!(
                    turn,
                    agent = %agent.id(),
                    kind = agent.kind(),
                    state = %report.state,
                    evaluations = report.evaluations,
                    "turn taken"
                );
            }
            Err(err) => {
                match err {
                    TurnError::TransitionCycle { .. } => {
                        error!(turn, agent = %err.agent(), kind = agent.kind(), error = %err, "agent faulted");
                    }
                    TurnError::NotPlaced { .. } => {
                        warn!(turn, agent = %err.agent(), kind = agent.kind(), error = %err, "agent forfeited turn");
                    }
                }
                faults.push(TurnFault {
                    agent: err.agent(),
                    kind: agent.kind(),
                    message: err.to_string(),
                });
            }
        }
    }

    let summary = TurnSummary {
        turn,
        agents_acted,
        faults,
        total_stored: state.world.total_stored(),
        resource_remaining: state.world.total_resource(),
        bulletin_entries: state.bulletin.len().saturating_sub(logged_before),
    };
    debug!(
        turn,
        acted = summary.agents_acted,
        faults = summary.faults.len(),
        stored = summary.total_stored,
        "Turn complete"
    );
    Ok(summary)
}
