//! Simulation loop runner.
//!
//! [`run_simulation`] drives [`run_turn`] until a stop condition is met and
//! paces turns with a real-time interval. It is the only async code in the
//! workspace; nothing inside a turn awaits.
//!
//! [`run_turn`]: crate::tick::run_turn

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::tick::{self, SimulationState, TickError, TurnSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn failed to execute.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TickError,
    },
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The configured number of turns ran.
    MaxTurnsReached,
    /// There were no agents to run.
    NoAgents,
    /// The callback asked to stop.
    Stopped,
}

/// Limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Stop after this many turns (0 means only the callback can stop the run).
    pub max_turns: u64,
    /// Real-time pause between turns.
    pub turn_interval: Duration,
}

/// Result of the simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last turn summary, if any turn completed.
    pub final_summary: Option<TurnSummary>,
    /// Total number of turns executed.
    pub total_turns: u64,
    /// Agent turns forfeited over the whole run.
    pub total_faults: u64,
}

/// Callback invoked after each turn completes.
pub trait TurnCallback: Send {
    /// Called after a turn completes. Returning `false` stops the run.
    fn on_turn(&mut self, summary: &TurnSummary, state: &SimulationState) -> bool;
}

/// A callback that never stops the run.
#[derive(Debug, Default)]
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary, _state: &SimulationState) -> bool {
        true
    }
}

/// Run turns until a stop condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a turn fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    bounds: RunBounds,
    callback: &mut dyn TurnCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TurnSummary> = None;
    let mut total_turns: u64 = 0;
    let mut total_faults: u64 = 0;

    info!(
        agents = state.agents.len(),
        max_turns = bounds.max_turns,
        turn_interval = ?bounds.turn_interval,
        "Simulation starting"
    );

    if state.agents.is_empty() {
        warn!("No agents to run");
        return Ok(SimulationResult {
            end_reason: EndReason::NoAgents,
            final_summary: None,
            total_turns,
            total_faults,
        });
    }

    loop {
        if bounds.max_turns > 0 && total_turns >= bounds.max_turns {
            info!(turn = state.clock.turn(), max_turns = bounds.max_turns, "Turn limit reached");
            return Ok(SimulationResult {
                end_reason: EndReason::MaxTurnsReached,
                final_summary: last_summary,
                total_turns,
                total_faults,
            });
        }

        let summary = tick::run_turn(state)?;
        total_turns = total_turns.saturating_add(1);
        total_faults = total_faults.saturating_add(u64::try_from(summary.faults.len()).unwrap_or(u64::MAX));

        let keep_going = callback.on_turn(&summary, state);
        last_summary = Some(summary);
        if !keep_going {
            info!(turn = state.clock.turn(), "Stop requested by callback");
            return Ok(SimulationResult {
                end_reason: EndReason::Stopped,
                final_summary: last_summary,
                total_turns,
                total_faults,
            });
        }

        if !bounds.turn_interval.is_zero() {
            tokio::time::sleep(bounds.turn_interval).await;
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_turns = result.total_turns,
        total_faults = result.total_faults,
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            turn = summary.turn,
            total_stored = summary.total_stored,
            resource_remaining = summary.resource_remaining,
            "Final turn summary"
        );
    } else {
        warn!("Simulation ended with no turns executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridwalk_types::{AgentId, Direction, Position};
    use gridwalk_world::GridMap;

    use super::*;
    use crate::bulletin::Bulletin;
    use crate::tick::{Agent, TurnEnv, TurnError, TurnReport};

    /// Paces back and forth between two cells.
    #[derive(Debug)]
    struct Pacer {
        id: AgentId,
        east: bool,
    }

    impl Agent for Pacer {
        fn id(&self) -> AgentId {
            self.id
        }

        fn kind(&self) -> &'static str {
            "pacer"
        }

        fn take_turn(&mut self, env: &mut TurnEnv<'_>) -> Result<TurnReport, TurnError> {
            let direction = if self.east { Direction::East } else { Direction::West };
            if env.world.apply_move(self.id, direction).is_ok() {
                self.east = !self.east;
            }
            Ok(TurnReport {
                state: "pace".to_owned(),
                evaluations: 1,
            })
        }
    }

    fn make_state() -> SimulationState {
        let mut world = GridMap::new(2, 1).unwrap();
        let id = AgentId::new();
        world.place_agent(id, Position::new(0, 0)).unwrap();
        SimulationState::new(world, Bulletin::new(), vec![Box::new(Pacer { id, east: true })])
    }

    fn bounds(max_turns: u64) -> RunBounds {
        RunBounds {
            max_turns,
            turn_interval: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn bounded_by_max_turns() {
        let mut state = make_state();
        let result = run_simulation(&mut state, bounds(5), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::MaxTurnsReached);
        assert_eq!(result.total_turns, 5);
        assert_eq!(result.total_faults, 0);
        assert_eq!(result.final_summary.map(|s| s.turn), Some(5));
    }

    #[tokio::test]
    async fn empty_population_stops_immediately() {
        let mut state = SimulationState::new(GridMap::new(2, 2).unwrap(), Bulletin::new(), Vec::new());
        let result = run_simulation(&mut state, bounds(5), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::NoAgents);
        assert_eq!(result.total_turns, 0);
    }

    #[tokio::test]
    async fn callback_sees_every_turn_and_can_stop() {
        struct StopAt {
            seen: Vec<u64>,
            stop_at: u64,
        }
        impl TurnCallback for StopAt {
            fn on_turn(&mut self, summary: &TurnSummary, _state: &SimulationState) -> bool {
                self.seen.push(summary.turn);
                summary.turn < self.stop_at
            }
        }

        let mut state = make_state();
        let mut cb = StopAt {
            seen: Vec::new(),
            stop_at: 3,
        };
        let result = run_simulation(&mut state, bounds(0), &mut cb).await.unwrap();
        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.total_turns, 3);
        assert_eq!(cb.seen, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn turns_are_paced() {
        let mut state = make_state();
        let start = tokio::time::Instant::now();
        let paced = RunBounds {
            max_turns: 3,
            turn_interval: Duration::from_millis(100),
        };
        run_simulation(&mut state, paced, &mut NoOpCallback).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
