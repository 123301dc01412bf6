//! Turn callback that reports progress and ends finished runs.
//!
//! Every `report_every` turns the callback logs delivery totals. Once every
//! resource unit on the map has been delivered there is nothing left for
//! couriers to do, so it stops the run early. A map that starts without
//! resource is left to run to its turn limit.

use gridwalk_core::runner::TurnCallback;
use gridwalk_core::tick::{SimulationState, TurnSummary};
use tracing::info;

/// Progress reporter for the engine's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCallback {
    total_resource: u64,
    report_every: u64,
}

impl ProgressCallback {
    /// A reporter for a map holding `total_resource` units, logging every
    /// `report_every` turns (0 disables periodic reports).
    pub const fn new(total_resource: u64, report_every: u64) -> Self {
        Self {
            total_resource,
            report_every,
        }
    }
}

impl TurnCallback for ProgressCallback {
    fn on_turn(&mut self, summary: &TurnSummary, state: &SimulationState) -> bool {
        if summary.turn.checked_rem(self.report_every) == Some(0) {
            info!(
                turn = summary.turn,
                total_stored = summary.total_stored,
                resource_remaining = summary.resource_remaining,
                agents = state.agents.len(),
                bulletin_entries = state.bulletin.len(),
                "Progress"
            );
        }

        let delivered_all = self.total_resource > 0
            && summary.resource_remaining == 0
            && summary.total_stored >= self.total_resource;
        if delivered_all {
            info!(turn = summary.turn, total_stored = summary.total_stored, "All resource delivered");
        }
        !delivered_all
    }
}
