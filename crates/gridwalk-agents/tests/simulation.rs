//! End-to-end runs of couriers and builders on the default map.
//!
//! These drive the synchronous turn cycle directly, so they run without a
//! runtime or any pacing.

// Integration tests use unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use gridwalk_agents::{AgentTuning, Builder, Courier, plan_wall};
use gridwalk_core::tick::{Agent, SimulationState, TurnSummary, run_turn};
use gridwalk_core::{Bulletin, Fact};
use gridwalk_types::{AgentId, FollowSide, Position};
use gridwalk_world::Layout;

const BASE: Position = Position { x: 11, y: 8 };

fn tuning() -> Arc<AgentTuning> {
    let mut tuning = AgentTuning::default();
    tuning.courier.sense_radius_sq = 64;
    Arc::new(tuning)
}

/// Default map with the base and wall plan already on the bulletin.
fn world(tuning: &AgentTuning) -> (Layout, Bulletin) {
    let layout = Layout::default_layout(40).unwrap();
    assert_eq!(layout.primary_base(), Some(BASE));
    let mut bulletin = Bulletin::new();
    let engine = AgentId::new();
    bulletin.publish(0, engine, Fact::BaseLocated { at: BASE });
    let cells = plan_wall(&layout.map, BASE, &tuning.builder);
    bulletin.publish(0, engine, Fact::WallPlanned { cells });
    (layout, bulletin)
}

fn couriers(layout: &mut Layout, tuning: &Arc<AgentTuning>) -> Vec<Box<dyn Agent>> {
    let spots = [
        (Position::new(12, 8), FollowSide::Left),
        (Position::new(10, 8), FollowSide::Right),
        (Position::new(11, 7), FollowSide::Left),
    ];
    spots
        .into_iter()
        .zip(1_u64..)
        .map(|((at, side), seed)| {
            let id = AgentId::new();
            layout.map.place_agent(id, at).unwrap();
            Box::new(Courier::new(id, BASE, side, Arc::clone(tuning), seed)) as Box<dyn Agent>
        })
        .collect()
}

fn run(state: &mut SimulationState, turns: u64) -> Vec<TurnSummary> {
    (0..turns).map(|_| run_turn(state).unwrap()).collect()
}

#[test]
fn couriers_fill_the_base() {
    let tuning = tuning();
    let (mut layout, bulletin) = world(&tuning);
    let agents = couriers(&mut layout, &tuning);
    let mut state = SimulationState::new(layout.map, bulletin, agents);

    let summaries = run(&mut state, 300);

    let last = summaries.last().unwrap();
    assert!(last.total_stored > 0);
    assert!(summaries.iter().all(|s| s.faults.is_empty()));
    assert!(summaries.iter().all(|s| s.agents_acted == 3));
    assert!(!state.bulletin.is_empty());
}

#[test]
fn stored_and_remaining_account_for_every_unit() {
    let tuning = tuning();
    let (mut layout, bulletin) = world(&tuning);
    let total = layout.map.total_resource();
    let agents = couriers(&mut layout, &tuning);
    let mut state = SimulationState::new(layout.map, bulletin, agents);

    for summary in run(&mut state, 120) {
        // Units in transit are the only ones missing from the two totals.
        assert!(summary.total_stored.saturating_add(summary.resource_remaining) <= total);
    }
}

#[test]
fn builder_raises_wall_while_couriers_work() {
    let tuning = tuning();
    let (mut layout, bulletin) = world(&tuning);
    let plan = bulletin.wall_plan().to_vec();
    assert!(!plan.is_empty());

    let mut agents = couriers(&mut layout, &tuning);
    let id = AgentId::new();
    layout.map.place_agent(id, Position::new(12, 7)).unwrap();
    agents.push(Box::new(Builder::new(id, FollowSide::Right, Arc::clone(&tuning))));
    let mut state = SimulationState::new(layout.map, bulletin, agents);

    let summaries = run(&mut state, 300);

    assert!(summaries.iter().all(|s| s.faults.is_empty()));
    assert!(summaries.last().unwrap().total_stored > 0);
    let raised = plan
        .iter()
        .filter(|slot| state.world.cell(**slot).is_some_and(|c| c.elevation > 0))
        .count();
    assert!(raised > 0);
}
