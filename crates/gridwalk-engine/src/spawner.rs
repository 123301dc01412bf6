//! Agent spawner for seeding the grid with couriers and builders.
//!
//! At simulation start the spawner places the configured population on the
//! free open cells closest to the base, couriers first. Each agent's
//! follow side comes from its tuning or, when unset, from an RNG seeded
//! with `world.seed`, so a run is reproducible from its config alone.

use std::sync::Arc;

use gridwalk_agents::{AgentTuning, Builder, Courier};
use gridwalk_core::tick::Agent;
use gridwalk_types::{AgentId, FollowSide, Position};
use gridwalk_world::{GridMap, Terrain};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Parse the `agents` section of a config document.
///
/// A document without an `agents` key (or an empty document) yields the
/// default tuning.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the YAML or the section is malformed,
/// or if the section holds settings the shells cannot work with.
pub fn agent_tuning_from_yaml(contents: &str) -> Result<AgentTuning, EngineError> {
    if contents.trim().is_empty() {
        return Ok(AgentTuning::default());
    }

    // Parse the full YAML and extract just the "agents" section.
    let raw: serde_yml::Value = serde_yml::from_str(contents).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    let tuning: AgentTuning = match raw.get("agents") {
        Some(agents) => serde_yml::from_value(agents.clone()).map_err(|e| EngineError::Spawner {
            message: format!("failed to parse agents config: {e}"),
        })?,
        None => AgentTuning::default(),
    };

    let problems = tuning.validate();
    if !problems.is_empty() {
        return Err(EngineError::Spawner {
            message: format!("invalid agents config: {}", problems.join("; ")),
        });
    }
    Ok(tuning)
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Where and how to seed the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    /// The base agents gather around.
    pub base: Position,
    /// Seed for follow sides and courier RNGs.
    pub seed: u64,
    /// Override for the per-tick evaluation cap.
    pub transition_cap: Option<usize>,
}

/// Spawn the configured couriers and builders and place them on `map`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if there are not enough free cells for
/// the requested population, or [`EngineError::World`] if placement fails.
pub fn spawn_agents(
    tuning: &Arc<AgentTuning>,
    map: &mut GridMap,
    request: &SpawnRequest,
) -> Result<Vec<Box<dyn Agent>>, EngineError> {
    let couriers = population(tuning.population.couriers)?;
    let builders = population(tuning.population.builders)?;
    let wanted = couriers.saturating_add(builders);

    let spots = free_cells_near(map, request.base);
    if spots.len() < wanted {
        return Err(EngineError::Spawner {
            message: format!(
                "requested {wanted} agents but only {} free cells are available",
                spots.len()
            ),
        });
    }

    let mut rng = StdRng::seed_from_u64(request.seed);
    let mut agents: Vec<Box<dyn Agent>> = Vec::with_capacity(wanted);

    for (index, at) in spots.into_iter().take(wanted).enumerate() {
        let id = AgentId::new();
        map.place_agent(id, at)?;

        let agent: Box<dyn Agent> = if index < couriers {
            let side = tuning
                .courier
                .follow_side
                .unwrap_or_else(|| random_side(&mut rng));
            let courier = Courier::new(id, request.base, side, Arc::clone(tuning), rng.random());
            match request.transition_cap {
                Some(cap) => Box::new(courier.with_transition_cap(cap)),
                None => Box::new(courier),
            }
        } else {
            let side = tuning
                .builder
                .follow_side
                .unwrap_or_else(|| random_side(&mut rng));
            let builder = Builder::new(id, side, Arc::clone(tuning));
            match request.transition_cap {
                Some(cap) => Box::new(builder.with_transition_cap(cap)),
                None => Box::new(builder),
            }
        };

        info!(agent = %id, kind = agent.kind(), at = %at, "Spawned agent");
        agents.push(agent);
    }

    Ok(agents)
}

fn population(count: u32) -> Result<usize, EngineError> {
    usize::try_from(count).map_err(|_conversion_err| EngineError::Spawner {
        message: format!("population {count} exceeds usize range"),
    })
}

fn random_side<R: Rng>(rng: &mut R) -> FollowSide {
    if rng.random_bool(0.5) {
        FollowSide::Left
    } else {
        FollowSide::Right
    }
}

/// Unoccupied open cells without resource, closest to `base` first.
fn free_cells_near(map: &GridMap, base: Position) -> Vec<Position> {
    let mut cells: Vec<Position> = map
        .positions_within(base, u64::MAX)
        .into_iter()
        .filter(|p| map.occupant(*p).is_none())
        .filter(|p| {
            map.cell(*p)
                .is_some_and(|cell| cell.terrain == Terrain::Open && !cell.has_resource())
        })
        .collect();
    // Stable sort keeps row order among equal distances.
    cells.sort_by_key(|p| base.distance_squared(*p));
    cells
}
