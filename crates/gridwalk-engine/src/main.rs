//! Simulation binary for Gridwalk.
//!
//! This is the entry point that wires together configuration, the grid,
//! the shared bulletin, the agent spawner, and the turn loop. It runs until
//! the turn limit is reached or every resource unit has been delivered.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gridwalk-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the layout (file or built-in) and apply movement rules
//! 4. Publish the base location, configured hazards, and the wall plan on
//!    the bulletin
//! 5. Spawn couriers and builders around the base
//! 6. Run the simulation loop
//! 7. Log the result and print it with a grid snapshot as one JSON line

mod error;
mod progress;
mod spawner;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gridwalk_agents::{AgentTuning, plan_wall};
use gridwalk_core::config::{LoggingConfig, SimulationConfig, WorldConfig};
use gridwalk_core::runner::{self, RunBounds, SimulationResult};
use gridwalk_core::tick::SimulationState;
use gridwalk_core::{Bulletin, Fact};
use gridwalk_types::AgentId;
use gridwalk_world::{GridSnapshot, Layout};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;
use crate::spawner::SpawnRequest;

/// Configuration file, relative to the working directory.
const CONFIG_PATH: &str = "gridwalk-config.yaml";

/// Turns between progress reports.
const REPORT_EVERY: u64 = 50;

/// The end-of-run line printed to stdout.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    result: &'a SimulationResult,
    grid: GridSnapshot,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is configured from it, so this comes first.
    let config_path = Path::new(CONFIG_PATH);
    let config_found = config_path.exists();
    let config = load_config(config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("gridwalk-engine starting");
    if !config_found {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        turn_interval_ms = config.world.turn_interval_ms,
        max_turns = config.world.max_turns,
        "Configuration loaded"
    );

    // 3. Load the layout.
    let mut layout = load_layout(&config.world)?;
    layout.map.set_max_climb(config.navigation.max_climb);
    let base = layout.primary_base().ok_or_else(|| EngineError::Spawner {
        message: String::from("layout has no base cell"),
    })?;
    info!(
        width = layout.map.width(),
        height = layout.map.height(),
        %base,
        resource_cells = layout.resources.len(),
        max_climb = layout.map.max_climb(),
        "Layout loaded"
    );

    // 4. Seed the bulletin.
    let tuning = Arc::new(load_agent_tuning(config_path)?);
    let mut bulletin = Bulletin::new();
    let engine_id = AgentId::new();
    bulletin.publish(0, engine_id, Fact::BaseLocated { at: base });
    for hazard in &config.navigation.hazards {
        bulletin.publish(0, engine_id, Fact::HazardReported { hazard: *hazard });
    }
    if !bulletin.hazards().is_empty() {
        info!(hazards = bulletin.hazards().len(), "Hazards reported");
    }
    let cells = plan_wall(&layout.map, base, &tuning.builder);
    info!(
        slots = cells.len(),
        radius = tuning.builder.wall_radius,
        gates = tuning.builder.gates,
        "Wall planned"
    );
    bulletin.publish(0, engine_id, Fact::WallPlanned { cells });

    // 5. Spawn agents.
    info!(
        couriers = tuning.population.couriers,
        builders = tuning.population.builders,
        "Agent tuning loaded"
    );
    let request = SpawnRequest {
        base,
        seed: config.world.seed,
        transition_cap: config.executor.transition_cap,
    };
    let agents = spawner::spawn_agents(&tuning, &mut layout.map, &request)?;
    info!(agents_spawned = agents.len(), "Agents spawned");

    // 6. Run the simulation.
    let total_resource = layout
        .map
        .total_resource()
        .saturating_add(layout.map.total_stored());
    let mut state = SimulationState::new(layout.map, bulletin, agents);
    let bounds = RunBounds {
        max_turns: config.world.max_turns,
        turn_interval: Duration::from_millis(config.world.turn_interval_ms),
    };
    let mut callback = ProgressCallback::new(total_resource, REPORT_EVERY);
    let result = runner::run_simulation(&mut state, bounds, &mut callback).await?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    let report = RunReport {
        result: &result,
        grid: state.world.snapshot(),
    };
    println!("{}", serde_json::to_string(&report)?);

    info!(
        end_reason = ?result.end_reason,
        total_turns = result.total_turns,
        "gridwalk-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the main simulation configuration, falling back to defaults when
/// the file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        // No file to read, but the layout override still applies.
        Ok(SimulationConfig::parse("")?)
    }
}

/// Load the `agents` section from the config file.
fn load_agent_tuning(path: &Path) -> Result<AgentTuning, EngineError> {
    if !path.exists() {
        return Ok(AgentTuning::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    spawner::agent_tuning_from_yaml(&contents)
}

/// Parse the configured layout file, or the built-in layout when none is set.
fn load_layout(world: &WorldConfig) -> Result<Layout, EngineError> {
    match world.layout_path.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| EngineError::Layout {
                path: path.to_owned(),
                source,
            })?;
            Ok(Layout::parse(&text, world.resource_per_cell)?)
        }
        None => Ok(Layout::default_layout(world.resource_per_cell)?),
    }
}
