//! Configuration loading and typed config structures for the Gridwalk
//! simulation.
//!
//! The canonical configuration lives in `gridwalk-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file)
//! yields a runnable simulation on the built-in layout. The `agents`
//! section belongs to the agent shells and is parsed by the engine
//! separately.

use std::path::Path;

use serde::Deserialize;

use crate::bulletin::Hazard;

/// Environment variable overriding `world.layout_path`.
pub const LAYOUT_ENV_VAR: &str = "GRIDWALK_LAYOUT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `gridwalk-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, pacing, layout).
    #[serde(default)]
    pub world: WorldConfig,

    /// Grid movement rules.
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// State machine settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `GRIDWALK_LAYOUT` environment variable overrides
    /// `world.layout_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config
            .world
            .apply_layout_override(std::env::var(LAYOUT_ENV_VAR).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string exactly as written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between turns (0 runs flat out).
    #[serde(default = "default_turn_interval_ms")]
    pub turn_interval_ms: u64,

    /// Stop after this many turns.
    #[serde(default = "default_max_turns")]
    pub max_turns: u64,

    /// ASCII layout file; the built-in layout is used when absent.
    #[serde(default)]
    pub layout_path: Option<String>,

    /// Resource units placed on each `*` cell of the layout.
    #[serde(default = "default_resource_per_cell")]
    pub resource_per_cell: u32,
}

impl WorldConfig {
    /// Replace `layout_path` with a non-empty override.
    pub fn apply_layout_override(&mut self, value: Option<String>) {
        if let Some(path) = value.filter(|v| !v.trim().is_empty()) {
            self.layout_path = Some(path);
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            turn_interval_ms: default_turn_interval_ms(),
            max_turns: default_max_turns(),
            layout_path: None,
            resource_per_cell: default_resource_per_cell(),
        }
    }
}

/// Grid movement rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavigationConfig {
    /// Maximum elevation difference a single step may cross.
    #[serde(default = "default_max_climb")]
    pub max_climb: u32,

    /// Zones reported on the bulletin before the first turn.
    #[serde(default)]
    pub hazards: Vec<Hazard>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_climb: default_max_climb(),
            hazards: Vec::new(),
        }
    }
}

/// State machine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    /// Handler evaluations allowed per tick. Defaults to the number of
    /// states of each agent type.
    #[serde(default)]
    pub transition_cap: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "Gridwalk".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_turn_interval_ms() -> u64 {
    0
}

const fn default_max_turns() -> u64 {
    500
}

const fn default_resource_per_cell() -> u32 {
    40
}

const fn default_max_climb() -> u32 {
    gridwalk_world::DEFAULT_MAX_CLIMB
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.max_turns, 500);
        assert_eq!(config.world.resource_per_cell, 40);
        assert_eq!(config.navigation.max_climb, 3);
        assert!(config.navigation.hazards.is_empty());
        assert_eq!(config.executor.transition_cap, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test World"
  seed: 7
  turn_interval_ms: 25
  max_turns: 80
  layout_path: "maps/ring.txt"
  resource_per_cell: 12

navigation:
  max_climb: 1
  hazards:
    - center: { x: 4, y: 6 }
      radius_sq: 2

executor:
  transition_cap: 9

logging:
  level: "debug"
  json: true

agents:
  couriers: 3
"#;
        let config = SimulationConfig::parse_without_env(yaml).unwrap();
        assert_eq!(config.world.name, "Test World");
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.turn_interval_ms, 25);
        assert_eq!(config.world.max_turns, 80);
        assert_eq!(config.world.layout_path.as_deref(), Some("maps/ring.txt"));
        assert_eq!(config.world.resource_per_cell, 12);
        assert_eq!(config.navigation.max_climb, 1);
        assert_eq!(
            config.navigation.hazards,
            vec![Hazard {
                center: gridwalk_types::Position::new(4, 6),
                radius_sq: 2,
            }]
        );
        assert_eq!(config.executor.transition_cap, Some(9));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = SimulationConfig::parse_without_env("world:\n  seed: 99\n").unwrap();
        assert_eq!(config.world.seed, 99);
        assert_eq!(config.world.name, "Gridwalk");
        assert_eq!(config.navigation, NavigationConfig::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = SimulationConfig::parse_without_env("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SimulationConfig::parse_without_env("world: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn layout_override_replaces_path() {
        let mut world = WorldConfig::default();
        world.apply_layout_override(Some("custom.txt".to_owned()));
        assert_eq!(world.layout_path.as_deref(), Some("custom.txt"));

        world.apply_layout_override(Some("   ".to_owned()));
        world.apply_layout_override(None);
        assert_eq!(world.layout_path.as_deref(), Some("custom.txt"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/gridwalk-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
