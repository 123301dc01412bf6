//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gridwalk_core::config::ConfigError,
    },

    /// The layout file could not be read.
    #[error("failed to read layout {path}: {source}")]
    Layout {
        /// Path that was tried.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Grid construction or placement failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: gridwalk_world::WorldError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: gridwalk_core::runner::RunnerError,
    },

    /// Agent spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
