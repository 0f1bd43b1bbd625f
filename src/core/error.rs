//! Error types for the outer ring of the engine.
//!
//! The game loop itself never fails: races between players and the dealer
//! resolve to no-ops. Errors only come from loading configuration and from
//! starting threads.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A game could not be started.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    Panicked(String),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
