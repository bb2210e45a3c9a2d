//! Error types for the arena.
//!
//! Gameplay failures (no energy, blocked moves, misses) are ordinary
//! outcomes, not errors. Only tank creation, configuration and I/O surface
//! as `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::arena::Location;

/// Why a tank could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    /// Another live tank already uses this name.
    #[error("a tank named {0:?} is already in the arena")]
    DuplicateName(String),
    /// There is no empty cell left.
    #[error("the board has no empty cell")]
    BoardFull,
    /// The requested cell is off the board or not empty.
    #[error("cell {0} is not available")]
    Occupied(Location),
}

/// Problems with an arena configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for an arena.
    #[error("invalid arena config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Boards need at least two cells per side.
    #[error("board size must be at least 2, got {0}")]
    BoardTooSmall(u16),
    /// Tanks need room for some energy.
    #[error("max_energy must be positive")]
    ZeroMaxEnergy,
    /// Pacing needs a real-time unit.
    #[error("timescale_ms must be positive")]
    ZeroTimescale,
    /// A roster line did not look like `name=kind`.
    #[error("invalid tank spec {0:?}, expected name=kind")]
    TankSpec(String),
}

/// Why a roster entry did not get a running tank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// No behavior of that kind is registered.
    #[error("unknown behavior kind {0:?}")]
    UnknownKind(String),
    /// An earlier roster entry already claimed the name.
    #[error("name {0:?} appears more than once")]
    DuplicateName(String),
    /// The arena refused to create the tank.
    #[error(transparent)]
    Create(#[from] CreateError),
}

/// Top-level error for setting up and running an arena.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Event log file or terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for arena setup.
pub type ArenaResult<T> = Result<T, ArenaError>;
