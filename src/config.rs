//! Arena configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is a valid
//! arena. The CLI overrides individual fields after loading.
//!
//! ```toml
//! board_size = 12
//! addressing = "wrap"
//! timescale_ms = 20
//!
//! [[tank]]
//! name = "alpha"
//! kind = "sniper"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::arena::Addressing;
use crate::error::ConfigError;

/// One requested tank: a unique name and the behavior kind that drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Tank name.
    pub name: String,
    /// Behavior kind from the catalog.
    pub kind: String,
}

impl RosterEntry {
    /// Parse a `name=kind` command-line spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TankSpec`] if either side is missing.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        match spec.split_once('=') {
            Some((name, kind)) if !name.trim().is_empty() && !kind.trim().is_empty() => Ok(Self {
                name: name.trim().to_owned(),
                kind: kind.trim().to_owned(),
            }),
            _ => Err(ConfigError::TankSpec(spec.to_owned())),
        }
    }
}

/// Everything needed to set up an arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Side length of the square board.
    pub board_size: u16,
    /// How off-grid coordinates resolve.
    pub addressing: Addressing,
    /// Energy cap per tank.
    pub max_energy: u32,
    /// Energy a new tank starts with.
    pub starting_energy: u32,
    /// Real-time length of one tick, in milliseconds.
    pub timescale_ms: u64,
    /// Energy granted by each regeneration pulse.
    pub regen_amount: u32,
    /// Time between regeneration pulses, in milliseconds.
    pub regen_interval_ms: u64,
    /// Time between renderer pushes, in milliseconds.
    pub broadcast_interval_ms: u64,
    /// Seed for tank placement.
    pub seed: u64,
    /// Where to append the event log as JSON lines.
    pub event_log_path: Option<PathBuf>,
    /// Tanks to start.
    #[serde(rename = "tank")]
    pub roster: Vec<RosterEntry>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            board_size: 10,
            addressing: Addressing::Clip,
            max_energy: 100,
            starting_energy: 100,
            timescale_ms: 50,
            regen_amount: 1,
            regen_interval_ms: 500,
            broadcast_interval_ms: 200,
            seed: 0,
            event_log_path: None,
            roster: Vec::new(),
        }
    }
}

impl ArenaConfig {
    /// Parse a config from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check values the arena cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size < 2 {
            return Err(ConfigError::BoardTooSmall(self.board_size));
        }
        if self.max_energy == 0 {
            return Err(ConfigError::ZeroMaxEnergy);
        }
        if self.timescale_ms == 0 {
            return Err(ConfigError::ZeroTimescale);
        }
        Ok(())
    }

    /// One tick of real time.
    #[must_use]
    pub const fn timescale(&self) -> Duration {
        Duration::from_millis(self.timescale_ms)
    }

    /// Time between regeneration pulses (at least one millisecond).
    #[must_use]
    pub fn regen_interval(&self) -> Duration {
        Duration::from_millis(self.regen_interval_ms.max(1))
    }

    /// Time between renderer pushes (at least one millisecond).
    #[must_use]
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms.max(1))
    }
}
