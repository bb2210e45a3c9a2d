//! CLI command implementations for Tankland.

pub(crate) mod behaviors;
pub(crate) mod run;
pub(crate) mod validate;
pub(crate) mod watch;

mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::ValueEnum;
use tankland::{Addressing, ArenaConfig, RosterEntry};

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Arena setup shared by `run` and `watch`.
///
/// Flags override whatever the config file says.
#[derive(Debug, clap::Args)]
pub(crate) struct ArenaArgs {
    /// Arena config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tank to add, as NAME=KIND (repeatable)
    #[arg(short, long = "tank", value_name = "NAME=KIND")]
    tanks: Vec<String>,

    /// Board side length
    #[arg(long)]
    size: Option<u16>,

    /// Wrap coordinates around the board edges
    #[arg(long)]
    wrap: bool,

    /// Milliseconds per tick
    #[arg(long)]
    timescale: Option<u64>,

    /// Seed for tank placement and behaviors
    #[arg(short, long)]
    seed: Option<u64>,

    /// Append the event log to this file as JSON lines
    #[arg(long)]
    event_log: Option<PathBuf>,
}

impl ArenaArgs {
    /// Load the config file (or defaults) and apply the flags.
    pub(crate) fn load(&self) -> anyhow::Result<ArenaConfig> {
        let mut config = match &self.config {
            Some(path) => ArenaConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ArenaConfig::default(),
        };

        if let Some(size) = self.size {
            config.board_size = size;
        }
        if self.wrap {
            config.addressing = Addressing::Wrap;
        }
        if let Some(timescale) = self.timescale {
            config.timescale_ms = timescale;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(path) = &self.event_log {
            config.event_log_path = Some(path.clone());
        }
        for spec in &self.tanks {
            config.roster.push(RosterEntry::parse(spec)?);
        }

        config.validate()?;
        Ok(config)
    }
}
