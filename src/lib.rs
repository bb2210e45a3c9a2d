// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Tankland: a concurrent arena where programmed tanks fight on a shared grid.
//!
//! Every tank is driven by its own task. Acting costs energy and real time,
//! and all world changes go through one critical section so no task ever
//! observes a half-applied effect.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Scheduler (behavior, regen,        │
//! │  supervisor and broadcast tasks)    │
//! ├─────────────────────────────────────┤
//! │  Executor (cost protocol, pacing)   │──▶ Event Log ──▶ Renderer
//! ├─────────────────────────────────────┤
//! │  Arena rules (board, tanks, combat) │
//! └─────────────────────────────────────┘
//! ```

pub mod arena;
pub mod behavior;
pub mod behaviors;
pub mod config;
pub mod error;
pub mod event_log;
pub mod executor;
pub mod logging;
pub mod render;
pub mod scheduler;

pub use arena::{Action, Addressing, Direction, Effect, Location, OccupantKind, Snapshot, TankId, TankStatus};
pub use behavior::{AdmissionReport, Behavior, BehaviorCatalog, BehaviorFuture};
pub use config::{ArenaConfig, RosterEntry};
pub use error::{AdmissionError, ArenaError, ConfigError, CreateError};
pub use executor::{ActionOutcome, Arena, MatchOutcome, Rejection, TankHandle};
pub use scheduler::{TankExit, TankTask};
