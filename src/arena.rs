//! Arena rules for Tankland.
//!
//! Implements the world-state engine the executor drives:
//! - Board of cells holding tanks and mines (walls off-grid)
//! - Tanks with health, energy and shields
//! - Action cost table
//! - Combat and sensing rules
//! - Lifecycle hooks run on every commit

mod board;
pub mod combat;
pub mod costs;
pub mod invariants;
mod tank;
mod world;

pub use board::{Addressing, Board, Direction, Location, Occupant, OccupantKind};
pub use combat::{Effect, Sightings};
pub use costs::Action;
pub use tank::{MAX_HEALTH, Tank, TankId, TankStatus, shielded_damage};
pub use world::{CellSnapshot, Snapshot, World, WorldEvent};
