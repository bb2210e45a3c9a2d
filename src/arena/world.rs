//! World state: the board and tank registry that change together.
//!
//! A `World` is the unit of atomicity. Callers hold it exclusively while
//! they read and modify it, then call [`World::commit`] before letting go so
//! that deaths and victories are detected against a consistent state.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::arena::{Board, Location, Occupant, OccupantKind, Tank, TankId, TankStatus, invariants};
use crate::error::CreateError;

/// Something the lifecycle hooks noticed during a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A tank ran out of health and was removed.
    Died {
        /// Tank name.
        name: String,
    },
    /// Only one tank remains.
    Victory {
        /// The survivor.
        name: String,
    },
}

impl std::fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Died { name } => write!(f, "{name} has been destroyed"),
            Self::Victory { name } => write!(f, "{name} is the last tank standing"),
        }
    }
}

/// One non-empty cell in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    /// Cell location.
    pub location: Location,
    /// What is there.
    pub kind: OccupantKind,
    /// Tank details when `kind` is a tank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank: Option<TankStatus>,
}

/// Consistent read-only copy of the board and registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Board side length.
    pub size: u16,
    /// Occupied cells, row by row.
    pub cells: Vec<CellSnapshot>,
    /// Live tanks in name order.
    pub tanks: Vec<TankStatus>,
}

impl Snapshot {
    /// Find the snapshot entry for a location.
    #[must_use]
    pub fn cell(&self, location: Location) -> Option<&CellSnapshot> {
        self.cells.iter().find(|cell| cell.location == location)
    }
}

/// Board plus registry.
#[derive(Debug, Clone)]
pub struct World {
    /// The grid.
    board: Board,
    /// Live tanks by name.
    tanks: BTreeMap<String, Tank>,
    /// Energy cap for new tanks.
    max_energy: u32,
    /// Energy new tanks start with.
    starting_energy: u32,
    /// Registry size seen by the last commit.
    last_population: usize,
    /// Id handed to the next tank created.
    next_id: u64,
    /// Placement randomness.
    rng: ChaCha8Rng,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(board: Board, max_energy: u32, starting_energy: u32, seed: u64) -> Self {
        Self {
            board,
            tanks: BTreeMap::new(),
            max_energy,
            starting_energy: starting_energy.min(max_energy),
            last_population: 0,
            next_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board.
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Energy cap for tanks in this world.
    #[must_use]
    pub const fn max_energy(&self) -> u32 {
        self.max_energy
    }

    /// Look up a live tank.
    #[must_use]
    pub fn tank(&self, name: &str) -> Option<&Tank> {
        self.tanks.get(name)
    }

    /// Look up a live tank for modification.
    pub fn tank_mut(&mut self, name: &str) -> Option<&mut Tank> {
        self.tanks.get_mut(name)
    }

    /// Look up one particular life of a tank.
    ///
    /// `None` if the name is free or now belongs to a later tank.
    #[must_use]
    pub fn incarnation(&self, name: &str, id: TankId) -> Option<&Tank> {
        self.tanks.get(name).filter(|tank| tank.id() == id)
    }

    /// Mutable form of [`World::incarnation`].
    pub fn incarnation_mut(&mut self, name: &str, id: TankId) -> Option<&mut Tank> {
        self.tanks.get_mut(name).filter(|tank| tank.id() == id)
    }

    /// Live tanks in name order.
    pub fn tanks(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.values()
    }

    /// Number of registered tanks.
    #[must_use]
    pub fn population(&self) -> usize {
        self.tanks.len()
    }

    /// Create a tank at a uniformly random empty cell.
    ///
    /// # Errors
    ///
    /// Fails without touching the world if the name is taken or the board
    /// has no empty cell.
    pub fn create_tank(&mut self, name: &str) -> Result<Location, CreateError> {
        if self.tanks.contains_key(name) {
            return Err(CreateError::DuplicateName(name.to_owned()));
        }
        let empty = self.board.empty_cells();
        let Some(&location) = empty.choose(&mut self.rng) else {
            return Err(CreateError::BoardFull);
        };
        self.insert_tank(name, location);
        Ok(location)
    }

    /// Create a tank at a chosen empty cell.
    ///
    /// # Errors
    ///
    /// Fails without touching the world if the name is taken or the cell is
    /// not empty.
    pub fn create_tank_at(&mut self, name: &str, location: Location) -> Result<Location, CreateError> {
        if self.tanks.contains_key(name) {
            return Err(CreateError::DuplicateName(name.to_owned()));
        }
        let location = self
            .board
            .resolve(location)
            .filter(|&loc| self.board.occupant_at(loc).is_empty())
            .ok_or(CreateError::Occupied(location))?;
        self.insert_tank(name, location);
        Ok(location)
    }

    fn insert_tank(&mut self, name: &str, location: Location) {
        let id = TankId::new(self.next_id);
        self.next_id += 1;
        let tank = Tank::new(name, location, self.starting_energy, self.max_energy).with_id(id);
        self.board.place(location, Occupant::Tank(name.to_owned()));
        self.tanks.insert(name.to_owned(), tank);
        self.last_population = self.tanks.len();
    }

    /// Move a tank's board entry and record. The destination must be empty.
    pub(crate) fn relocate(&mut self, name: &str, to: Location) -> bool {
        let Some(to) = self.board.resolve(to) else {
            return false;
        };
        if !self.board.occupant_at(to).is_empty() {
            return false;
        }
        let Some(tank) = self.tanks.get_mut(name) else {
            return false;
        };
        let from = tank.location();
        tank.set_location(to);
        self.board.clear(from);
        self.board.place(to, Occupant::Tank(name.to_owned()));
        true
    }

    /// Zero a tank's health. It is removed at the next commit.
    pub fn kill(&mut self, name: &str) -> bool {
        match self.tanks.get_mut(name) {
            Some(tank) => {
                tank.kill();
                true
            }
            None => false,
        }
    }

    /// Zero every tank's health.
    pub fn kill_all(&mut self) {
        for tank in self.tanks.values_mut() {
            tank.kill();
        }
    }

    /// Run the lifecycle hooks after an update.
    ///
    /// Removes every dead tank from the board and registry (reporting each
    /// exactly once) and reports a victory when the registry shrank from
    /// more than one tank to exactly one.
    pub fn commit(&mut self) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        let dead: Vec<String> = self
            .tanks
            .values()
            .filter(|tank| !tank.is_alive())
            .map(|tank| tank.name().to_owned())
            .collect();

        for name in dead {
            if let Some(tank) = self.tanks.remove(&name) {
                let location = tank.location();
                if matches!(self.board.occupant_at(location), Occupant::Tank(held) if *held == name) {
                    self.board.clear(location);
                }
                events.push(WorldEvent::Died { name });
            }
        }

        let population = self.tanks.len();
        if self.last_population > 1
            && population == 1
            && let Some(name) = self.tanks.keys().next()
        {
            events.push(WorldEvent::Victory { name: name.clone() });
        }
        self.last_population = population;

        invariants::assert_invariants(self);
        events
    }

    /// Take a consistent copy of the board and registry.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let cells = self
            .board
            .iter()
            .filter_map(|(location, occupant)| {
                let kind = occupant.kind()?;
                let tank = match occupant {
                    Occupant::Tank(name) => self.tanks.get(name).map(Tank::status),
                    _ => None,
                };
                Some(CellSnapshot {
                    location,
                    kind,
                    tank,
                })
            })
            .collect();

        Snapshot {
            size: self.board.size(),
            cells,
            tanks: self.tanks.values().map(Tank::status).collect(),
        }
    }
}
