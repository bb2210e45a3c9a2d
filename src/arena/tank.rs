//! Tank state management.

use serde::Serialize;

use crate::arena::Location;

/// Maximum (and starting) health of every tank.
pub const MAX_HEALTH: u32 = 100;

/// One life of a tank.
///
/// Names are reused once a tank dies; ids never are. Anything that outlives
/// an action (behavior loops, regeneration, shield expiry) holds the id so
/// it cannot touch a later tank of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TankId(u64);

impl TankId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for TankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State for a single tank.
///
/// Lives inside the world's registry; every mutation happens under the
/// world lock, so the board entry and `location` never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    /// Unique name of this tank.
    name: String,
    /// Which life of `name` this is.
    id: TankId,
    /// Remaining health in `[0, MAX_HEALTH]`.
    health: u32,
    /// Stored energy in `[0, max_energy]`.
    energy: u32,
    /// Energy cap.
    max_energy: u32,
    /// Where the tank stands.
    location: Location,
    /// Fraction of incoming damage blocked, in `[0, 1)`.
    shield: f64,
}

impl Tank {
    /// Create a new tank at full health.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Location, energy: u32, max_energy: u32) -> Self {
        Self {
            name: name.into(),
            id: TankId::default(),
            health: MAX_HEALTH,
            energy: energy.min(max_energy),
            max_energy,
            location,
            shield: 0.0,
        }
    }

    /// Name of the tank.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of this life of the tank.
    #[must_use]
    pub const fn id(&self) -> TankId {
        self.id
    }

    #[must_use]
    pub(crate) const fn with_id(mut self, id: TankId) -> Self {
        self.id = id;
        self
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Current energy.
    #[must_use]
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Energy cap.
    #[must_use]
    pub const fn max_energy(&self) -> u32 {
        self.max_energy
    }

    /// Current location.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Current shield factor.
    #[must_use]
    pub const fn shield(&self) -> f64 {
        self.shield
    }

    /// Whether the tank still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Spend `amount` energy if available.
    ///
    /// Returns `false` and leaves energy untouched when there is not enough.
    pub fn use_energy(&mut self, amount: u32) -> bool {
        if self.energy < amount {
            return false;
        }
        self.energy -= amount;
        true
    }

    /// Add energy, capped at the maximum. Returns the amount actually gained.
    pub fn gain_energy(&mut self, amount: u32) -> u32 {
        let before = self.energy;
        self.energy = self.energy.saturating_add(amount).min(self.max_energy);
        self.energy - before
    }

    /// Heal, capped at `MAX_HEALTH`. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(MAX_HEALTH);
        self.health - before
    }

    /// Apply raw damage through the shield. Returns the damage dealt.
    pub fn take_damage(&mut self, raw: u32) -> u32 {
        let dealt = shielded_damage(raw, self.shield);
        self.health = self.health.saturating_sub(dealt);
        dealt
    }

    /// Zero the tank's health.
    pub fn kill(&mut self) {
        self.health = 0;
    }

    /// Relocate the tank. Callers keep the board in step.
    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Multiply the tank's vulnerability by `portion`.
    pub(crate) fn compound_shield(&mut self, portion: f64) {
        let vulnerability = (1.0 - self.shield) * portion;
        self.shield = (1.0 - vulnerability).clamp(0.0, MAX_SHIELD);
    }

    /// Undo one `compound_shield(portion)`.
    pub(crate) fn release_shield(&mut self, portion: f64) {
        let vulnerability = ((1.0 - self.shield) / portion).min(1.0);
        self.shield = (1.0 - vulnerability).clamp(0.0, MAX_SHIELD);
    }

    /// A serializable copy of the public fields.
    #[must_use]
    pub fn status(&self) -> TankStatus {
        TankStatus {
            name: self.name.clone(),
            health: self.health,
            energy: self.energy,
            shield: self.shield,
            location: self.location,
        }
    }
}

/// Upper bound on the shield so vulnerability never reaches zero.
const MAX_SHIELD: f64 = 1.0 - 1e-9;

/// Damage left after the shield absorbs its share.
#[must_use]
pub fn shielded_damage(raw: u32, shield: f64) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let dealt = (f64::from(raw) * (1.0 - shield)).round().max(0.0) as u32;
    dealt.min(raw)
}

/// Read-only view of a tank handed to renderers and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankStatus {
    /// Tank name.
    pub name: String,
    /// Health.
    pub health: u32,
    /// Energy.
    pub energy: u32,
    /// Shield factor.
    pub shield: f64,
    /// Location.
    pub location: Location,
}
