//! Combat and sensing rules.
//!
//! Every function here is a pure state transition on a [`World`] the caller
//! already holds exclusively. Energy has been paid by the time these run;
//! they only apply the effect.
//!
//! Damage always goes through the target's shield:
//! `dealt = round(raw × (1 − shield))`.

use std::collections::BTreeMap;

use crate::arena::costs::{ARTILLERY_DAMAGE, energy_gain};
use crate::arena::{Action, Direction, Location, Occupant, OccupantKind, TankId, World};

/// Longest ray or widest radius a sensor will walk.
const MAX_REACH: u32 = 1 << 12;

/// What a scan saw, keyed by location. Empty cells are left out.
pub type Sightings = BTreeMap<Location, OccupantKind>;

/// Result of applying an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The tank moved into an empty cell.
    Moved {
        /// New location.
        to: Location,
    },
    /// The tank drove over a mine, took its damage and moved in.
    MineTriggered {
        /// New location.
        to: Location,
        /// Damage taken.
        damage: u32,
    },
    /// The destination was occupied.
    Blocked {
        /// What was in the way.
        by: OccupantKind,
    },
    /// A mine now sits on the cell.
    MinePlaced {
        /// Mine location.
        at: Location,
        /// Total mine damage after combining.
        damage: u32,
    },
    /// A mine was laid directly under another tank and went off.
    Hit {
        /// Tank that was hit.
        target: String,
        /// Damage dealt after shields.
        damage: u32,
    },
    /// Nothing was hit.
    Miss,
    /// Result of a defuse attempt.
    Defused {
        /// Damage of the removed mine, if there was one.
        removed: Option<u32>,
    },
    /// What a scan saw.
    Sighted(Sightings),
    /// Health restored.
    Repaired {
        /// Health actually gained.
        healed: u32,
    },
    /// Energy restored.
    Recharged {
        /// Energy actually gained.
        gained: u32,
    },
    /// Shield raised.
    Shielded {
        /// Shield factor after activation.
        shield: f64,
    },
}

impl Effect {
    /// Whether the effect changed the board or a tank.
    ///
    /// Scans only read; everything else is worth recording.
    #[must_use]
    pub const fn changes_state(&self) -> bool {
        !matches!(self, Self::Sighted(_))
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moved { to } => write!(f, "moved to {to}"),
            Self::MineTriggered { to, damage } => {
                write!(f, "hit a mine for {damage} damage entering {to}")
            }
            Self::Blocked { by } => write!(f, "blocked by a {by}"),
            Self::MinePlaced { at, damage } => write!(f, "mine of {damage} at {at}"),
            Self::Hit { target, damage } => write!(f, "hit {target} for {damage} damage"),
            Self::Miss => write!(f, "missed"),
            Self::Defused { removed: Some(damage) } => write!(f, "defused a mine of {damage}"),
            Self::Defused { removed: None } => write!(f, "found nothing to defuse"),
            Self::Sighted(seen) => write!(f, "saw {} objects", seen.len()),
            Self::Repaired { healed } => write!(f, "repaired {healed} health"),
            Self::Recharged { gained } => write!(f, "recharged {gained} energy"),
            Self::Shielded { shield } => write!(f, "shield at {:.0}%", shield * 100.0),
        }
    }
}

/// Apply `action` for the tank `name`.
///
/// Returns `None` if the tank is not in the world.
pub fn apply(world: &mut World, name: &str, action: &Action) -> Option<Effect> {
    match *action {
        Action::Move(dir) => move_tank(world, name, dir),
        Action::PlaceMine { damage, dir } => place_mine(world, name, damage, dir),
        Action::DefuseMine(dir) => defuse_mine(world, name, dir),
        Action::ScanLine { dir, distance } => scan_line(world, name, dir, distance).map(Effect::Sighted),
        Action::ScanArea { radius } => scan_area(world, name, radius).map(Effect::Sighted),
        Action::FireArtillery(target) => fire_artillery(world, name, target),
        Action::FireBullet(dir) => fire_bullet(world, name, dir),
        Action::Repair(amount) => repair(world, name, amount),
        Action::Recharge(_) => {
            let gain = energy_gain(action);
            let tank = world.tank_mut(name)?;
            Some(Effect::Recharged {
                gained: tank.gain_energy(gain),
            })
        }
        Action::ActivateShield { portion, .. } => activate_shield(world, name, portion),
    }
}

/// Deal raw damage to whatever tank stands on `at`.
fn damage_tank_at(world: &mut World, at: Location, raw: u32) -> Option<Effect> {
    let Occupant::Tank(target) = world.board().occupant_at(at).clone() else {
        return None;
    };
    let tank = world.tank_mut(&target)?;
    let damage = tank.take_damage(raw);
    Some(Effect::Hit { target, damage })
}

/// Step to the neighbouring cell in `dir`.
///
/// Mines are resolved first: their damage is taken, they are cleared, and
/// the tank then enters the now-empty cell. Tanks and walls block.
pub fn move_tank(world: &mut World, name: &str, dir: Direction) -> Option<Effect> {
    let from = world.tank(name)?.location();
    let to = from.step(dir);

    match world.board().occupant_at(to).clone() {
        Occupant::Empty => {
            world.relocate(name, to);
            let to = world.tank(name)?.location();
            Some(Effect::Moved { to })
        }
        Occupant::Mine(raw) => {
            let damage = world.tank_mut(name)?.take_damage(raw);
            world.board_mut().clear(to);
            world.relocate(name, to);
            let to = world.tank(name)?.location();
            Some(Effect::MineTriggered { to, damage })
        }
        Occupant::Tank(_) => Some(Effect::Blocked {
            by: OccupantKind::Tank,
        }),
        Occupant::Wall => Some(Effect::Blocked {
            by: OccupantKind::Wall,
        }),
    }
}

/// Lay a mine of `damage` on the neighbour in `dir`.
///
/// An existing mine absorbs the new one (damages add up). A tank on the
/// cell sets the mine off immediately.
pub fn place_mine(world: &mut World, name: &str, damage: u32, dir: Direction) -> Option<Effect> {
    let at = world.tank(name)?.location().step(dir);

    let total = match world.board().occupant_at(at) {
        Occupant::Empty => damage,
        Occupant::Mine(existing) => existing.saturating_add(damage),
        Occupant::Tank(_) => return damage_tank_at(world, at, damage),
        Occupant::Wall => return Some(Effect::Miss),
    };

    let at = world.board().resolve(at)?;
    world.board_mut().place(at, Occupant::Mine(total));
    Some(Effect::MinePlaced { at, damage: total })
}

/// Remove the mine on the neighbour in `dir`, if any.
pub fn defuse_mine(world: &mut World, name: &str, dir: Direction) -> Option<Effect> {
    let at = world.tank(name)?.location().step(dir);
    let removed = match world.board().occupant_at(at) {
        Occupant::Mine(damage) => {
            let damage = *damage;
            world.board_mut().clear(at);
            Some(damage)
        }
        _ => None,
    };
    Some(Effect::Defused { removed })
}

/// Classify occupied cells along a ray of `distance` cells.
pub fn scan_line(world: &World, name: &str, dir: Direction, distance: u32) -> Option<Sightings> {
    let origin = world.tank(name)?.location();
    let distance = i32::try_from(distance.min(MAX_REACH)).unwrap_or(0);

    let cells = (1..=distance).map(|step| origin.offset(dir, step));
    Some(classify(world, origin, cells))
}

/// Classify occupied cells in the square of `radius` around the tank.
pub fn scan_area(world: &World, name: &str, radius: u32) -> Option<Sightings> {
    let origin = world.tank(name)?.location();
    let radius = i32::try_from(radius.min(MAX_REACH)).unwrap_or(0);

    let cells = (-radius..=radius).flat_map(move |dr| {
        (-radius..=radius).map(move |dc| Location::new(origin.row + dr, origin.col + dc))
    });
    Some(classify(world, origin, cells))
}

fn classify(world: &World, origin: Location, cells: impl Iterator<Item = Location>) -> Sightings {
    let board = world.board();
    let mut sightings = Sightings::new();
    for loc in cells {
        let key = board.resolve(loc).unwrap_or(loc);
        if key == origin {
            continue;
        }
        if let Some(kind) = board.occupant_at(loc).kind() {
            sightings.insert(key, kind);
        }
    }
    sightings
}

/// Drop a shell on `target`. Only a tank there takes damage.
pub fn fire_artillery(world: &mut World, name: &str, target: Location) -> Option<Effect> {
    world.tank(name)?;
    Some(damage_tank_at(world, target, ARTILLERY_DAMAGE).unwrap_or(Effect::Miss))
}

/// Fire a bullet in `dir`.
///
/// The bullet starts with `2 × size − 2` damage on the first cell and loses
/// 2 per cell after that. It stops on the first tank or wall.
pub fn fire_bullet(world: &mut World, name: &str, dir: Direction) -> Option<Effect> {
    let origin = world.tank(name)?.location();
    let size = i32::from(world.board().size());

    for distance in 1..size {
        let at = origin.offset(dir, distance);
        match world.board().occupant_at(at) {
            Occupant::Wall => return Some(Effect::Miss),
            Occupant::Tank(_) => {
                let raw = u32::try_from(2 * (size - distance)).unwrap_or(0);
                return damage_tank_at(world, at, raw);
            }
            Occupant::Empty | Occupant::Mine(_) => {}
        }
    }
    Some(Effect::Miss)
}

/// Restore up to `amount` health.
pub fn repair(world: &mut World, name: &str, amount: u32) -> Option<Effect> {
    let healed = world.tank_mut(name)?.heal(amount);
    Some(Effect::Repaired { healed })
}

/// Compound the tank's shield: `shield' = 1 − (1 − shield) × portion`.
pub fn activate_shield(world: &mut World, name: &str, portion: f64) -> Option<Effect> {
    let tank = world.tank_mut(name)?;
    tank.compound_shield(portion);
    Some(Effect::Shielded {
        shield: tank.shield(),
    })
}

/// Undo one activation of `portion` by tank life `id`.
///
/// Returns `false` if that tank is gone, even when a later tank now has its
/// name.
pub fn expire_shield(world: &mut World, name: &str, id: TankId, portion: f64) -> bool {
    match world.incarnation_mut(name, id) {
        Some(tank) => {
            tank.release_shield(portion);
            true
        }
        None => false,
    }
}
