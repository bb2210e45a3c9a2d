//! Action cost table.
//!
//! Every action a tank can take has an energy price, which may depend on its
//! parameters, and a time price in ticks. The executor multiplies ticks by
//! the arena timescale to pace behaviors.

use crate::arena::{Board, Direction, Location};

/// Energy per move.
pub const MOVE_ENERGY: u32 = 2;
/// Energy per defuse attempt.
pub const DEFUSE_ENERGY: u32 = 3;
/// Energy per bullet.
pub const BULLET_ENERGY: u32 = 5;
/// Energy per square of artillery range.
pub const ARTILLERY_ENERGY_PER_CELL: u32 = 3;
/// Energy per point of health repaired.
pub const REPAIR_ENERGY_PER_POINT: u32 = 2;
/// Energy gained per tick of recharging.
pub const RECHARGE_GAIN_PER_TICK: u32 = 5;
/// Raw damage of an artillery shell.
pub const ARTILLERY_DAMAGE: u32 = 10;

/// A tank action together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Step to a neighbouring cell.
    Move(Direction),
    /// Lay (or reinforce) a mine on a neighbouring cell.
    PlaceMine {
        /// Raw damage of the mine.
        damage: u32,
        /// Neighbour to mine.
        dir: Direction,
    },
    /// Remove a mine from a neighbouring cell.
    DefuseMine(Direction),
    /// Look along a ray.
    ScanLine {
        /// Ray direction.
        dir: Direction,
        /// Ray length in cells.
        distance: u32,
    },
    /// Look at the square around the tank.
    ScanArea {
        /// Radius of the square.
        radius: u32,
    },
    /// Shell a cell anywhere on the board.
    FireArtillery(Location),
    /// Fire a bullet along a direction.
    FireBullet(Direction),
    /// Restore health.
    Repair(u32),
    /// Wait and regain energy.
    Recharge(u32),
    /// Raise a timed shield.
    ActivateShield {
        /// How long the shield lasts, in ticks.
        ticks: u32,
        /// Fraction of vulnerability that remains, in `(0, 1)`.
        portion: f64,
    },
}

impl Action {
    /// Short label used in log lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::PlaceMine { .. } => "place-mine",
            Self::DefuseMine(_) => "defuse-mine",
            Self::ScanLine { .. } => "scan-line",
            Self::ScanArea { .. } => "scan-area",
            Self::FireArtillery(_) => "fire-artillery",
            Self::FireBullet(_) => "fire-bullet",
            Self::Repair(_) => "repair",
            Self::Recharge(_) => "recharge",
            Self::ActivateShield { .. } => "activate-shield",
        }
    }

    /// Whether the parameters make sense at all.
    ///
    /// Invalid actions are refused before any energy is looked at.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::PlaceMine { damage, .. } => damage > 0,
            Self::ActivateShield { portion, .. } => portion > 0.0 && portion < 1.0,
            _ => true,
        }
    }
}

/// Energy an action costs when taken from `origin` on `board`.
///
/// Artillery is priced by the distance the board reports, so a wrapped
/// target costs the same however it is written. Recharging costs nothing
/// up front.
#[must_use]
pub fn energy_cost(action: &Action, origin: Location, board: &Board) -> u32 {
    match *action {
        Action::Move(_) => MOVE_ENERGY,
        Action::PlaceMine { damage, .. } => damage,
        Action::DefuseMine(_) => DEFUSE_ENERGY,
        Action::ScanLine { distance, .. } => distance,
        Action::ScanArea { radius } => radius.saturating_mul(radius),
        Action::FireArtillery(target) => {
            ARTILLERY_ENERGY_PER_CELL.saturating_mul(board.distance(origin, target))
        }
        Action::FireBullet(_) => BULLET_ENERGY,
        Action::Repair(amount) => REPAIR_ENERGY_PER_POINT.saturating_mul(amount),
        Action::Recharge(_) => 0,
        Action::ActivateShield { ticks, portion } => shield_cost(ticks, portion),
    }
}

/// Energy an action gives back. Only recharging gains energy.
#[must_use]
pub fn energy_gain(action: &Action) -> u32 {
    match *action {
        Action::Recharge(ticks) => RECHARGE_GAIN_PER_TICK.saturating_mul(ticks),
        _ => 0,
    }
}

/// Ticks an action occupies its tank for.
#[must_use]
pub const fn time_cost(action: &Action) -> u32 {
    match *action {
        Action::FireArtillery(_) => 2,
        Action::Recharge(ticks) => ticks,
        _ => 1,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shield_cost(ticks: u32, portion: f64) -> u32 {
    let cost = (f64::from(ticks) / (1.0 - portion)).ceil();
    if cost.is_finite() && cost < f64::from(u32::MAX) {
        cost.max(0.0) as u32
    } else {
        u32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Addressing;

    const ORIGIN: Location = Location::new(0, 0);

    fn board() -> Board {
        Board::new(10, Addressing::Clip).unwrap()
    }

    fn cost(action: Action) -> u32 {
        energy_cost(&action, ORIGIN, &board())
    }

    #[test]
    fn test_constant_costs() {
        assert_eq!(cost(Action::Move(Direction::N)), MOVE_ENERGY);
        assert_eq!(cost(Action::DefuseMine(Direction::E)), DEFUSE_ENERGY);
        assert_eq!(cost(Action::FireBullet(Direction::S)), BULLET_ENERGY);
    }

    #[test]
    fn test_scaling_costs() {
        assert_eq!(cost(Action::PlaceMine { damage: 7, dir: Direction::N }), 7);
        assert_eq!(cost(Action::ScanArea { radius: 3 }), 9);
        assert_eq!(cost(Action::ScanLine { dir: Direction::W, distance: 4 }), 4);
        assert_eq!(cost(Action::Repair(10)), 20);
        let shot = Action::FireArtillery(Location::new(3, 5));
        assert_eq!(energy_cost(&shot, Location::new(0, 0), &board()), 15);
        assert_eq!(energy_cost(&shot, Location::new(3, 4), &board()), 3);
    }

    #[test]
    fn test_wrapped_artillery_priced_by_cell() {
        let board = Board::new(10, Addressing::Wrap).unwrap();
        let origin = Location::new(2, 2);
        let near = Action::FireArtillery(Location::new(3, 2));
        let same_cell = Action::FireArtillery(Location::new(13, 2));
        let across_edge = Action::FireArtillery(Location::new(9, 2));

        assert_eq!(energy_cost(&near, origin, &board), 3);
        assert_eq!(energy_cost(&same_cell, origin, &board), 3);
        assert_eq!(energy_cost(&across_edge, origin, &board), 9);
    }

    #[test]
    fn test_shield_cost() {
        let shield = Action::ActivateShield { ticks: 4, portion: 0.5 };
        assert_eq!(cost(shield), 8);
        assert_eq!(time_cost(&shield), 1);
    }

    #[test]
    fn test_recharge_is_gain_only() {
        let recharge = Action::Recharge(6);
        assert_eq!(cost(recharge), 0);
        assert_eq!(energy_gain(&recharge), 30);
        assert_eq!(time_cost(&recharge), 6);
    }

    #[test]
    fn test_validity() {
        assert!(!Action::PlaceMine { damage: 0, dir: Direction::N }.is_valid());
        assert!(!Action::ActivateShield { ticks: 1, portion: 1.0 }.is_valid());
        assert!(!Action::ActivateShield { ticks: 1, portion: 0.0 }.is_valid());
        assert!(Action::ActivateShield { ticks: 1, portion: 0.3 }.is_valid());
        assert!(Action::Repair(0).is_valid());
    }
}
