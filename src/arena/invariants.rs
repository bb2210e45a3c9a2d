//! World invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger: every mutation path keeps the board and the
//! registry in step. If one fires, a rule implementation is broken.

use crate::arena::{MAX_HEALTH, Occupant, World};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all world invariants.
///
/// Meant to run right after a commit, when dead tanks have been reaped.
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(world: &World) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for tank in world.tanks() {
        if tank.health() > MAX_HEALTH {
            violations.push(InvariantViolation {
                message: format!("Tank {} has health {} > {MAX_HEALTH}", tank.name(), tank.health()),
            });
        }

        if tank.energy() > tank.max_energy() {
            violations.push(InvariantViolation {
                message: format!(
                    "Tank {} has energy {} > max {}",
                    tank.name(),
                    tank.energy(),
                    tank.max_energy()
                ),
            });
        }

        if !(0.0..1.0).contains(&tank.shield()) {
            violations.push(InvariantViolation {
                message: format!("Tank {} has shield {} outside [0, 1)", tank.name(), tank.shield()),
            });
        }

        if !tank.is_alive() {
            violations.push(InvariantViolation {
                message: format!("Dead tank {} is still registered", tank.name()),
            });
        }

        match world.board().occupant_at(tank.location()) {
            Occupant::Tank(held) if held == tank.name() => {}
            other => violations.push(InvariantViolation {
                message: format!(
                    "Tank {} records location {} but the board holds {other:?}",
                    tank.name(),
                    tank.location()
                ),
            }),
        }
    }

    for (location, occupant) in world.board().iter() {
        match occupant {
            Occupant::Tank(name) if world.tank(name).is_none() => {
                violations.push(InvariantViolation {
                    message: format!("Cell {location} holds unregistered tank {name}"),
                });
            }
            Occupant::Mine(0) => violations.push(InvariantViolation {
                message: format!("Cell {location} holds a zero-damage mine"),
            }),
            Occupant::Wall => violations.push(InvariantViolation {
                message: format!("Cell {location} stores a wall"),
            }),
            _ => {}
        }
    }

    violations
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(world: &World) {
    let violations = check_invariants(world);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_world: &World) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Addressing, Board, Location};

    fn create_valid_world() -> World {
        let mut world = World::new(Board::new(10, Addressing::Clip).unwrap(), 100, 100, 3);
        world.create_tank_at("alpha", Location::new(5, 5)).unwrap();
        world.create_tank_at("beta", Location::new(1, 1)).unwrap();
        world
    }

    #[test]
    fn test_valid_world_passes() {
        let world = create_valid_world();
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_dead_tank_detected_before_commit() {
        let mut world = create_valid_world();
        world.kill("alpha");

        let violations = check_invariants(&world);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Dead tank"));

        world.commit();
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_stray_board_entry_detected() {
        let mut world = create_valid_world();
        world
            .board_mut()
            .place(Location::new(0, 0), Occupant::Tank("ghost".to_owned()));

        let violations = check_invariants(&world);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("unregistered"));
    }

    #[test]
    fn test_misplaced_tank_detected() {
        let mut world = create_valid_world();
        world.board_mut().clear(Location::new(5, 5));

        let violations = check_invariants(&world);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("alpha"));
    }
}
