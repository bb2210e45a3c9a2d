//! Property-based tests for arena rules.
//!
//! These tests drive worlds through random action sequences and check that
//! the board and registry stay consistent.
//! Run with: cargo test --release prop_arena

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use tankland::arena::costs::energy_cost;
use tankland::arena::invariants::check_invariants;
use tankland::arena::{
    Action, Addressing, Board, Direction, Effect, Location, MAX_HEALTH, Occupant, Tank, World, combat,
    shielded_damage,
};

fn direction() -> impl Strategy<Value = Direction> {
    (0..Direction::ALL.len()).prop_map(|i| Direction::ALL[i])
}

fn addressing() -> impl Strategy<Value = Addressing> {
    prop_oneof![Just(Addressing::Clip), Just(Addressing::Wrap)]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        direction().prop_map(Action::Move),
        (1u32..30, direction()).prop_map(|(damage, dir)| Action::PlaceMine { damage, dir }),
        direction().prop_map(Action::DefuseMine),
        (direction(), 0u32..12).prop_map(|(dir, distance)| Action::ScanLine { dir, distance }),
        (0u32..6).prop_map(|radius| Action::ScanArea { radius }),
        (-2i32..14, -2i32..14).prop_map(|(row, col)| Action::FireArtillery(Location::new(row, col))),
        direction().prop_map(Action::FireBullet),
        (0u32..30).prop_map(Action::Repair),
        (0u32..5).prop_map(Action::Recharge),
        (1u32..5, 0.05f64..0.95).prop_map(|(ticks, portion)| Action::ActivateShield { ticks, portion }),
    ]
}

const NAMES: [&str; 4] = ["alpha", "bravo", "charlie", "delta"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Health and energy stay within their caps whatever happens to a tank.
    #[test]
    fn prop_tank_stats_clamped(
        max_energy in 1u32..500,
        ops in prop::collection::vec((0u8..4, 0u32..300), 0..60)
    ) {
        let mut tank = Tank::new("t", Location::new(0, 0), max_energy, max_energy);
        for (op, amount) in ops {
            let before = tank.energy();
            match op {
                0 => {
                    let paid = tank.use_energy(amount);
                    prop_assert_eq!(paid, amount <= before);
                }
                1 => { tank.gain_energy(amount); }
                2 => { tank.heal(amount); }
                _ => { tank.take_damage(amount); }
            }
            prop_assert!(tank.energy() <= max_energy);
            prop_assert!(tank.health() <= MAX_HEALTH);
        }
    }

    /// Shielded damage never exceeds the raw damage and shrinks as the shield grows.
    #[test]
    fn prop_shield_never_amplifies(raw in 0u32..1000, low in 0.0f64..0.99, extra in 0.0f64..0.99) {
        let high = low + (0.99 - low) * extra;
        let weak = shielded_damage(raw, low);
        let strong = shielded_damage(raw, high);
        prop_assert!(weak <= raw);
        prop_assert!(strong <= weak);
    }

    /// Every activation undone by its own expiry restores the original shield.
    #[test]
    fn prop_shield_expiry_restores(portions in prop::collection::vec(0.05f64..0.95, 1..6)) {
        let mut world = World::new(Board::new(4, Addressing::Clip).unwrap(), 100, 100, 0);
        world.create_tank_at("t", Location::new(1, 1)).unwrap();
        let id = world.tank("t").unwrap().id();

        for &portion in &portions {
            combat::activate_shield(&mut world, "t", portion).unwrap();
            let shield = world.tank("t").unwrap().shield();
            prop_assert!((0.0..1.0).contains(&shield));
        }
        for &portion in portions.iter().rev() {
            prop_assert!(combat::expire_shield(&mut world, "t", id, portion));
        }
        prop_assert!(world.tank("t").unwrap().shield().abs() < 1e-9);
    }

    /// Mines laid on the same cell add up.
    #[test]
    fn prop_mines_combine(damages in prop::collection::vec(1u32..50, 1..8)) {
        let mut world = World::new(Board::new(5, Addressing::Clip).unwrap(), 1000, 1000, 0);
        world.create_tank_at("t", Location::new(2, 2)).unwrap();

        for &damage in &damages {
            combat::place_mine(&mut world, "t", damage, Direction::E).unwrap();
        }
        let total: u32 = damages.iter().sum();
        prop_assert_eq!(world.board().occupant_at(Location::new(2, 3)), &Occupant::Mine(total));
    }

    /// Bullet damage depends only on the distance to the first tank.
    #[test]
    fn prop_bullet_falloff(size in 3u16..20, distance in 1i32..19) {
        prop_assume!(distance < i32::from(size));
        let mut world = World::new(Board::new(size, Addressing::Clip).unwrap(), 100, 100, 0);
        world.create_tank_at("shooter", Location::new(0, 0)).unwrap();
        world.create_tank_at("target", Location::new(distance, 0)).unwrap();

        let expected = u32::try_from(2 * (i32::from(size) - distance)).unwrap();
        let effect = combat::fire_bullet(&mut world, "shooter", Direction::S).unwrap();
        prop_assert_eq!(effect, Effect::Hit { target: "target".to_owned(), damage: expected.min(MAX_HEALTH) });
    }

    /// Random play never breaks the board/registry correspondence.
    #[test]
    fn prop_random_play_keeps_invariants(
        size in 2u16..9,
        mode in addressing(),
        seed in any::<u64>(),
        turns in prop::collection::vec((0usize..NAMES.len(), action()), 0..80)
    ) {
        let mut world = World::new(Board::new(size, mode).unwrap(), 100, 100, seed);
        for name in NAMES {
            // Small boards may run out of room; that is fine.
            let _ = world.create_tank(name);
        }
        world.commit();

        let mut victories = 0;
        for (who, action) in turns {
            let name = NAMES[who];
            let Some(origin) = world.tank(name).map(Tank::location) else { continue };
            if !action.is_valid() {
                continue;
            }
            let cost = energy_cost(&action, origin, world.board());
            if !world.tank_mut(name).is_some_and(|tank| tank.use_energy(cost)) {
                continue;
            }
            combat::apply(&mut world, name, &action);

            let events = world.commit();
            victories += events
                .iter()
                .filter(|e| matches!(e, tankland::arena::WorldEvent::Victory { .. }))
                .count();

            let violations = check_invariants(&world);
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }
        prop_assert!(victories <= 1);
    }
}
