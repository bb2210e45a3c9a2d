//! Built-in behaviors.
//!
//! Every turn ends with an action that takes time (falling back to a short
//! recharge), so a starved tank never spins.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::arena::{Direction, Effect, Location, OccupantKind, Sightings};
use crate::behavior::{Behavior, BehaviorCatalog, BehaviorFuture};
use crate::executor::{ActionOutcome, TankHandle};

/// Ticks of recharge taken when nothing else could be done.
const REST_TICKS: u32 = 2;

/// Register every built-in behavior.
pub(crate) fn register_all(catalog: &mut BehaviorCatalog) {
    catalog.register("sentinel", "holds position, scans nearby and shoots what it sees", sentinel);
    catalog.register("sniper", "scans wide and shells the closest tank until it misses", sniper);
    catalog.register("miner", "wanders and leaves mines behind", miner);
    catalog.register("turtle", "keeps a shield up, repairs, and fires along a rotating line", turtle);
    catalog.register("wanderer", "drives in straight lines and fires at anything ahead", wanderer);
}

fn sentinel(_seed: u64) -> Box<dyn Behavior> {
    Box::new(Sentinel::default())
}

fn sniper(seed: u64) -> Box<dyn Behavior> {
    Box::new(Sniper::new(seed))
}

fn miner(seed: u64) -> Box<dyn Behavior> {
    Box::new(Miner::new(seed))
}

fn turtle(_seed: u64) -> Box<dyn Behavior> {
    Box::new(Turtle::default())
}

fn wanderer(seed: u64) -> Box<dyn Behavior> {
    Box::new(Wanderer::new(seed))
}

/// Recharge briefly unless `outcome` already used up time.
async fn or_rest(tank: &TankHandle, outcome: ActionOutcome) {
    if !outcome.is_done() {
        tank.recharge(REST_TICKS).await;
    }
}

/// Closest sighted tank.
fn nearest_tank(origin: Location, seen: &Sightings) -> Option<Location> {
    seen.iter()
        .filter(|&(_, kind)| *kind == OccupantKind::Tank)
        .map(|(&location, _)| location)
        .min_by_key(|&location| origin.chebyshev(location))
}

/// Direction a bullet can travel to reach `to`, if `to` is on a straight or
/// diagonal line from `from`.
fn line_of_fire(from: Location, to: Location) -> Option<Direction> {
    let dr = (to.row - from.row).abs();
    let dc = (to.col - from.col).abs();
    if dr == 0 || dc == 0 || dr == dc {
        Direction::towards(from, to)
    } else {
        None
    }
}

fn random_direction(rng: &mut ChaCha8Rng) -> Direction {
    Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
}

/// Stays put and shoots at anything within a short scan.
#[derive(Debug, Clone, Copy)]
pub struct Sentinel {
    radius: u32,
}

impl Default for Sentinel {
    fn default() -> Self {
        Self { radius: 3 }
    }
}

impl Behavior for Sentinel {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            let Some(origin) = tank.location().await else {
                return Ok(());
            };
            if tank.energy().await < 20 {
                tank.recharge(4).await;
                return Ok(());
            }

            let seen = tank.scan_area(self.radius).await.into_sightings().unwrap_or_default();
            let outcome = match nearest_tank(origin, &seen) {
                Some(target) => match line_of_fire(origin, target) {
                    Some(dir) => tank.fire_bullet(dir).await,
                    None => tank.fire_artillery(target).await,
                },
                None => tank.recharge(REST_TICKS).await,
            };
            or_rest(tank, outcome).await;
            Ok(())
        })
    }
}

/// Shells a remembered target until it misses, then looks for a new one.
#[derive(Debug, Clone)]
pub struct Sniper {
    rng: ChaCha8Rng,
}

impl Sniper {
    /// Create a sniper.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Behavior for Sniper {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            let Some(origin) = tank.location().await else {
                return Ok(());
            };
            if tank.energy().await < 40 {
                tank.recharge(5).await;
                return Ok(());
            }

            let remembered = tank
                .get("target")
                .cloned()
                .and_then(|value| serde_json::from_value::<Location>(value).ok());

            if let Some(target) = remembered {
                let outcome = tank.fire_artillery(target).await;
                if matches!(outcome.effect(), Some(Effect::Miss)) {
                    tank.delete("target");
                }
                or_rest(tank, outcome).await;
                return Ok(());
            }

            let seen = tank.scan_area(5).await.into_sightings().unwrap_or_default();
            if let Some(target) = nearest_tank(origin, &seen) {
                tank.store("target", serde_json::to_value(target)?);
            } else {
                let outcome = tank.move_tank(random_direction(&mut self.rng)).await;
                or_rest(tank, outcome).await;
            }
            Ok(())
        })
    }
}

/// Random walk that mines the cell it just left.
#[derive(Debug, Clone)]
pub struct Miner {
    rng: ChaCha8Rng,
}

impl Miner {
    /// Create a miner.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Behavior for Miner {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            if tank.energy().await < 30 {
                tank.recharge(5).await;
                return Ok(());
            }

            let dir = random_direction(&mut self.rng);
            let outcome = tank.move_tank(dir).await;
            let moved = matches!(
                outcome.effect(),
                Some(Effect::Moved { .. } | Effect::MineTriggered { .. })
            );
            if moved && self.rng.gen_bool(0.5) {
                let outcome = tank.place_mine(6, dir.opposite()).await;
                or_rest(tank, outcome).await;
            } else {
                or_rest(tank, outcome).await;
            }
            Ok(())
        })
    }
}

/// Shield first, then repairs, then looks around one direction at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Turtle {
    facing: usize,
}

impl Behavior for Turtle {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            let Some(status) = tank.status().await else {
                return Ok(());
            };

            let outcome = if status.energy < 20 {
                tank.recharge(4).await
            } else if status.shield < 0.3 {
                tank.activate_shield(8, 0.5).await
            } else if status.health < 60 {
                tank.repair(10).await
            } else {
                let dir = Direction::ALL[self.facing % Direction::ALL.len()];
                self.facing = self.facing.wrapping_add(1);
                let seen = tank.scan_line(dir, 4).await.into_sightings().unwrap_or_default();
                if seen.values().any(|kind| *kind == OccupantKind::Tank) {
                    tank.fire_bullet(dir).await
                } else {
                    tank.recharge(1).await
                }
            };
            or_rest(tank, outcome).await;
            Ok(())
        })
    }
}

/// Drives straight until blocked, firing at anything in front.
#[derive(Debug, Clone)]
pub struct Wanderer {
    rng: ChaCha8Rng,
    heading: Direction,
    steps: u32,
}

impl Wanderer {
    /// Create a wanderer.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let heading = random_direction(&mut rng);
        Self {
            rng,
            heading,
            steps: 0,
        }
    }
}

impl Behavior for Wanderer {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            if tank.energy().await < 15 {
                tank.recharge(4).await;
                return Ok(());
            }

            let seen = tank
                .scan_line(self.heading, 5)
                .await
                .into_sightings()
                .unwrap_or_default();
            if seen.values().any(|kind| *kind == OccupantKind::Tank) {
                let outcome = tank.fire_bullet(self.heading).await;
                or_rest(tank, outcome).await;
                return Ok(());
            }

            let outcome = tank.move_tank(self.heading).await;
            self.steps += 1;
            if matches!(outcome.effect(), Some(Effect::Blocked { .. })) || self.steps > 6 {
                self.heading = random_direction(&mut self.rng);
                self.steps = 0;
                let turns = tank.get("turns").and_then(Value::as_u64).unwrap_or(0);
                tank.store("turns", turns + 1);
            }
            or_rest(tank, outcome).await;
            Ok(())
        })
    }
}
