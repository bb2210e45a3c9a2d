//! Action executor: the only gateway that changes the world.
//!
//! Every update runs as one critical section over the [`World`]:
//! 1. lock (tokio's mutex is FIFO, so contended tanks are served in turn)
//! 2. check the tank is alive, the parameters are valid and energy suffices
//! 3. deduct energy and apply the effect
//! 4. commit (reap dead tanks, detect victory) and queue log entries
//! 5. unlock, then sleep `timescale × ticks` to pace the caller
//!
//! The lock is never held across an `.await` other than its own
//! acquisition, so a pacing tank never delays anyone else.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};

use crate::arena::costs::{energy_cost, time_cost};
use crate::arena::{
    Action, Board, Direction, Effect, Location, Sightings, Snapshot, Tank, TankId, TankStatus, World,
    WorldEvent, combat,
};
use crate::config::ArenaConfig;
use crate::error::{ArenaResult, ConfigError, CreateError};
use crate::event_log::{EntryKind, EventLog};
use crate::render::Renderer;

/// Why an action was refused before any energy was looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The tank is not (or no longer) in the arena.
    Dead,
    /// The parameters are out of range.
    Invalid,
}

/// Result of one executor call.
///
/// None of these are errors: running out of energy or missing a shot is a
/// normal part of the game.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Nothing happened and no time passed.
    Rejected(Rejection),
    /// Not enough energy. Nothing happened and no time passed.
    Starved {
        /// Energy the action costs.
        needed: u32,
        /// Energy the tank had.
        available: u32,
    },
    /// The action was paid for and applied.
    Done(Effect),
}

impl ActionOutcome {
    /// Whether the action was applied.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// The effect, if the action was applied.
    #[must_use]
    pub const fn effect(&self) -> Option<&Effect> {
        match self {
            Self::Done(effect) => Some(effect),
            _ => None,
        }
    }

    /// What a scan saw, if this was a successful scan.
    #[must_use]
    pub fn into_sightings(self) -> Option<Sightings> {
        match self {
            Self::Done(Effect::Sighted(seen)) => Some(seen),
            _ => None,
        }
    }
}

/// How the match stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// More than one tank may still win.
    Running,
    /// Exactly one tank was left standing.
    Winner(String),
    /// Every tank died without a sole survivor.
    Destroyed,
}

impl MatchOutcome {
    /// Whether the match is over.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A log line produced inside a critical section.
struct Note {
    kind: EntryKind,
    message: String,
}

impl Note {
    fn new(kind: EntryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

struct Shared {
    world: Mutex<World>,
    config: ArenaConfig,
    events: EventLog,
    outcome: watch::Sender<MatchOutcome>,
}

/// Shared handle to a running arena. Cheap to clone.
#[derive(Clone)]
pub struct Arena {
    shared: Arc<Shared>,
}

// Manual Debug implementation since the world sits behind an async mutex
impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.shared.config)
            .field("outcome", &*self.shared.outcome.borrow())
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Build an arena and start its event log.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the event log file
    /// cannot be opened.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: ArenaConfig, renderer: Arc<dyn Renderer>) -> ArenaResult<Self> {
        config.validate()?;
        let board = Board::new(config.board_size, config.addressing)
            .ok_or(ConfigError::BoardTooSmall(config.board_size))?;
        let world = World::new(board, config.max_energy, config.starting_energy, config.seed);
        let events = EventLog::start(renderer, config.event_log_path.as_deref())?;
        let (outcome, _) = watch::channel(MatchOutcome::Running);

        Ok(Self {
            shared: Arc::new(Shared {
                world: Mutex::new(world),
                config,
                events,
                outcome,
            }),
        })
    }

    /// The configuration this arena runs with.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.shared.config
    }

    /// The event log.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.shared.events
    }

    /// Run `f` as one atomic update, then commit.
    async fn update<T>(&self, f: impl FnOnce(&mut World, &mut Vec<Note>) -> T) -> T {
        let mut world = self.shared.world.lock().await;
        let mut notes = Vec::new();
        let value = f(&mut world, &mut notes);

        let events = world.commit();
        let mut finished = None;
        for event in &events {
            match event {
                WorldEvent::Died { .. } => {
                    info!("{event}");
                    notes.push(Note::new(EntryKind::Death, event.to_string()));
                }
                WorldEvent::Victory { name } => {
                    info!("{event}");
                    notes.push(Note::new(EntryKind::Victory, event.to_string()));
                    finished = Some(MatchOutcome::Winner(name.clone()));
                }
            }
        }
        if finished.is_none()
            && world.population() == 0
            && events.iter().any(|e| matches!(e, WorldEvent::Died { .. }))
        {
            finished = Some(MatchOutcome::Destroyed);
        }

        if !notes.is_empty() {
            let snapshot = world.snapshot();
            for note in notes {
                self.shared.events.record(note.kind, note.message, snapshot.clone());
            }
        }

        if let Some(outcome) = finished {
            self.shared.outcome.send_if_modified(|current| {
                if current.is_finished() {
                    return false;
                }
                *current = outcome;
                true
            });
        }

        drop(world);
        value
    }

    /// Real time taken by `ticks`.
    fn pacing(&self, ticks: u32) -> Duration {
        self.shared.config.timescale().saturating_mul(ticks)
    }

    /// Perform `action` for tank `name` under the cost protocol.
    ///
    /// Dead tanks, invalid parameters and insufficient energy return at
    /// once without any effect. Otherwise energy is deducted, the effect is
    /// applied and the caller sleeps for the action's time cost.
    pub async fn perform(&self, name: &str, action: Action) -> ActionOutcome {
        self.act(name, None, action).await
    }

    /// [`Arena::perform`] for one life of the tank. With `None`, whichever
    /// tank holds the name acts.
    async fn act(&self, name: &str, id: Option<TankId>, action: Action) -> ActionOutcome {
        let (outcome, id) = self
            .update(|world, notes| {
                let id = id.or_else(|| world.tank(name).map(Tank::id));
                let outcome = match id {
                    Some(id) => execute(world, name, id, &action, notes),
                    None => ActionOutcome::Rejected(Rejection::Dead),
                };
                (outcome, id)
            })
            .await;

        match &outcome {
            ActionOutcome::Done(effect) => {
                debug!("{name} {}: {effect}", action.label());
                if let (Action::ActivateShield { ticks, portion }, Some(id)) = (action, id) {
                    self.schedule_shield_expiry(name, id, ticks, portion);
                }
                let pause = self.pacing(time_cost(&action));
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
            ActionOutcome::Starved { needed, available } => {
                debug!("{name} {} starved: needs {needed}, has {available}", action.label());
            }
            ActionOutcome::Rejected(reason) => {
                debug!("{name} {} rejected: {reason:?}", action.label());
            }
        }
        outcome
    }

    fn schedule_shield_expiry(&self, name: &str, id: TankId, ticks: u32, portion: f64) {
        let arena = self.clone();
        let name = name.to_owned();
        let duration = self.pacing(ticks);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let released = arena
                .update(|world, _| combat::expire_shield(world, &name, id, portion))
                .await;
            if released {
                debug!("{name} shield of {portion} expired");
            }
        });
    }

    /// Atomically deduct `amount` energy if the tank has it.
    ///
    /// No pacing. Returns `false` if the tank is gone or short of energy.
    pub async fn use_energy(&self, name: &str, amount: u32) -> bool {
        self.update(|world, _| {
            world
                .tank_mut(name)
                .is_some_and(|tank| tank.use_energy(amount))
        })
        .await
    }

    /// Grant regenerated energy to one life of a tank.
    ///
    /// Returns `false` once that tank is gone, even if its name was reused.
    pub(crate) async fn regenerate(&self, name: &str, id: TankId, amount: u32) -> bool {
        self.update(|world, _| {
            world.incarnation_mut(name, id).is_some_and(|tank| {
                tank.gain_energy(amount);
                true
            })
        })
        .await
    }

    /// Create a tank at a random empty cell and start its energy
    /// regeneration.
    ///
    /// # Errors
    ///
    /// Fails (and logs the refusal) if the name is taken or the board is
    /// full. Nothing in the world changes then.
    pub async fn create_tank(&self, name: &str) -> Result<Location, CreateError> {
        let (location, _) = self.enter(name, |world| world.create_tank(name)).await?;
        Ok(location)
    }

    /// Create a tank at a chosen empty cell and start its energy
    /// regeneration.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken or the cell is unavailable.
    pub async fn create_tank_at(&self, name: &str, location: Location) -> Result<Location, CreateError> {
        let (location, _) = self
            .enter(name, |world| world.create_tank_at(name, location))
            .await?;
        Ok(location)
    }

    /// Run `create` as one update, log the result and start regeneration for
    /// the new tank.
    pub(crate) async fn enter(
        &self,
        name: &str,
        create: impl FnOnce(&mut World) -> Result<Location, CreateError>,
    ) -> Result<(Location, TankId), CreateError> {
        let created = self
            .update(|world, notes| {
                let created = create(world).map(|location| {
                    let id = world.tank(name).map_or_else(TankId::default, Tank::id);
                    (location, id)
                });
                match &created {
                    Ok((location, _)) => {
                        notes.push(Note::new(
                            EntryKind::Created,
                            format!("{name} enters the arena at {location}"),
                        ));
                    }
                    Err(err) => {
                        notes.push(Note::new(EntryKind::Refused, format!("{name} refused: {err}")));
                    }
                }
                created
            })
            .await;

        match &created {
            Ok((location, id)) => {
                info!("{name} created at {location}");
                self.start_regeneration(name, *id);
            }
            Err(err) => warn!("cannot create {name}: {err}"),
        }
        created
    }

    /// Kill a tank whose behavior failed. Returns `false` if it was already gone.
    pub async fn fault(&self, name: &str, reason: &str) -> bool {
        self.fault_where(name, None, reason).await
    }

    /// [`Arena::fault`] for one life of the tank only.
    pub(crate) async fn fault_incarnation(&self, name: &str, id: TankId, reason: &str) -> bool {
        self.fault_where(name, Some(id), reason).await
    }

    async fn fault_where(&self, name: &str, id: Option<TankId>, reason: &str) -> bool {
        let killed = self
            .update(|world, notes| {
                let killed = match id {
                    Some(id) if world.incarnation(name, id).is_none() => false,
                    _ => world.kill(name),
                };
                if killed {
                    notes.push(Note::new(EntryKind::Fault, format!("{name} crashed: {reason}")));
                }
                killed
            })
            .await;
        if killed {
            warn!("{name} crashed: {reason}");
        }
        killed
    }

    /// Zero every live tank. Each goes through the normal death path.
    pub async fn kill_all(&self) {
        let population = self
            .update(|world, _| {
                let population = world.population();
                world.kill_all();
                population
            })
            .await;
        info!("killed all {population} tanks");
    }

    /// Consistent copy of the board and registry.
    pub async fn snapshot(&self) -> Snapshot {
        self.shared.world.lock().await.snapshot()
    }

    /// Public state of one tank, if alive.
    pub async fn tank(&self, name: &str) -> Option<TankStatus> {
        self.shared.world.lock().await.tank(name).map(Tank::status)
    }

    /// Public state of one life of a tank, if it is still alive.
    async fn incarnation(&self, name: &str, id: TankId) -> Option<TankStatus> {
        self.shared
            .world
            .lock()
            .await
            .incarnation(name, id)
            .map(Tank::status)
    }

    /// Number of live tanks.
    pub async fn population(&self) -> usize {
        self.shared.world.lock().await.population()
    }

    /// How the match stands right now.
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        self.shared.outcome.borrow().clone()
    }

    /// Resolve once a winner is known or every tank has died.
    pub async fn wait_for_outcome(&self) -> MatchOutcome {
        let mut receiver = self.shared.outcome.subscribe();
        match receiver.wait_for(MatchOutcome::is_finished).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => self.outcome(),
        }
    }

    /// The capability handle for the tank now called `name`.
    ///
    /// The handle stays bound to that tank: once it dies the handle reports
    /// it dead, even if another tank later takes the name.
    pub async fn handle(&self, name: &str) -> Option<TankHandle> {
        let id = self.shared.world.lock().await.tank(name).map(Tank::id)?;
        Some(self.bind(name, id))
    }

    pub(crate) fn bind(&self, name: &str, id: TankId) -> TankHandle {
        TankHandle {
            arena: self.clone(),
            name: name.to_owned(),
            id,
            memory: HashMap::new(),
        }
    }
}

/// Steps 2 and 3 of the protocol, inside the lock.
fn execute(
    world: &mut World,
    name: &str,
    id: TankId,
    action: &Action,
    notes: &mut Vec<Note>,
) -> ActionOutcome {
    let Some(origin) = world.incarnation(name, id).map(Tank::location) else {
        return ActionOutcome::Rejected(Rejection::Dead);
    };
    if !action.is_valid() {
        return ActionOutcome::Rejected(Rejection::Invalid);
    }

    let needed = energy_cost(action, origin, world.board());
    let Some(tank) = world.incarnation_mut(name, id) else {
        return ActionOutcome::Rejected(Rejection::Dead);
    };
    if !tank.use_energy(needed) {
        return ActionOutcome::Starved {
            needed,
            available: tank.energy(),
        };
    }

    match combat::apply(world, name, action) {
        Some(effect) => {
            if effect.changes_state() {
                notes.push(Note::new(
                    EntryKind::Action,
                    format!("{name} {}: {effect}", action.label()),
                ));
            }
            ActionOutcome::Done(effect)
        }
        None => ActionOutcome::Rejected(Rejection::Dead),
    }
}

/// Everything a behavior may do with its tank.
///
/// Actions go through the executor. The scratch memory is private to the
/// handle and needs no locking.
pub struct TankHandle {
    arena: Arena,
    name: String,
    id: TankId,
    memory: HashMap<String, Value>,
}

impl std::fmt::Debug for TankHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TankHandle")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

impl TankHandle {
    /// Name of the tank.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which life of the named tank this handle drives.
    #[must_use]
    pub const fn id(&self) -> TankId {
        self.id
    }

    /// Side length of the board.
    #[must_use]
    pub fn board_size(&self) -> u16 {
        self.arena.config().board_size
    }

    /// Perform any action.
    pub async fn perform(&self, action: Action) -> ActionOutcome {
        self.arena.act(&self.name, Some(self.id), action).await
    }

    /// Step to a neighbouring cell.
    pub async fn move_tank(&self, dir: Direction) -> ActionOutcome {
        self.perform(Action::Move(dir)).await
    }

    /// Lay a mine next to the tank.
    pub async fn place_mine(&self, damage: u32, dir: Direction) -> ActionOutcome {
        self.perform(Action::PlaceMine { damage, dir }).await
    }

    /// Remove a neighbouring mine.
    pub async fn defuse_mine(&self, dir: Direction) -> ActionOutcome {
        self.perform(Action::DefuseMine(dir)).await
    }

    /// Look along a ray.
    pub async fn scan_line(&self, dir: Direction, distance: u32) -> ActionOutcome {
        self.perform(Action::ScanLine { dir, distance }).await
    }

    /// Look around.
    pub async fn scan_area(&self, radius: u32) -> ActionOutcome {
        self.perform(Action::ScanArea { radius }).await
    }

    /// Shell a cell.
    pub async fn fire_artillery(&self, target: Location) -> ActionOutcome {
        self.perform(Action::FireArtillery(target)).await
    }

    /// Fire a bullet.
    pub async fn fire_bullet(&self, dir: Direction) -> ActionOutcome {
        self.perform(Action::FireBullet(dir)).await
    }

    /// Restore health.
    pub async fn repair(&self, amount: u32) -> ActionOutcome {
        self.perform(Action::Repair(amount)).await
    }

    /// Regain energy over `ticks`.
    pub async fn recharge(&self, ticks: u32) -> ActionOutcome {
        self.perform(Action::Recharge(ticks)).await
    }

    /// Raise a shield for `ticks`.
    pub async fn activate_shield(&self, ticks: u32, portion: f64) -> ActionOutcome {
        self.perform(Action::ActivateShield { ticks, portion }).await
    }

    /// Public state, or `None` once the tank is dead.
    pub async fn status(&self) -> Option<TankStatus> {
        self.arena.incarnation(&self.name, self.id).await
    }

    /// Whether the tank is still in the arena.
    pub async fn is_alive(&self) -> bool {
        self.status().await.is_some()
    }

    /// Current health (zero once dead).
    pub async fn health(&self) -> u32 {
        self.status().await.map_or(0, |s| s.health)
    }

    /// Current energy (zero once dead).
    pub async fn energy(&self) -> u32 {
        self.status().await.map_or(0, |s| s.energy)
    }

    /// Current shield factor (zero once dead).
    pub async fn shield(&self) -> f64 {
        self.status().await.map_or(0.0, |s| s.shield)
    }

    /// Current location, or `None` once dead.
    pub async fn location(&self) -> Option<Location> {
        self.status().await.map(|s| s.location)
    }

    /// Remember a value.
    pub fn store(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.memory.insert(key.into(), value.into());
    }

    /// Recall a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.memory.get(key)
    }

    /// Forget a value, returning it.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.memory.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::arena::OccupantKind;
    use crate::render::RecordingRenderer;

    fn config() -> ArenaConfig {
        ArenaConfig {
            board_size: 10,
            timescale_ms: 50,
            regen_amount: 0,
            ..ArenaConfig::default()
        }
    }

    fn arena() -> Arena {
        Arena::new(config(), Arc::new(RecordingRenderer::new())).unwrap()
    }

    /// The paused clock may round a deadline up by a millisecond.
    fn assert_elapsed(start: Instant, millis: u64) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(millis) && elapsed <= Duration::from_millis(millis + 1),
            "expected {millis}ms, got {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_costs_energy_and_time() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();

        let start = Instant::now();
        let outcome = arena.perform("a", Action::Move(Direction::N)).await;

        assert_eq!(outcome, ActionOutcome::Done(Effect::Moved { to: Location::new(4, 5) }));
        assert_elapsed(start, 50);
        assert_eq!(arena.tank("a").await.unwrap().energy, 98);
    }

    #[tokio::test(start_paused = true)]
    async fn test_artillery_takes_two_ticks() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(0, 0)).await.unwrap();

        let start = Instant::now();
        let outcome = arena.perform("a", Action::FireArtillery(Location::new(4, 2))).await;

        assert_eq!(outcome, ActionOutcome::Done(Effect::Miss));
        assert_elapsed(start, 100);
        assert_eq!(arena.tank("a").await.unwrap().energy, 88);
    }

    #[tokio::test(start_paused = true)]
    async fn test_starved_action_is_free() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        assert!(arena.use_energy("a", 97).await);

        let start = Instant::now();
        let outcome = arena.perform("a", Action::FireBullet(Direction::E)).await;

        assert_eq!(
            outcome,
            ActionOutcome::Starved {
                needed: 5,
                available: 3
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(arena.tank("a").await.unwrap().energy, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_and_dead_rejected() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();

        let invalid = Action::ActivateShield {
            ticks: 3,
            portion: 1.5,
        };
        assert_eq!(
            arena.perform("a", invalid).await,
            ActionOutcome::Rejected(Rejection::Invalid)
        );
        assert_eq!(arena.tank("a").await.unwrap().energy, 100);

        assert_eq!(
            arena.perform("ghost", Action::Move(Direction::N)).await,
            ActionOutcome::Rejected(Rejection::Dead)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repair_charges_full_amount() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();

        let outcome = arena.perform("a", Action::Repair(10)).await;
        assert_eq!(outcome, ActionOutcome::Done(Effect::Repaired { healed: 0 }));
        assert_eq!(arena.tank("a").await.unwrap().energy, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recharge_sleeps_requested_ticks() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        assert!(arena.use_energy("a", 60).await);

        let start = Instant::now();
        let outcome = arena.perform("a", Action::Recharge(4)).await;
        assert_eq!(outcome, ActionOutcome::Done(Effect::Recharged { gained: 20 }));
        assert_elapsed(start, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shield_expires_after_its_ticks() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        let tank = arena.handle("a").await.unwrap();

        let outcome = tank.activate_shield(4, 0.5).await;
        assert!(outcome.is_done());
        assert_eq!(tank.energy().await, 92);
        assert!((tank.shield().await - 0.5).abs() < 1e-12);

        tokio::time::sleep(Duration::from_millis(160)).await;
        assert!(tank.shield().await.abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_shield_expiry_spares_a_reborn_tank() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        let short = Action::ActivateShield { ticks: 5, portion: 0.5 };
        assert!(arena.perform("a", short).await.is_done());
        assert!(arena.fault("a", "retired").await);

        arena.create_tank_at("a", Location::new(1, 1)).await.unwrap();
        let long = Action::ActivateShield { ticks: 40, portion: 0.5 };
        assert!(arena.perform("a", long).await.is_done());

        // The first shield's expiry has fired; the second shield is still up.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let shield = arena.tank("a").await.unwrap().shield;
        assert!((shield - 0.5).abs() < 1e-12, "shield {shield}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_stays_with_its_tank() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        let old = arena.handle("a").await.unwrap();
        assert!(arena.fault("a", "retired").await);
        assert!(arena.handle("a").await.is_none());

        arena.create_tank_at("a", Location::new(2, 2)).await.unwrap();
        let new = arena.handle("a").await.unwrap();
        assert_ne!(old.id(), new.id());
        assert!(!old.is_alive().await);
        assert_eq!(
            old.move_tank(Direction::N).await,
            ActionOutcome::Rejected(Rejection::Dead)
        );
        assert_eq!(new.location().await, Some(Location::new(2, 2)));
        assert_eq!(arena.tank("a").await.unwrap().energy, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_name_refused_and_logged() {
        let arena = arena();
        arena.create_tank("a").await.unwrap();
        let before = arena.snapshot().await;

        let err = arena.create_tank("a").await.unwrap_err();
        assert_eq!(err, CreateError::DuplicateName("a".to_owned()));
        assert_eq!(arena.snapshot().await, before);

        arena.events().flush().await;
        let kinds: Vec<EntryKind> = arena.events().entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Created, EntryKind::Refused]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_victory_recorded_once() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(0, 0)).await.unwrap();
        arena.create_tank_at("b", Location::new(0, 9)).await.unwrap();
        arena.create_tank_at("c", Location::new(9, 9)).await.unwrap();

        assert!(arena.fault("b", "boom").await);
        assert_eq!(arena.outcome(), MatchOutcome::Running);
        assert!(arena.fault("c", "boom").await);
        assert!(!arena.fault("c", "boom").await);

        assert_eq!(arena.wait_for_outcome().await, MatchOutcome::Winner("a".to_owned()));

        arena.events().flush().await;
        let victories = arena
            .events()
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Victory)
            .count();
        assert_eq!(victories, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_all_destroys_everyone() {
        let arena = arena();
        for name in ["a", "b", "c"] {
            arena.create_tank(name).await.unwrap();
        }
        arena.kill_all().await;

        assert_eq!(arena.population().await, 0);
        assert_eq!(arena.wait_for_outcome().await, MatchOutcome::Destroyed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_scans_and_memory() {
        let arena = arena();
        arena.create_tank_at("a", Location::new(5, 5)).await.unwrap();
        arena.create_tank_at("b", Location::new(5, 7)).await.unwrap();
        let mut tank = arena.handle("a").await.unwrap();

        let seen = tank.scan_line(Direction::E, 3).await.into_sightings().unwrap();
        assert_eq!(seen.get(&Location::new(5, 7)), Some(&OccupantKind::Tank));
        assert_eq!(tank.energy().await, 97);

        tank.store("target", "b");
        assert_eq!(tank.get("target"), Some(&Value::from("b")));
        assert_eq!(tank.delete("target"), Some(Value::from("b")));
        assert!(tank.get("target").is_none());
    }
}
