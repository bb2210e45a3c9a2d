//! Task scheduling.
//!
//! Every tank gets a regeneration ticker granting a little energy at a
//! fixed interval from the moment it is created. Spawned tanks also get:
//! - a behavior loop, which calls `act` while the tank is alive
//! - a supervisor awaiting the behavior loop, which kills the tank through
//!   the normal death path if the behavior errors or panics
//!
//! All of these are bound to one life of the tank, so a name reused after
//! a death starts from a clean slate. One more task samples snapshots for
//! the renderer.

use std::any::Any;
use std::sync::Arc;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::arena::{Location, TankId};
use crate::behavior::{AdmissionReport, Behavior, BehaviorCatalog};
use crate::config::RosterEntry;
use crate::error::CreateError;
use crate::executor::Arena;
use crate::render::Renderer;

/// How a tank's behavior task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TankExit {
    /// The tank died and the loop stopped on its own.
    Destroyed,
    /// The behavior returned an error or panicked.
    Faulted(String),
    /// The task was cancelled from outside.
    Cancelled,
}

/// A running tank.
#[derive(Debug)]
pub struct TankTask {
    name: String,
    supervisor: JoinHandle<TankExit>,
}

impl TankTask {
    /// Tank name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the tank's behavior to end.
    pub async fn join(self) -> TankExit {
        self.supervisor.await.unwrap_or(TankExit::Cancelled)
    }
}

impl Arena {
    /// Create a tank and start its tasks.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken or the board is full; no task is started.
    pub async fn spawn_tank(&self, name: &str, behavior: Box<dyn Behavior>) -> Result<TankTask, CreateError> {
        let (_, id) = self.enter(name, |world| world.create_tank(name)).await?;
        Ok(self.start_tasks(name, id, behavior))
    }

    /// Create a tank at `location` and start its tasks.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken or the cell is unavailable.
    pub async fn spawn_tank_at(
        &self,
        name: &str,
        location: Location,
        behavior: Box<dyn Behavior>,
    ) -> Result<TankTask, CreateError> {
        let (_, id) = self
            .enter(name, |world| world.create_tank_at(name, location))
            .await?;
        Ok(self.start_tasks(name, id, behavior))
    }

    /// Start the regeneration ticker for one life of a tank.
    pub(crate) fn start_regeneration(&self, name: &str, id: TankId) {
        tokio::spawn(regenerate(self.clone(), name.to_owned(), id));
    }

    fn start_tasks(&self, name: &str, id: TankId, mut behavior: Box<dyn Behavior>) -> TankTask {
        let mut handle = self.bind(name, id);
        let behavior_task = tokio::spawn(async move {
            while handle.is_alive().await {
                behavior.act(&mut handle).await?;
                tokio::task::yield_now().await;
            }
            Ok::<(), anyhow::Error>(())
        });

        let arena = self.clone();
        let tank = name.to_owned();
        let supervisor = tokio::spawn(async move {
            let exit = match behavior_task.await {
                Ok(Ok(())) => TankExit::Destroyed,
                Ok(Err(err)) => TankExit::Faulted(format!("{err:#}")),
                Err(err) if err.is_panic() => TankExit::Faulted(panic_message(err.into_panic())),
                Err(_) => TankExit::Cancelled,
            };
            match &exit {
                TankExit::Destroyed => debug!("{tank} behavior finished"),
                TankExit::Faulted(reason) => {
                    arena.fault_incarnation(&tank, id, reason).await;
                }
                TankExit::Cancelled => {
                    arena.fault_incarnation(&tank, id, "behavior cancelled").await;
                }
            }
            exit
        });

        TankTask {
            name: name.to_owned(),
            supervisor,
        }
    }

    /// Screen `roster` against `catalog` and start every admitted tank.
    ///
    /// Tanks the arena refuses to create (board full) are moved to the
    /// report's rejected list.
    pub async fn launch(&self, catalog: &BehaviorCatalog, roster: &[RosterEntry]) -> (AdmissionReport, Vec<TankTask>) {
        let mut report = catalog.admit(roster);
        let mut tasks = Vec::new();
        let seed = self.config().seed;

        for (offset, entry) in (0_u64..).zip(report.admitted.clone()) {
            let Some(behavior) = catalog.create(&entry.kind, seed.wrapping_add(offset)) else {
                continue;
            };
            match self.spawn_tank(&entry.name, behavior).await {
                Ok(task) => tasks.push(task),
                Err(err) => report.revoke(&entry.name, err.into()),
            }
        }

        info!(
            "launched {} tanks, rejected {}",
            tasks.len(),
            report.rejected_count()
        );
        (report, tasks)
    }

    /// Push snapshots to `renderer` until the match is decided.
    ///
    /// The final state is always rendered once before the task ends.
    pub fn spawn_broadcast(&self, renderer: Arc<dyn Renderer>) -> JoinHandle<()> {
        let arena = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(arena.config().broadcast_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let finished = arena.outcome().is_finished();
                let snapshot = arena.snapshot().await;
                renderer.render(&snapshot);
                if finished {
                    break;
                }
            }
        })
    }
}

async fn regenerate(arena: Arena, name: String, id: TankId) {
    let amount = arena.config().regen_amount;
    let mut ticker = tokio::time::interval(arena.config().regen_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !arena.regenerate(&name, id, amount).await {
            break;
        }
    }
    debug!("{name} {id} regeneration stopped");
}

/// Best-effort text of a panic payload.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panicked: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panicked: {text}")
    } else {
        "panicked".to_owned()
    }
}
