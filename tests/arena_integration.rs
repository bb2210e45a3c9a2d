//! End-to-end tests for concurrent matches.
//!
//! These tests run real tank tasks on a paused Tokio clock, so every match
//! is deterministic in time and finishes instantly.
//!
//! Run with: cargo test --release arena_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tankland::error::{AdmissionError, CreateError};
use tankland::event_log::EntryKind;
use tankland::render::RecordingRenderer;
use tankland::{
    Arena, ArenaConfig, Behavior, BehaviorCatalog, BehaviorFuture, Direction, Location, MatchOutcome, RosterEntry,
    TankExit, TankHandle,
};

fn config(board_size: u16) -> ArenaConfig {
    ArenaConfig {
        board_size,
        timescale_ms: 10,
        regen_interval_ms: 100,
        seed: 3,
        ..ArenaConfig::default()
    }
}

fn arena(board_size: u16) -> (Arena, Arc<RecordingRenderer>) {
    let recorder = Arc::new(RecordingRenderer::new());
    let arena = Arena::new(config(board_size), recorder.clone()).unwrap();
    (arena, recorder)
}

fn roster(entries: &[(&str, &str)]) -> Vec<RosterEntry> {
    entries
        .iter()
        .map(|(name, kind)| RosterEntry {
            name: (*name).to_owned(),
            kind: (*kind).to_owned(),
        })
        .collect()
}

/// Fires east at whatever is there, resting when short of energy.
#[derive(Debug)]
struct Gunner;

impl Behavior for Gunner {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            if !tank.fire_bullet(Direction::E).await.is_done() {
                tank.recharge(3).await;
            }
            Ok(())
        })
    }
}

/// Panics on its first turn.
#[derive(Debug)]
struct Doomed;

impl Behavior for Doomed {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            if tank.is_alive().await {
                panic!("out of ammunition");
            }
            Ok(())
        })
    }
}

/// Counts its turns and spends each one recharging for a long stretch.
#[derive(Debug)]
struct Sleeper {
    turns: Arc<AtomicU32>,
}

impl Behavior for Sleeper {
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a> {
        Box::pin(async move {
            self.turns.fetch_add(1, Ordering::SeqCst);
            tank.recharge(50).await;
            Ok(())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_energy_never_overspent() {
    let config = ArenaConfig {
        regen_amount: 0,
        ..config(10)
    };
    let arena = Arena::new(config, Arc::new(RecordingRenderer::new())).unwrap();
    arena.create_tank_at("target", Location::new(5, 5)).await.unwrap();

    let granted = Arc::new(AtomicU32::new(0));
    let mut workers = Vec::new();
    for _ in 0..16 {
        let arena = arena.clone();
        let granted = Arc::clone(&granted);
        workers.push(tokio::spawn(async move {
            for _ in 0..10 {
                if arena.use_energy("target", 3).await {
                    granted.fetch_add(3, Ordering::SeqCst);
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    let spent = granted.load(Ordering::SeqCst);
    let left = arena.tank("target").await.unwrap().energy;
    assert_eq!(spent, 99);
    assert_eq!(left, 1);
}

#[tokio::test(start_paused = true)]
async fn test_duel_announces_one_victory() {
    let (arena, recorder) = arena(6);
    arena.create_tank_at("right", Location::new(2, 5)).await.unwrap();
    let _left = arena
        .spawn_tank_at("left", Location::new(2, 0), Box::new(Gunner))
        .await
        .unwrap();

    // Right sits idle while left shoots it down.
    let outcome = tokio::time::timeout(Duration::from_secs(600), arena.wait_for_outcome())
        .await
        .unwrap();
    assert_eq!(outcome, MatchOutcome::Winner("left".to_owned()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!arena.fault("right", "late").await);
    arena.events().flush().await;

    assert_eq!(recorder.announcements().len(), 1);
    assert!(recorder.announcements()[0].contains("left"));
    let deaths = arena
        .events()
        .entries()
        .iter()
        .filter(|e| e.kind == EntryKind::Death)
        .count();
    assert_eq!(deaths, 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_behavior_only_kills_its_tank() {
    let (arena, _) = arena(8);
    let doomed = arena
        .spawn_tank_at("doomed", Location::new(0, 0), Box::new(Doomed))
        .await
        .unwrap();
    let steady = arena
        .spawn_tank_at("steady", Location::new(7, 7), Box::new(Gunner))
        .await
        .unwrap();

    assert_eq!(doomed.join().await, TankExit::Faulted("panicked: out of ammunition".to_owned()));
    assert_eq!(arena.wait_for_outcome().await, MatchOutcome::Winner("steady".to_owned()));
    assert!(arena.tank("steady").await.is_some());

    arena.kill_all().await;
    assert_eq!(steady.join().await, TankExit::Destroyed);

    arena.events().flush().await;
    let kinds: Vec<EntryKind> = arena.events().entries().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EntryKind::Fault));
    assert_eq!(kinds.iter().filter(|k| **k == EntryKind::Victory).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reused_name_does_not_adopt_old_tasks() {
    let (arena, _) = arena(8);
    let turns = Arc::new(AtomicU32::new(0));
    let old = arena
        .spawn_tank_at(
            "a",
            Location::new(0, 0),
            Box::new(Sleeper {
                turns: Arc::clone(&turns),
            }),
        )
        .await
        .unwrap();

    // Killed halfway through a 500ms recharge, then the name is taken again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(arena.fault("a", "pulled from the match").await);
    arena.create_tank_at("a", Location::new(4, 4)).await.unwrap();

    assert_eq!(old.join().await, TankExit::Destroyed);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(turns.load(Ordering::SeqCst), 1);
    assert_eq!(arena.tank("a").await.unwrap().location, Location::new(4, 4));
}

#[tokio::test(start_paused = true)]
async fn test_launch_reports_rejections() {
    let (arena, _) = arena(8);
    let catalog = BehaviorCatalog::builtin();
    let roster = roster(&[("a", "sentinel"), ("b", "nonsense"), ("a", "turtle"), ("c", "turtle")]);

    let (report, tasks) = arena.launch(&catalog, &roster).await;
    let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert_eq!(report.rejected_count(), 2);
    assert_eq!(report.rejected[0].reason, AdmissionError::UnknownKind("nonsense".to_owned()));
    assert_eq!(report.rejected[1].reason, AdmissionError::DuplicateName("a".to_owned()));

    arena.kill_all().await;
    for task in tasks {
        assert_eq!(task.join().await, TankExit::Destroyed);
    }
    assert_eq!(arena.outcome(), MatchOutcome::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_launch_on_full_board_revokes_extra_tanks() {
    let (arena, _) = arena(2);
    let catalog = BehaviorCatalog::builtin();
    let roster = roster(&[("a", "turtle"), ("b", "turtle"), ("c", "turtle"), ("d", "turtle"), ("e", "turtle")]);

    let (report, tasks) = arena.launch(&catalog, &roster).await;
    assert_eq!(tasks.len(), 4);
    assert_eq!(report.rejected_count(), 1);
    assert_eq!(report.rejected[0].entry.name, "e");
    assert_eq!(report.rejected[0].reason, AdmissionError::Create(CreateError::BoardFull));

    arena.kill_all().await;
    arena.events().flush().await;
    let refused = arena
        .events()
        .entries()
        .iter()
        .filter(|e| e.kind == EntryKind::Refused)
        .count();
    assert_eq!(refused, 1);
}

#[tokio::test(start_paused = true)]
async fn test_event_log_file_is_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let config = ArenaConfig {
        event_log_path: Some(path.clone()),
        ..config(6)
    };
    let arena = Arena::new(config, Arc::new(RecordingRenderer::new())).unwrap();

    arena.create_tank_at("a", Location::new(0, 0)).await.unwrap();
    arena.create_tank_at("b", Location::new(5, 5)).await.unwrap();
    arena.kill_all().await;
    arena.events().flush().await;

    let text = std::fs::read_to_string(&path).unwrap();
    let kinds: Vec<String> = text
        .lines()
        .map(|line| {
            let entry: serde_json::Value = serde_json::from_str(line).unwrap();
            entry["kind"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(kinds, vec!["created", "created", "death", "death"]);
    assert_eq!(arena.outcome(), MatchOutcome::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_are_consistent_during_play() {
    let (arena, _) = arena(8);
    let catalog = BehaviorCatalog::builtin();
    let roster = roster(&[("m", "miner"), ("w", "wanderer"), ("s", "sniper")]);
    let (_, tasks) = arena.launch(&catalog, &roster).await;

    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = arena.snapshot().await;
        // Every registered tank is drawn exactly where it says it is.
        for tank in &snapshot.tanks {
            let cell = snapshot.cell(tank.location).unwrap();
            assert_eq!(cell.tank.as_ref().map(|t| t.name.as_str()), Some(tank.name.as_str()));
        }
        let drawn = snapshot.cells.iter().filter(|c| c.tank.is_some()).count();
        assert_eq!(drawn, snapshot.tanks.len());
    }

    arena.kill_all().await;
    for task in tasks {
        task.join().await;
    }
    assert_eq!(arena.population().await, 0);
}
