//! Benchmarks for the arena rules.
//!
//! Everything here runs inside the critical section of a real match, so it
//! bounds how long one tank can hold up the others.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tankland::arena::{Addressing, Board, Direction, Location, World, combat};

/// A crowded board: one tank per `spacing` cells along each axis.
fn crowded_world(size: u16, spacing: i32) -> World {
    let mut world = World::new(Board::new(size, Addressing::Wrap).unwrap(), 1000, 1000, 7);
    let size = i32::from(size);
    for row in (0..size).step_by(usize::try_from(spacing).unwrap()) {
        for col in (0..size).step_by(usize::try_from(spacing).unwrap()) {
            world
                .create_tank_at(&format!("t{row}_{col}"), Location::new(row, col))
                .unwrap();
        }
    }
    world.commit();
    world
}

fn bench_scan_area(c: &mut Criterion) {
    let world = crowded_world(64, 4);

    c.bench_function("scan_area_r8", |b| {
        b.iter(|| black_box(combat::scan_area(black_box(&world), "t32_32", black_box(8))));
    });
}

fn bench_fire_bullet(c: &mut Criterion) {
    let world = crowded_world(64, 16);

    c.bench_function("fire_bullet_across_board", |b| {
        b.iter_batched(
            || world.clone(),
            |mut w| black_box(combat::fire_bullet(&mut w, "t0_0", Direction::SE)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_commit(c: &mut Criterion) {
    let world = crowded_world(32, 2);

    c.bench_function("commit_after_kill_all", |b| {
        b.iter_batched(
            || {
                let mut w = world.clone();
                w.kill_all();
                w
            },
            |mut w| black_box(w.commit()),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("snapshot_256_tanks", |b| {
        b.iter(|| black_box(world.snapshot()));
    });
}

criterion_group!(benches, bench_scan_area, bench_fire_bullet, bench_commit);
criterion_main!(benches);
