//! Benchmarks for trajectory generation and the update/publish ticks.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lorenz_trail::prelude::*;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let params = LorenzParams::classic();
    let seed = DVec3::new(0.1, 0.0, 0.0);

    for steps in [10usize, 100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("steps", steps), &steps, |b, &steps| {
            b.iter(|| black_box(generate(black_box(seed), &params, steps)))
        });
    }

    group.finish();
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager");

    // Full window, so every update evicts.
    let mut manager = TrajectoryManager::new(LorenzConfig::default()).unwrap();
    for _ in 0..600 {
        manager.update().unwrap();
    }

    group.bench_function("update_full_window", |b| {
        b.iter(|| black_box(manager.update().unwrap()))
    });

    group.bench_function("publish_full_window", |b| {
        b.iter(|| black_box(manager.publish()))
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut manager = TrajectoryManager::new(LorenzConfig::default()).unwrap();
    for _ in 0..600 {
        manager.update().unwrap();
    }
    let snapshot = manager.publish();
    let mut view = ViewState::default();
    view.start_following(Segment::Red);

    c.bench_function("view_frame_following", |b| {
        b.iter(|| black_box(view.frame(&snapshot).camera))
    });
}

criterion_group!(benches, bench_generate, bench_ticks, bench_frame);
criterion_main!(benches);
