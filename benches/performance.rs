// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for chordpad
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Grid generation across widths and tension levels
//! - One auto mode measure (select, voice, send)
//! - Spelled transposition

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chordpad::grid::{generate_grid, GridParams};
use chordpad::music::{Interval, Pitch, TensionLevel};
use chordpad::output::{shared, LogSink, OutputRouter};
use chordpad::progression::{AutoDirection, AutoModeState, Session, TickOutcome};

fn root() -> Pitch {
    Pitch::natural(chordpad::music::Letter::E)
}

/// Benchmark grid generation (runs on every root change and every measure)
fn bench_grid_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_grid");

    for width in [5usize, 11, 25].iter() {
        group.bench_with_input(BenchmarkId::new("triad", width), width, |b, &width| {
            let params = GridParams::new(root(), width, TensionLevel::Triad);
            b.iter(|| black_box(generate_grid(black_box(&params))))
        });

        group.bench_with_input(BenchmarkId::new("thirteenth", width), width, |b, &width| {
            let params = GridParams::new(root(), width, TensionLevel::Thirteenth);
            b.iter(|| black_box(generate_grid(black_box(&params))))
        });
    }

    group.finish();
}

/// Benchmark a single measure of auto mode
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for direction in [AutoDirection::Up, AutoDirection::Sad] {
        group.bench_function(direction.name(), |b| {
            let mut session = Session::new(
                GridParams::new(root(), 5, TensionLevel::Seventh),
                AutoModeState {
                    direction,
                    ..Default::default()
                },
                OutputRouter::new(shared(LogSink::default())),
            )
            .expect("valid session");
            session.activate();

            b.iter(|| match session.tick() {
                TickOutcome::Played { release, .. } => black_box(release.fire().len()),
                _ => 0,
            })
        });
    }

    group.finish();
}

/// Benchmark spelled transposition and simplification
fn bench_transpose(c: &mut Criterion) {
    c.bench_function("circle_of_fifths_walk", |b| {
        b.iter(|| {
            let mut pitch = black_box(root());
            for _ in 0..12 {
                pitch = pitch.transpose(Interval::PERFECT_FIFTH).simplify();
            }
            black_box(pitch)
        })
    });
}

criterion_group!(benches, bench_grid_generation, bench_tick, bench_transpose);
criterion_main!(benches);
