//! Battle benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_core::ai::AiController;
use arena_core::grid::{Position, Team};
use arena_core::rules;
use arena_test_utils::fixtures::{capped_config, duel, skirmish};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Full AI-vs-AI battles and the hot rule queries inside them.
pub fn battle_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_5v5_to_completion", |b| {
        b.iter(|| {
            let mut battle = skirmish(capped_config(200));
            black_box(battle.run())
        })
    });

    c.bench_function("ai_turn_duel", |b| {
        let board = duel("Sword", "Sword");
        b.iter(|| {
            let mut bf = board.clone();
            black_box(AiController::new(Team::One).take_turn(&mut bf))
        })
    });

    c.bench_function("area_cells_radius_2", |b| {
        let board = duel("Fireball Staff", "Sword");
        b.iter(|| black_box(rules::area_cells(&board, Position::new(5, 5), 2)))
    });
}

criterion_group!(benches, battle_benchmark);
criterion_main!(benches);
