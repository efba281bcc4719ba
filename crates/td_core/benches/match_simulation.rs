//! Match simulation benchmarks for td_core.
//!
//! Run with: `cargo bench -p td_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use td_core::match_state::MatchState;
use td_core::rules::tick_dt;
use td_test_utils::fixtures::{defended_green_plains, green_plains};

/// Runs whole-match and per-tick benchmarks.
pub fn match_benchmark(c: &mut Criterion) {
    let level = green_plains();

    c.bench_function("full_match_defended", |b| {
        b.iter(|| {
            let mut state = defended_green_plains();
            while !state.is_terminal() {
                black_box(state.tick(tick_dt()));
            }
            black_box(state.summary())
        });
    });

    c.bench_function("tick_mid_wave", |b| {
        let mut base = defended_green_plains();
        base.start_next_wave_now();
        for _ in 0..200 {
            base.tick(tick_dt());
        }
        b.iter(|| {
            let mut state = base.clone();
            black_box(state.tick(tick_dt()))
        });
    });

    c.bench_function("state_hash", |b| {
        let state = MatchState::new(&level).unwrap();
        b.iter(|| black_box(state.state_hash()));
    });
}

criterion_group!(benches, match_benchmark);
criterion_main!(benches);
