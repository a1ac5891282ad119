//! Match tick benchmarks for broadside_core.
//!
//! Run with: `cargo bench -p broadside_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use broadside_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn busy_match() -> MatchContext {
    let config = MatchConfig {
        lane_count: 5,
        max_energy: 100,
        starting_energy: 100,
        cooldown_ticks: 0,
        ..MatchConfig::default()
    };
    let mut ctx = match MatchContext::new(config, CardCatalog::standard()) {
        Ok(ctx) => ctx,
        Err(err) => panic!("bench config rejected: {err}"),
    };
    if let Err(err) = ctx.start_match() {
        panic!("bench match failed to start: {err}");
    }

    let deckhand = ctx.catalog().get(&CardId::new("deckhand")).cloned();
    for lane in 0..5 {
        for side in Side::ALL {
            for _ in 0..4 {
                ctx.try_play_card(deckhand.as_ref(), lane, None, side);
                ctx.launch_from_lane(lane, side);
            }
        }
    }
    ctx
}

/// Ticks a match with forty ships in flight.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("tick_busy_lanes", |b| {
        b.iter_batched(
            busy_match,
            |mut ctx| {
                for _ in 0..100 {
                    black_box(ctx.tick());
                }
                ctx
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("state_hash", |b| {
        let ctx = busy_match();
        b.iter(|| black_box(ctx.state_hash()))
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
