use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use gala_api::prelude::*;
use gala_node::store::BlockHeader;
use gala_node::{App, AppBuilder, GenesisState};
use tempdir::TempDir;

fn fresh_app() -> (App, TempDir) {
    let temp_dir = TempDir::new("block_bench").unwrap();
    let mut app = AppBuilder::new(temp_dir.path()).migrations(Vec::new()).build().unwrap();
    let mut genesis = GenesisState::new("gala-bench", 0);
    genesis.staking.validators = (1..=50u8)
        .map(|i| Validator::new(Address::new([i; 20]), i as u128 * DEFAULT_POWER_REDUCTION))
        .collect();
    app.init_chain(&genesis).unwrap();
    (app, temp_dir)
}

fn bench_blocks(c: &mut Criterion) {
    c.bench_function("block_without_epoch", |b| {
        b.iter_batched(
            fresh_app,
            |(mut app, _dir)| {
                // Height 1 starts every epoch in both benches.
                app.process_block(BlockHeader::new(1, 1), &[]).unwrap();
                app.process_block(BlockHeader::new(2, 2), &[]).unwrap();
            },
            BatchSize::PerIteration,
        )
    });

    c.bench_function("block_with_day_epoch", |b| {
        b.iter_batched(
            fresh_app,
            |(mut app, _dir)| {
                app.process_block(BlockHeader::new(1, 1), &[]).unwrap();
                app.process_block(BlockHeader::new(2, DAY_SECONDS + 1), &[]).unwrap();
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, bench_blocks);
criterion_main!(benches);
