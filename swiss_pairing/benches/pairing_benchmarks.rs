use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use swiss_pairing::swiss::{
    PlayerId, Standing, SwissEngine, TournamentId, standings::rank,
};
use swiss_pairing::MemoryRecordStore;

/// Helper to build an unsorted standings table with plenty of ties
fn unsorted_standings(n_players: usize) -> Vec<Standing> {
    (0..n_players)
        .map(|i| Standing {
            player_id: i as PlayerId + 1,
            name: format!("player{}", i),
            wins: (i * 7 % 5) as i64,
            matches: 4,
            opponent_match_wins: (i * 13 % 11) as i64,
        })
        .collect()
}

/// Helper to create an engine whose tournament has played `rounds` rounds
fn setup_event(
    runtime: &tokio::runtime::Runtime,
    n_players: usize,
    rounds: usize,
) -> (SwissEngine, TournamentId) {
    runtime.block_on(async {
        let engine = SwissEngine::new(Arc::new(MemoryRecordStore::new()));
        let tid = engine.create_tournament("Bench").await.unwrap();
        for i in 0..n_players {
            engine
                .register_player(tid, &format!("player{}", i))
                .await
                .unwrap();
        }

        for _ in 0..rounds {
            let pairings = engine.swiss_pairings(tid).await.unwrap();
            for pairing in pairings {
                engine
                    .report_match(tid, pairing.player_a, pairing.player_b)
                    .await
                    .unwrap();
            }
        }

        (engine, tid)
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Benchmark sorting standings of varying field sizes
fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_standings");

    for n_players in [8, 64, 512] {
        let standings = unsorted_standings(n_players);
        group.bench_with_input(
            BenchmarkId::from_parameter(n_players),
            &standings,
            |b, standings| {
                b.iter(|| {
                    let mut rows = standings.clone();
                    rank(&mut rows);
                    rows
                });
            },
        );
    }

    group.finish();
}

/// Benchmark standings computation against the in-memory store
fn bench_player_standings(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("player_standings");

    for n_players in [8, 32, 128] {
        let (engine, tid) = setup_event(&runtime, n_players, 2);
        group.bench_function(BenchmarkId::from_parameter(n_players), |b| {
            b.iter(|| runtime.block_on(engine.player_standings(tid)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark pairing an even field after one played round
fn bench_swiss_pairings(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("swiss_pairings");

    for n_players in [8, 32, 128] {
        let (engine, tid) = setup_event(&runtime, n_players, 1);
        group.bench_function(BenchmarkId::from_parameter(n_players), |b| {
            b.iter(|| runtime.block_on(engine.swiss_pairings(tid)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rank,
    bench_player_standings,
    bench_swiss_pairings
);
criterion_main!(benches);
