/// Property-based tests for standings and pairing using proptest
///
/// Random fields play random results for a few rounds. Whenever a round can
/// be paired, it must place every player exactly once, never repeat a
/// pairing, and never hand the same player two byes.
use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use swiss_pairing::swiss::{
    PairingError, PlayerId, Standing, SwissEngine, SwissError, standings::rank,
};
use swiss_pairing::MemoryRecordStore;

// Strategy to generate a standings row with a small record
fn standing_strategy() -> impl Strategy<Value = (i64, i64)> {
    (0i64..6, 0i64..20)
}

fn standings_from(rows: &[(i64, i64)]) -> Vec<Standing> {
    rows.iter()
        .enumerate()
        .map(|(i, &(wins, omw))| Standing {
            player_id: i as PlayerId + 1,
            name: format!("Player {}", i + 1),
            wins,
            matches: wins,
            opponent_match_wins: omw,
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Debug, Default)]
struct EventOutcome {
    rounds_paired: usize,
    violations: Vec<String>,
}

/// Play `results.len()` rounds, using each bit list to pick winners
async fn play_event(players: usize, results: &[Vec<bool>]) -> EventOutcome {
    let engine = SwissEngine::new(Arc::new(MemoryRecordStore::new()));
    let tid = engine.create_tournament("Property").await.unwrap();
    for i in 0..players {
        engine
            .register_player(tid, &format!("Player {i}"))
            .await
            .unwrap();
    }

    let mut outcome = EventOutcome::default();
    let mut met = HashSet::new();
    let mut bye_holders = HashSet::new();

    for bits in results {
        let round = match engine.next_round(tid).await {
            Ok(round) => round,
            Err(SwissError::Pairing(PairingError::NoOpponent { .. }))
            | Err(SwissError::Pairing(PairingError::ByeExhausted { .. })) => break,
            Err(other) => {
                outcome.violations.push(format!("unexpected error: {other}"));
                break;
            }
        };
        outcome.rounds_paired += 1;

        if round.player_count() != players {
            outcome
                .violations
                .push(format!("placed {} of {players}", round.player_count()));
        }
        if let Some(bye) = &round.bye {
            if !bye_holders.insert(bye.id) {
                outcome.violations.push(format!("second bye for {}", bye.id));
            }
        }

        let mut placed = HashSet::new();
        for (pairing, &a_wins) in round.pairings.iter().zip(bits.iter().cycle()) {
            let (a, b) = (pairing.player_a, pairing.player_b);
            if !placed.insert(a) || !placed.insert(b) {
                outcome.violations.push(format!("player placed twice in {a}-{b}"));
            }
            if !met.insert((a.min(b), a.max(b))) {
                outcome.violations.push(format!("rematch {a}-{b}"));
            }
            let (winner, loser) = if a_wins { (a, b) } else { (b, a) };
            engine.report_match(tid, winner, loser).await.unwrap();
        }
    }

    outcome
}

proptest! {
    #[test]
    fn test_rank_orders_by_wins_then_omw(
        rows in prop::collection::vec(standing_strategy(), 0..24)
    ) {
        let mut standings = standings_from(&rows);
        rank(&mut standings);

        for pair in standings.windows(2) {
            let (hi, lo) = (&pair[0], &pair[1]);
            prop_assert!(hi.wins >= lo.wins);
            if hi.wins == lo.wins {
                prop_assert!(hi.opponent_match_wins >= lo.opponent_match_wins);
                if hi.opponent_match_wins == lo.opponent_match_wins {
                    // Full ties keep their input order
                    prop_assert!(hi.player_id < lo.player_id);
                }
            }
        }
    }

    #[test]
    fn test_rank_is_a_permutation(rows in prop::collection::vec(standing_strategy(), 0..24)) {
        let original = standings_from(&rows);
        let mut ranked = original.clone();
        rank(&mut ranked);

        let before: HashSet<PlayerId> = original.iter().map(|s| s.player_id).collect();
        let after: HashSet<PlayerId> = ranked.iter().map(|s| s.player_id).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(original.len(), ranked.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_rounds_never_rematch_or_double_bye(
        players in 2usize..11,
        results in prop::collection::vec(prop::collection::vec(any::<bool>(), 1..6), 1..5),
    ) {
        let outcome = runtime().block_on(play_event(players, &results));

        prop_assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
        // The first round of a fresh event always pairs
        prop_assert!(outcome.rounds_paired >= 1);
    }
}
