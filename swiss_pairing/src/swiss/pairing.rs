//! Next-round pairing.
//!
//! [`PairingGenerator`] ranks the field, hands out a bye when the field is
//! odd, and delegates the actual matching to a [`PairingStrategy`]. The
//! shipped strategy is [`GreedyPairing`]; a global matcher can be plugged in
//! through the same trait without touching standings or history.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::db::RecordStore;

use super::errors::{PairingError, SwissResult};
use super::history::MatchHistory;
use super::models::{BYE_PLAYER_ID, Pairing, Player, Round, Standing, TournamentId};
use super::standings::StandingsCalculator;

/// Matches a ranked, even-sized field into pairs
#[async_trait]
pub trait PairingStrategy: Send + Sync {
    /// Pair every player in `ranked`, which is already in standings order
    /// and has the bye player removed.
    async fn pair(
        &self,
        tournament_id: TournamentId,
        ranked: Vec<Standing>,
        history: &MatchHistory<'_>,
    ) -> SwissResult<Vec<Pairing>>;
}

/// Top-down greedy pairing without backtracking.
///
/// The highest-ranked unpaired player takes the first player below them they
/// have not met yet. If nobody is left for them the round fails with
/// [`PairingError::NoOpponent`], even when a different earlier choice would
/// have worked.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPairing;

#[async_trait]
impl PairingStrategy for GreedyPairing {
    async fn pair(
        &self,
        tournament_id: TournamentId,
        ranked: Vec<Standing>,
        history: &MatchHistory<'_>,
    ) -> SwissResult<Vec<Pairing>> {
        let mut pool: VecDeque<Standing> = ranked.into();
        let mut pairings = Vec::with_capacity(pool.len() / 2);

        while let Some(anchor) = pool.pop_front() {
            let mut partner = None;
            for (idx, candidate) in pool.iter().enumerate() {
                if !history
                    .have_played_before(tournament_id, anchor.player_id, candidate.player_id)
                    .await?
                {
                    partner = Some(idx);
                    break;
                }
            }

            let Some(candidate) = partner.and_then(|idx| pool.remove(idx)) else {
                return Err(PairingError::NoOpponent {
                    tournament_id,
                    anchor: anchor.player_id,
                    unpaired: pool.len() + 1,
                }
                .into());
            };

            log::debug!(
                "Tournament {}: paired {} with {}",
                tournament_id,
                anchor.player_id,
                candidate.player_id
            );
            pairings.push(Pairing::between(&anchor, &candidate));
        }

        Ok(pairings)
    }
}

/// Produces the next round for a tournament
pub struct PairingGenerator<'a> {
    store: &'a dyn RecordStore,
    strategy: &'a dyn PairingStrategy,
}

impl<'a> PairingGenerator<'a> {
    pub fn new(store: &'a dyn RecordStore, strategy: &'a dyn PairingStrategy) -> Self {
        Self { store, strategy }
    }

    /// Rank the field, assign a bye if needed, and pair the rest.
    ///
    /// The bye is written before pairing starts and is not rolled back if
    /// pairing then fails.
    pub async fn generate(&self, tournament_id: TournamentId) -> SwissResult<Round> {
        let mut ranked = StandingsCalculator::new(self.store)
            .standings(tournament_id)
            .await?;
        let history = MatchHistory::new(self.store);

        let bye = if ranked.len() % 2 == 1 {
            Some(self.assign_bye(tournament_id, &mut ranked, &history).await?)
        } else {
            None
        };

        let pairings = self.strategy.pair(tournament_id, ranked, &history).await?;

        Ok(Round { pairings, bye })
    }

    /// Give the bye to the highest-ranked player who has not had one, record
    /// it, and take them out of `ranked`.
    async fn assign_bye(
        &self,
        tournament_id: TournamentId,
        ranked: &mut Vec<Standing>,
        history: &MatchHistory<'_>,
    ) -> SwissResult<Player> {
        let mut chosen = None;
        for (idx, standing) in ranked.iter().enumerate() {
            if !history
                .has_received_bye(tournament_id, standing.player_id)
                .await?
            {
                chosen = Some(idx);
                break;
            }
        }

        let Some(idx) = chosen else {
            return Err(PairingError::ByeExhausted {
                tournament_id,
                players: ranked.len(),
            }
            .into());
        };

        let standing = ranked.remove(idx);
        self.store
            .record_match(tournament_id, standing.player_id, BYE_PLAYER_ID)
            .await?;
        log::info!(
            "Tournament {}: bye awarded to player {} ({})",
            tournament_id,
            standing.player_id,
            standing.name
        );

        Ok(Player::new(standing.player_id, standing.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::swiss::errors::SwissError;
    use crate::swiss::models::PlayerId;

    async fn field(store: &MemoryRecordStore, size: usize) -> (TournamentId, Vec<PlayerId>) {
        let tid = store.create_tournament("Test").await.unwrap();
        let mut ids = Vec::new();
        for i in 0..size {
            ids.push(store.register_player(tid, &format!("P{i}")).await.unwrap());
        }
        (tid, ids)
    }

    fn as_pairs(pairings: &[Pairing]) -> Vec<(PlayerId, PlayerId)> {
        pairings.iter().map(|p| (p.player_a, p.player_b)).collect()
    }

    #[tokio::test]
    async fn test_even_field_pairs_adjacent_players() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 4).await;

        let round = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap();

        assert!(round.bye.is_none());
        assert_eq!(as_pairs(&round.pairings), vec![(ids[0], ids[1]), (ids[2], ids[3])]);
        assert_eq!(store.match_total().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_greedy_skips_previous_opponent() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 4).await;
        let (fred, barney, wilma, betty) = (ids[0], ids[1], ids[2], ids[3]);
        for (w, l) in [
            (fred, barney),
            (fred, barney),
            (fred, barney),
            (barney, fred),
            (barney, fred),
            (wilma, betty),
        ] {
            store.record_match(tid, w, l).await.unwrap();
        }

        let round = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap();

        assert_eq!(as_pairs(&round.pairings), vec![(fred, wilma), (barney, betty)]);
    }

    #[tokio::test]
    async fn test_odd_field_awards_bye_to_top_player_first() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 3).await;

        let round = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap();

        let bye = round.bye.clone().expect("odd field should have a bye");
        assert_eq!(bye.id, ids[0]);
        assert_eq!(as_pairs(&round.pairings), vec![(ids[1], ids[2])]);
        assert!(store.has_bye(tid, ids[0]).await.unwrap());
        assert_eq!(round.player_count(), 3);
    }

    #[tokio::test]
    async fn test_bye_skips_players_who_already_had_one() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 3).await;
        store.record_match(tid, ids[0], BYE_PLAYER_ID).await.unwrap();

        let round = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap();

        // ids[0] leads on the bye win, so the next-ranked player gets this bye.
        let bye = round.bye.clone().expect("odd field should have a bye");
        assert_eq!(bye.id, ids[1]);
        assert_eq!(as_pairs(&round.pairings), vec![(ids[0], ids[2])]);
    }

    #[tokio::test]
    async fn test_bye_exhausted_is_reported_without_writing() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 3).await;
        for &pid in &ids {
            store.record_match(tid, pid, BYE_PLAYER_ID).await.unwrap();
        }
        let before = store.match_total().unwrap();

        let err = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SwissError::Pairing(PairingError::ByeExhausted { players: 3, .. })
        ));
        assert_eq!(store.match_total().unwrap(), before);
    }

    #[tokio::test]
    async fn test_no_opponent_is_reported_instead_of_truncating() {
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 2).await;
        store.record_match(tid, ids[0], ids[1]).await.unwrap();

        let err = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap_err();

        match err {
            SwissError::Pairing(PairingError::NoOpponent {
                anchor, unpaired, ..
            }) => {
                assert_eq!(anchor, ids[0]);
                assert_eq!(unpaired, 2);
            }
            other => panic!("expected NoOpponent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_greedy_does_not_backtrack() {
        // {a,c} {b,d} would be rematch-free, but the scan takes {a,b} first
        // and strands c and d, who already met.
        let store = MemoryRecordStore::new();
        let (tid, ids) = field(&store, 4).await;
        let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
        store.record_match(tid, c, d).await.unwrap();

        let standings = StandingsCalculator::new(&store).standings(tid).await.unwrap();
        let by_id = |pid: PlayerId| {
            standings
                .iter()
                .find(|s| s.player_id == pid)
                .cloned()
                .unwrap()
        };
        let ranked = vec![by_id(a), by_id(b), by_id(c), by_id(d)];

        let history = MatchHistory::new(&store);
        let err = GreedyPairing.pair(tid, ranked, &history).await.unwrap_err();

        assert!(matches!(
            err,
            SwissError::Pairing(PairingError::NoOpponent { anchor, unpaired: 2, .. }) if anchor == c
        ));
    }

    #[tokio::test]
    async fn test_empty_field_yields_empty_round() {
        let store = MemoryRecordStore::new();
        let (tid, _) = field(&store, 0).await;

        let round = PairingGenerator::new(&store, &GreedyPairing)
            .generate(tid)
            .await
            .unwrap();

        assert!(round.pairings.is_empty());
        assert!(round.bye.is_none());
    }
}
