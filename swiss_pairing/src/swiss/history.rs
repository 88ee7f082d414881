//! Match history lookups used by pairing.

use crate::db::{RecordStore, StoreResult};

use super::models::{PlayerId, TournamentId};

/// Answers rematch and bye questions for one store
#[derive(Clone, Copy)]
pub struct MatchHistory<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> MatchHistory<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Number of matches between the two players, in either order
    pub async fn match_count(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> StoreResult<i64> {
        self.store.match_count_between(tournament_id, p1, p2).await
    }

    /// Whether the two players have met in this tournament
    pub async fn have_played_before(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> StoreResult<bool> {
        Ok(self.match_count(tournament_id, p1, p2).await? > 0)
    }

    /// Whether the player already had a bye in this tournament
    pub async fn has_received_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<bool> {
        self.store.has_bye(tournament_id, player_id).await
    }
}
