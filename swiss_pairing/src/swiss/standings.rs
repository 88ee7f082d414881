//! Standings calculation.
//!
//! Standings are never stored. Every call rebuilds them from the match
//! records of one tournament: wins and matches played per member, then the
//! opponent-match-wins (OMW) tiebreak, then a stable sort.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::db::{RecordStore, StoreResult};

use super::models::{MatchRecord, PlayerId, Standing, TournamentId};

/// Computes ranked standings from a record store
pub struct StandingsCalculator<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> StandingsCalculator<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Ranked standings for every member of the tournament
    ///
    /// Ordered by wins, then OMW, both descending. Members tied on both keep
    /// the store's member order.
    pub async fn standings(&self, tournament_id: TournamentId) -> StoreResult<Vec<Standing>> {
        let records = self.store.get_wins_and_matches(tournament_id).await?;

        let mut standings = Vec::with_capacity(records.len());
        for record in records {
            let opponent_match_wins = self
                .opponent_match_wins(tournament_id, record.player_id)
                .await?;
            standings.push(Standing {
                player_id: record.player_id,
                name: record.name,
                wins: record.wins,
                matches: record.matches,
                opponent_match_wins,
            });
        }

        rank(&mut standings);
        Ok(standings)
    }

    /// Total wins of every distinct opponent the player has faced
    pub async fn opponent_match_wins(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<i64> {
        let matches = self
            .store
            .get_matches_involving(tournament_id, player_id)
            .await?;

        let opponents = distinct_opponents(player_id, &matches);
        if opponents.is_empty() {
            return Ok(0);
        }

        self.store.count_wins_for(tournament_id, &opponents).await
    }
}

/// Opponents of `player_id` in `matches`, each listed once, in order of first
/// meeting. The bye sentinel is included when the player has had a bye; it
/// never wins, so it adds nothing to OMW.
pub fn distinct_opponents(player_id: PlayerId, matches: &[MatchRecord]) -> Vec<PlayerId> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .filter_map(|m| m.opponent_of(player_id))
        .filter(|&opponent| seen.insert(opponent))
        .collect()
}

/// Standings order: more wins first, then more OMW
pub fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.opponent_match_wins.cmp(&a.opponent_match_wins))
}

/// Sort standings in place. The sort is stable.
pub fn rank(standings: &mut [Standing]) {
    standings.sort_by(compare_standings);
}
