//! In-memory [`RecordStore`] for tests, benchmarks and embedders that do not
//! need durable storage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::errors::{StoreError, StoreResult};
use super::repository::RecordStore;
use crate::swiss::models::{
    BYE_PLAYER_ID, BYE_PLAYER_NAME, MatchRecord, Player, PlayerId, Tournament, TournamentId,
    WinRecord, is_bye,
};

#[derive(Debug)]
struct Tables {
    next_player_id: PlayerId,
    next_tournament_id: TournamentId,
    players: BTreeMap<PlayerId, String>,
    tournaments: BTreeMap<TournamentId, String>,
    memberships: BTreeSet<(TournamentId, PlayerId)>,
    matches: Vec<(TournamentId, MatchRecord)>,
}

impl Tables {
    fn new() -> Self {
        let mut players = BTreeMap::new();
        players.insert(BYE_PLAYER_ID, BYE_PLAYER_NAME.to_string());

        Self {
            next_player_id: BYE_PLAYER_ID + 1,
            next_tournament_id: 1,
            players,
            tournaments: BTreeMap::new(),
            memberships: BTreeSet::new(),
            matches: Vec::new(),
        }
    }

    fn matches_in(&self, tournament_id: TournamentId) -> impl Iterator<Item = &MatchRecord> {
        self.matches
            .iter()
            .filter(move |(tid, _)| *tid == tournament_id)
            .map(|(_, m)| m)
    }

    fn member_ids(&self, tournament_id: TournamentId) -> impl Iterator<Item = PlayerId> + '_ {
        self.memberships
            .range((tournament_id, PlayerId::MIN)..=(tournament_id, PlayerId::MAX))
            .map(|&(_, pid)| pid)
            .filter(|&pid| !is_bye(pid))
    }

    fn player(&self, player_id: PlayerId) -> StoreResult<Player> {
        self.players
            .get(&player_id)
            .map(|name| Player::new(player_id, name.clone()))
            .ok_or_else(|| {
                StoreError::Corrupt(format!("membership for missing player {player_id}"))
            })
    }
}

/// Record store backed by in-process tables
#[derive(Debug)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Create an empty store seeded with the bye sentinel
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }

    /// Number of stored matches across all tournaments, byes included
    pub fn match_total(&self) -> StoreResult<usize> {
        Ok(self.read()?.matches.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Corrupt("record store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Corrupt("record store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_tournament(&self, name: &str) -> StoreResult<TournamentId> {
        let mut tables = self.write()?;
        let id = tables.next_tournament_id;
        tables.next_tournament_id += 1;
        tables.tournaments.insert(id, name.to_string());
        Ok(id)
    }

    async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        Ok(self
            .read()?
            .tournaments
            .get(&tournament_id)
            .map(|name| Tournament {
                id: tournament_id,
                name: name.clone(),
            }))
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        Ok(self
            .read()?
            .tournaments
            .iter()
            .map(|(&id, name)| Tournament {
                id,
                name: name.clone(),
            })
            .collect())
    }

    async fn register_player(
        &self,
        tournament_id: TournamentId,
        name: &str,
    ) -> StoreResult<PlayerId> {
        let mut tables = self.write()?;
        if !tables.tournaments.contains_key(&tournament_id) {
            return Err(StoreError::Corrupt(format!(
                "tournament {tournament_id} does not exist"
            )));
        }

        let id = tables.next_player_id;
        tables.next_player_id += 1;
        tables.players.insert(id, name.to_string());
        tables.memberships.insert((tournament_id, id));
        Ok(id)
    }

    async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.tournaments.contains_key(&tournament_id)
            || !tables.players.contains_key(&player_id)
        {
            return Err(StoreError::Corrupt(format!(
                "cannot enroll player {player_id} in tournament {tournament_id}"
            )));
        }
        tables.memberships.insert((tournament_id, player_id));
        Ok(())
    }

    async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>> {
        if is_bye(player_id) {
            return Ok(None);
        }
        Ok(self
            .read()?
            .players
            .get(&player_id)
            .map(|name| Player::new(player_id, name.clone())))
    }

    async fn is_member(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<bool> {
        Ok(!is_bye(player_id)
            && self
                .read()?
                .memberships
                .contains(&(tournament_id, player_id)))
    }

    async fn count_players(&self, tournament_id: Option<TournamentId>) -> StoreResult<i64> {
        let tables = self.read()?;
        let count = match tournament_id {
            Some(tournament_id) => tables.member_ids(tournament_id).count(),
            None => tables.players.keys().filter(|&&pid| !is_bye(pid)).count(),
        };
        Ok(count as i64)
    }

    async fn get_members(&self, tournament_id: TournamentId) -> StoreResult<Vec<Player>> {
        let tables = self.read()?;
        tables
            .member_ids(tournament_id)
            .map(|pid| tables.player(pid))
            .collect()
    }

    async fn get_wins_and_matches(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<WinRecord>> {
        let tables = self.read()?;
        tables
            .member_ids(tournament_id)
            .map(|pid| -> StoreResult<WinRecord> {
                let player = tables.player(pid)?;
                let (wins, matches) =
                    tables
                        .matches_in(tournament_id)
                        .fold((0, 0), |(wins, matches), m| {
                            if m.winner == pid {
                                (wins + 1, matches + 1)
                            } else if m.loser == pid {
                                (wins, matches + 1)
                            } else {
                                (wins, matches)
                            }
                        });
                Ok(WinRecord {
                    player_id: pid,
                    name: player.name,
                    wins,
                    matches,
                })
            })
            .collect()
    }

    async fn get_matches_involving(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Vec<MatchRecord>> {
        Ok(self
            .read()?
            .matches_in(tournament_id)
            .filter(|m| m.opponent_of(player_id).is_some())
            .copied()
            .collect())
    }

    async fn count_wins_for(
        &self,
        tournament_id: TournamentId,
        player_ids: &[PlayerId],
    ) -> StoreResult<i64> {
        let tables = self.read()?;
        let wins = tables
            .matches_in(tournament_id)
            .filter(|m| player_ids.contains(&m.winner))
            .count();
        Ok(wins as i64)
    }

    async fn match_count_between(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> StoreResult<i64> {
        let tables = self.read()?;
        let played = tables
            .matches_in(tournament_id)
            .filter(|m| m.is_between(p1, p2))
            .count();
        Ok(played as i64)
    }

    async fn has_bye(&self, tournament_id: TournamentId, player_id: PlayerId) -> StoreResult<bool> {
        Ok(self
            .read()?
            .matches_in(tournament_id)
            .any(|m| m.winner == player_id && m.is_bye()))
    }

    async fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.tournaments.contains_key(&tournament_id) {
            return Err(StoreError::Corrupt(format!(
                "tournament {tournament_id} does not exist"
            )));
        }
        let record = MatchRecord::new(winner, loser);
        if record.is_bye() && tables.matches_in(tournament_id).any(|m| *m == record) {
            return Err(StoreError::Conflict(format!(
                "player {winner} already had a bye in tournament {tournament_id}"
            )));
        }
        tables.matches.push((tournament_id, record));
        Ok(())
    }

    async fn delete_matches(&self, tournament_id: Option<TournamentId>) -> StoreResult<()> {
        let mut tables = self.write()?;
        match tournament_id {
            Some(tournament_id) => tables.matches.retain(|(tid, _)| *tid != tournament_id),
            None => tables.matches.clear(),
        }
        Ok(())
    }

    async fn delete_players(&self) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.memberships.clear();
        tables.players.retain(|&pid, _| is_bye(pid));
        // Same effect as the cascading delete in the PostgreSQL schema.
        tables
            .matches
            .retain(|(_, m)| is_bye(m.winner) && is_bye(m.loser));
        Ok(())
    }

    async fn delete_tournaments(&self) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.matches.clear();
        tables.memberships.clear();
        tables.players.retain(|&pid, _| is_bye(pid));
        tables.tournaments.clear();
        Ok(())
    }
}
