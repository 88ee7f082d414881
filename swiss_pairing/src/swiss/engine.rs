//! Swiss engine facade: input validation, per-tournament serialization, and
//! the public operations over a [`RecordStore`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::RecordStore;

use super::errors::{InputError, SwissResult};
use super::history::MatchHistory;
use super::models::{
    Pairing, Player, PlayerId, Round, Standing, Tournament, TournamentId, is_bye,
};
use super::pairing::{GreedyPairing, PairingGenerator, PairingStrategy};
use super::standings::StandingsCalculator;

/// Swiss tournament engine
///
/// Holds no tournament state of its own; everything is read from and written
/// to the store on each call. Pairing generation and match reporting for the
/// same tournament are serialized so a bye write and the reads around it
/// cannot interleave with another writer in this process.
#[derive(Clone)]
pub struct SwissEngine {
    store: Arc<dyn RecordStore>,
    strategy: Arc<dyn PairingStrategy>,
    locks: Arc<Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl SwissEngine {
    /// Create an engine using greedy pairing
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            strategy: Arc::new(GreedyPairing),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replace the pairing strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn PairingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// The underlying record store
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Create a new tournament
    pub async fn create_tournament(&self, name: &str) -> SwissResult<TournamentId> {
        let name = validate_name(name)?;
        let tournament_id = self.store.create_tournament(name).await?;
        log::info!("Created tournament {} '{}'", tournament_id, name);
        Ok(tournament_id)
    }

    /// Look up a tournament
    pub async fn tournament(&self, tournament_id: TournamentId) -> SwissResult<Tournament> {
        self.store
            .get_tournament(tournament_id)
            .await?
            .ok_or_else(|| InputError::TournamentNotFound(tournament_id).into())
    }

    /// List all tournaments
    pub async fn list_tournaments(&self) -> SwissResult<Vec<Tournament>> {
        Ok(self.store.list_tournaments().await?)
    }

    /// Register a new player in a tournament
    ///
    /// Names need not be unique; every call creates a distinct player.
    pub async fn register_player(
        &self,
        tournament_id: TournamentId,
        name: &str,
    ) -> SwissResult<PlayerId> {
        let name = validate_name(name)?;
        self.tournament(tournament_id).await?;

        let player_id = self.store.register_player(tournament_id, name).await?;
        log::info!(
            "Registered player {} '{}' in tournament {}",
            player_id,
            name,
            tournament_id
        );
        Ok(player_id)
    }

    /// Enroll an already registered player in another tournament
    pub async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SwissResult<()> {
        self.tournament(tournament_id).await?;
        self.player(player_id).await?;

        if self.store.is_member(tournament_id, player_id).await? {
            return Err(InputError::AlreadyEnrolled {
                tournament_id,
                player_id,
            }
            .into());
        }

        self.store.enroll_player(tournament_id, player_id).await?;
        log::info!(
            "Enrolled player {} in tournament {}",
            player_id,
            tournament_id
        );
        Ok(())
    }

    /// Look up a player. The bye sentinel is not a player.
    pub async fn player(&self, player_id: PlayerId) -> SwissResult<Player> {
        if is_bye(player_id) {
            return Err(InputError::ReservedPlayer(player_id).into());
        }
        self.store
            .get_player(player_id)
            .await?
            .ok_or_else(|| InputError::PlayerNotFound(player_id).into())
    }

    /// Number of registered players, in one tournament or overall
    pub async fn count_players(&self, tournament_id: Option<TournamentId>) -> SwissResult<i64> {
        if let Some(tournament_id) = tournament_id {
            self.tournament(tournament_id).await?;
        }
        Ok(self.store.count_players(tournament_id).await?)
    }

    /// Record the outcome of a single match between two members
    pub async fn report_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
    ) -> SwissResult<()> {
        self.tournament(tournament_id).await?;
        if winner == loser {
            return Err(InputError::SelfMatch(winner).into());
        }
        self.ensure_member(tournament_id, winner).await?;
        self.ensure_member(tournament_id, loser).await?;

        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.lock().await;
        let store_lock = self.store.lock_tournament(tournament_id).await?;

        let recorded = self.store.record_match(tournament_id, winner, loser).await;
        let released = store_lock.release().await;
        recorded?;
        released?;
        log::info!(
            "Tournament {}: player {} beat player {}",
            tournament_id,
            winner,
            loser
        );
        Ok(())
    }

    /// Ranked standings for the tournament
    pub async fn player_standings(
        &self,
        tournament_id: TournamentId,
    ) -> SwissResult<Vec<Standing>> {
        self.tournament(tournament_id).await?;
        Ok(StandingsCalculator::new(self.store())
            .standings(tournament_id)
            .await?)
    }

    /// Total wins of every distinct opponent the player has faced
    pub async fn opponent_match_wins(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SwissResult<i64> {
        self.tournament(tournament_id).await?;
        self.ensure_member(tournament_id, player_id).await?;
        Ok(StandingsCalculator::new(self.store())
            .opponent_match_wins(tournament_id, player_id)
            .await?)
    }

    /// Number of matches the two players have played against each other
    pub async fn match_count(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> SwissResult<i64> {
        self.tournament(tournament_id).await?;
        self.ensure_member(tournament_id, p1).await?;
        self.ensure_member(tournament_id, p2).await?;
        Ok(MatchHistory::new(self.store())
            .match_count(tournament_id, p1, p2)
            .await?)
    }

    /// Whether the two players have already met in this tournament
    pub async fn have_played_before(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> SwissResult<bool> {
        Ok(self.match_count(tournament_id, p1, p2).await? > 0)
    }

    /// Whether the player already had a bye in this tournament
    pub async fn has_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SwissResult<bool> {
        self.tournament(tournament_id).await?;
        self.ensure_member(tournament_id, player_id).await?;
        Ok(MatchHistory::new(self.store())
            .has_received_bye(tournament_id, player_id)
            .await?)
    }

    /// Pair the next round, recording a bye first if the field is odd.
    ///
    /// Runs under the store's tournament lock, so concurrent callers in
    /// other processes see this round's bye before choosing their own.
    ///
    /// If this returns an error after the bye was recorded, the bye stays
    /// recorded. Check [`has_bye`](Self::has_bye) before retrying.
    pub async fn next_round(&self, tournament_id: TournamentId) -> SwissResult<Round> {
        self.tournament(tournament_id).await?;

        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.lock().await;
        let store_lock = self.store.lock_tournament(tournament_id).await?;

        let generated = PairingGenerator::new(self.store(), self.strategy.as_ref())
            .generate(tournament_id)
            .await;
        let released = store_lock.release().await;
        let round = generated?;
        released?;
        log::info!(
            "Tournament {}: paired {} matches{}",
            tournament_id,
            round.pairings.len(),
            if round.bye.is_some() { " plus a bye" } else { "" }
        );
        Ok(round)
    }

    /// Pairs for the next round, in formation order
    pub async fn swiss_pairings(&self, tournament_id: TournamentId) -> SwissResult<Vec<Pairing>> {
        Ok(self.next_round(tournament_id).await?.pairings)
    }

    /// Delete match records of one tournament, or of every tournament
    pub async fn delete_matches(&self, tournament_id: Option<TournamentId>) -> SwissResult<()> {
        self.store.delete_matches(tournament_id).await?;
        match tournament_id {
            Some(tournament_id) => log::info!("Deleted matches of tournament {}", tournament_id),
            None => log::info!("Deleted all matches"),
        }
        Ok(())
    }

    /// Delete every player except the bye sentinel
    pub async fn delete_players(&self) -> SwissResult<()> {
        self.store.delete_players().await?;
        log::info!("Deleted all players");
        Ok(())
    }

    /// Delete all tournaments with their players and matches
    pub async fn delete_tournaments(&self) -> SwissResult<()> {
        self.store.delete_tournaments().await?;
        log::info!("Deleted all tournaments");
        Ok(())
    }

    async fn ensure_member(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SwissResult<()> {
        if is_bye(player_id) {
            return Err(InputError::ReservedPlayer(player_id).into());
        }
        if !self.store.is_member(tournament_id, player_id).await? {
            return Err(InputError::NotAMember {
                tournament_id,
                player_id,
            }
            .into());
        }
        Ok(())
    }

    async fn tournament_lock(&self, tournament_id: TournamentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(tournament_id).or_default().clone()
    }
}

fn validate_name(name: &str) -> SwissResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::EmptyName.into());
    }
    Ok(name)
}
