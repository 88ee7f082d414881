//! Record store trait and its PostgreSQL implementation.
//!
//! The Swiss engine never touches SQL directly; it reads and appends
//! tournament records through [`RecordStore`], which keeps the engine
//! testable against [`MemoryRecordStore`](super::MemoryRecordStore) and lets
//! embedders bring their own storage.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use super::errors::{StoreError, StoreResult};
use super::timeouts::{DEFAULT_QUERY_TIMEOUT, with_long_timeout, with_timeout};
use crate::swiss::models::{
    BYE_PLAYER_ID, MatchRecord, Player, PlayerId, Tournament, TournamentId, WinRecord,
};

/// Schema applied by [`PgRecordStore::init_schema`]
pub const SCHEMA: &str = include_str!("schema.sql");

/// Exclusive hold on one tournament, taken before pairing or reporting
///
/// Dropping the lock without [`release`](Self::release) still frees it; a
/// PostgreSQL hold rolls back its transaction when the connection returns
/// to the pool.
#[must_use = "the tournament is only locked while this value is held"]
pub enum TournamentLock {
    /// No store-side lock; the engine's in-process mutex is the only guard
    InProcess,
    /// `pg_advisory_xact_lock` held by an open transaction
    Advisory(Transaction<'static, Postgres>),
}

impl TournamentLock {
    /// Release the lock
    pub async fn release(self) -> StoreResult<()> {
        match self {
            TournamentLock::InProcess => Ok(()),
            TournamentLock::Advisory(tx) => Ok(tx.commit().await?),
        }
    }
}

/// Durable storage for players, tournaments, memberships and matches.
///
/// Implementations never return the bye sentinel from player-facing queries
/// (`get_members`, `get_wins_and_matches`, `count_players`) and never delete
/// it. Members are returned in ascending player id order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a tournament and return its ID
    async fn create_tournament(&self, name: &str) -> StoreResult<TournamentId>;

    /// Find a tournament by ID
    async fn get_tournament(&self, tournament_id: TournamentId)
    -> StoreResult<Option<Tournament>>;

    /// List all tournaments, oldest first
    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>>;

    /// Create a player and enroll them in `tournament_id`
    async fn register_player(&self, tournament_id: TournamentId, name: &str)
    -> StoreResult<PlayerId>;

    /// Enroll an existing player in another tournament
    async fn enroll_player(&self, tournament_id: TournamentId, player_id: PlayerId)
    -> StoreResult<()>;

    /// Find a player by ID
    async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>>;

    /// Whether the player is enrolled in the tournament
    async fn is_member(&self, tournament_id: TournamentId, player_id: PlayerId)
    -> StoreResult<bool>;

    /// Number of real players, in one tournament or overall
    async fn count_players(&self, tournament_id: Option<TournamentId>) -> StoreResult<i64>;

    /// Members of the tournament
    async fn get_members(&self, tournament_id: TournamentId) -> StoreResult<Vec<Player>>;

    /// Win and match tallies for every member of the tournament
    async fn get_wins_and_matches(&self, tournament_id: TournamentId)
    -> StoreResult<Vec<WinRecord>>;

    /// Every match in the tournament the player took part in
    async fn get_matches_involving(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Vec<MatchRecord>>;

    /// Total number of matches won in the tournament by any of `player_ids`
    async fn count_wins_for(
        &self,
        tournament_id: TournamentId,
        player_ids: &[PlayerId],
    ) -> StoreResult<i64>;

    /// Number of matches between `p1` and `p2` in either order
    async fn match_count_between(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> StoreResult<i64>;

    /// Whether the player has a match against the bye sentinel
    async fn has_bye(&self, tournament_id: TournamentId, player_id: PlayerId) -> StoreResult<bool>;

    /// Take a lock that excludes other writers to this tournament, across
    /// processes where the store supports it.
    ///
    /// Stores that live in one process need nothing beyond the engine's
    /// mutex and keep the default.
    async fn lock_tournament(&self, _tournament_id: TournamentId) -> StoreResult<TournamentLock> {
        Ok(TournamentLock::InProcess)
    }

    /// Append a match result
    ///
    /// A second bye for the same player in one tournament fails with
    /// [`StoreError::Conflict`].
    async fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
    ) -> StoreResult<()>;

    /// Delete matches of one tournament, or of all tournaments
    async fn delete_matches(&self, tournament_id: Option<TournamentId>) -> StoreResult<()>;

    /// Delete every player except the bye sentinel, with their memberships
    async fn delete_players(&self) -> StoreResult<()>;

    /// Delete all matches, memberships, players and tournaments
    async fn delete_tournaments(&self) -> StoreResult<()>;
}

/// PostgreSQL implementation of [`RecordStore`]
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the per-query timeout
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Create tables, the standings view and the bye sentinel if missing
    pub async fn init_schema(&self) -> StoreResult<()> {
        with_long_timeout(sqlx::raw_sql(SCHEMA).execute(&self.pool)).await?;
        log::info!("Record store schema initialized");
        Ok(())
    }

    fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
        Ok(Tournament {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    fn player_from_row(row: &PgRow) -> StoreResult<Player> {
        Ok(Player {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create_tournament(&self, name: &str) -> StoreResult<TournamentId> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("INSERT INTO tournaments (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT id, name FROM tournaments WHERE id = $1")
                .bind(tournament_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(Self::tournament_from_row).transpose()
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT id, name FROM tournaments ORDER BY id").fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(Self::tournament_from_row).collect()
    }

    async fn register_player(
        &self,
        tournament_id: TournamentId,
        name: &str,
    ) -> StoreResult<PlayerId> {
        let mut tx = self.pool.begin().await?;

        let row = with_timeout(
            self.query_timeout,
            sqlx::query("INSERT INTO players (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&mut *tx),
        )
        .await?;
        let player_id: PlayerId = row.try_get("id")?;

        with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO tournament_players (tournament_id, player_id) VALUES ($1, $2)",
            )
            .bind(tournament_id)
            .bind(player_id)
            .execute(&mut *tx),
        )
        .await?;

        tx.commit().await?;
        Ok(player_id)
    }

    async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO tournament_players (tournament_id, player_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(tournament_id)
            .bind(player_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT id, name FROM players WHERE id = $1 AND id <> $2")
                .bind(player_id)
                .bind(BYE_PLAYER_ID)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(Self::player_from_row).transpose()
    }

    async fn is_member(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<bool> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT EXISTS (
                    SELECT 1 FROM tournament_players
                    WHERE tournament_id = $1 AND player_id = $2 AND player_id <> $3
                 ) AS is_member",
            )
            .bind(tournament_id)
            .bind(player_id)
            .bind(BYE_PLAYER_ID)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("is_member")?)
    }

    async fn count_players(&self, tournament_id: Option<TournamentId>) -> StoreResult<i64> {
        let query = match tournament_id {
            Some(tournament_id) => sqlx::query(
                "SELECT COUNT(player_id) AS num FROM tournament_players
                 WHERE tournament_id = $1 AND player_id <> $2",
            )
            .bind(tournament_id)
            .bind(BYE_PLAYER_ID),
            None => sqlx::query("SELECT COUNT(id) AS num FROM players WHERE id <> $1")
                .bind(BYE_PLAYER_ID),
        };

        let row = with_timeout(self.query_timeout, query.fetch_one(&self.pool)).await?;
        Ok(row.try_get("num")?)
    }

    async fn get_members(&self, tournament_id: TournamentId) -> StoreResult<Vec<Player>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT p.id, p.name FROM tournament_players tp
                 JOIN players p ON p.id = tp.player_id
                 WHERE tp.tournament_id = $1 AND p.id <> $2
                 ORDER BY p.id",
            )
            .bind(tournament_id)
            .bind(BYE_PLAYER_ID)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(Self::player_from_row).collect()
    }

    async fn get_wins_and_matches(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<WinRecord>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, name, wins, wins + losses AS matches
                 FROM v_wins_and_losses
                 WHERE tournament_id = $1
                 ORDER BY id",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<WinRecord> {
                Ok(WinRecord {
                    player_id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    wins: row.try_get("wins")?,
                    matches: row.try_get("matches")?,
                })
            })
            .collect()
    }

    async fn get_matches_involving(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Vec<MatchRecord>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT winner, loser FROM matches
                 WHERE (winner = $1 OR loser = $1) AND tournament_id = $2
                 ORDER BY id",
            )
            .bind(player_id)
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<MatchRecord> {
                Ok(MatchRecord::new(row.try_get("winner")?, row.try_get("loser")?))
            })
            .collect()
    }

    async fn count_wins_for(
        &self,
        tournament_id: TournamentId,
        player_ids: &[PlayerId],
    ) -> StoreResult<i64> {
        if player_ids.is_empty() {
            return Ok(0);
        }

        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT COUNT(winner) AS wins FROM matches
                 WHERE tournament_id = $1 AND winner = ANY($2)",
            )
            .bind(tournament_id)
            .bind(player_ids.to_vec())
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("wins")?)
    }

    async fn match_count_between(
        &self,
        tournament_id: TournamentId,
        p1: PlayerId,
        p2: PlayerId,
    ) -> StoreResult<i64> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT COUNT(id) AS played FROM matches
                 WHERE tournament_id = $1
                   AND ((winner = $2 AND loser = $3) OR (winner = $3 AND loser = $2))",
            )
            .bind(tournament_id)
            .bind(p1)
            .bind(p2)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("played")?)
    }

    async fn has_bye(&self, tournament_id: TournamentId, player_id: PlayerId) -> StoreResult<bool> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT EXISTS (
                    SELECT 1 FROM matches
                    WHERE winner = $1 AND loser = $2 AND tournament_id = $3
                 ) AS has_bye",
            )
            .bind(player_id)
            .bind(BYE_PLAYER_ID)
            .bind(tournament_id)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("has_bye")?)
    }

    async fn lock_tournament(&self, tournament_id: TournamentId) -> StoreResult<TournamentLock> {
        let mut tx = with_timeout(self.query_timeout, self.pool.begin()).await?;
        // Waits for any other session pairing or reporting in this tournament.
        with_long_timeout(
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(tournament_id)
                .execute(&mut *tx),
        )
        .await?;
        log::debug!("Tournament {}: advisory lock acquired", tournament_id);
        Ok(TournamentLock::Advisory(tx))
    }

    async fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
    ) -> StoreResult<()> {
        let inserted = with_timeout(
            self.query_timeout,
            sqlx::query("INSERT INTO matches (tournament_id, winner, loser) VALUES ($1, $2, $3)")
                .bind(tournament_id)
                .bind(winner)
                .bind(loser)
                .execute(&self.pool),
        )
        .await;

        match inserted {
            // matches_one_bye_idx is the only unique constraint a new row can hit
            Err(StoreError::Database(sqlx::Error::Database(db_err)))
                if db_err.is_unique_violation() =>
            {
                Err(StoreError::Conflict(format!(
                    "player {winner} already had a bye in tournament {tournament_id}"
                )))
            }
            other => other.map(|_| ()),
        }
    }

    async fn delete_matches(&self, tournament_id: Option<TournamentId>) -> StoreResult<()> {
        let query = match tournament_id {
            Some(tournament_id) => {
                sqlx::query("DELETE FROM matches WHERE tournament_id = $1").bind(tournament_id)
            }
            None => sqlx::query("DELETE FROM matches"),
        };

        with_long_timeout(query.execute(&self.pool)).await?;
        Ok(())
    }

    async fn delete_players(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        with_long_timeout(sqlx::query("DELETE FROM tournament_players").execute(&mut *tx)).await?;
        // Matches referencing removed players go with them through ON DELETE CASCADE.
        with_long_timeout(
            sqlx::query("DELETE FROM players WHERE id <> $1")
                .bind(BYE_PLAYER_ID)
                .execute(&mut *tx),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_tournaments(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        with_long_timeout(sqlx::query("DELETE FROM matches").execute(&mut *tx)).await?;
        with_long_timeout(sqlx::query("DELETE FROM tournament_players").execute(&mut *tx)).await?;
        with_long_timeout(
            sqlx::query("DELETE FROM players WHERE id <> $1")
                .bind(BYE_PLAYER_ID)
                .execute(&mut *tx),
        )
        .await?;
        with_long_timeout(sqlx::query("DELETE FROM tournaments").execute(&mut *tx)).await?;
        tx.commit().await?;
        Ok(())
    }
}
