//! Swiss engine error types.

use thiserror::Error;

use super::models::{PlayerId, TournamentId};
use crate::db::StoreError;

/// Malformed arguments, rejected before any computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Player {player_id} is not registered in tournament {tournament_id}")]
    NotAMember {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },

    /// The bye sentinel was passed where a real player is required
    #[error("Player {0} is reserved for byes")]
    ReservedPlayer(PlayerId),

    #[error("Player {0} cannot play against themselves")]
    SelfMatch(PlayerId),

    #[error("Player {player_id} is already registered in tournament {tournament_id}")]
    AlreadyEnrolled {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },

    #[error("Name must not be empty")]
    EmptyName,
}

/// The next round cannot be paired
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    /// Every remaining candidate has already played the anchor
    #[error(
        "No unplayed opponent left for player {anchor} in tournament {tournament_id} \
         ({unpaired} players still unpaired)"
    )]
    NoOpponent {
        tournament_id: TournamentId,
        anchor: PlayerId,
        unpaired: usize,
    },

    /// Odd field where every player has already had a bye
    #[error("All {players} players in tournament {tournament_id} have already had a bye")]
    ByeExhausted {
        tournament_id: TournamentId,
        players: usize,
    },
}

/// Swiss engine errors
#[derive(Debug, Error)]
pub enum SwissError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Pairing impossible: {0}")]
    Pairing(#[from] PairingError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

impl SwissError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            SwissError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the failure was caused by the caller's arguments
    pub fn is_input(&self) -> bool {
        matches!(self, SwissError::Input(_))
    }
}

impl From<sqlx::Error> for SwissError {
    fn from(err: sqlx::Error) -> Self {
        SwissError::Store(StoreError::Database(err))
    }
}

/// Result type for Swiss engine operations
pub type SwissResult<T> = Result<T, SwissError>;
