//! Swiss tournament data models.

use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// Player ID type
pub type PlayerId = i64;

/// Reserved ID of the sentinel player that stands in as a bye opponent.
pub const BYE_PLAYER_ID: PlayerId = 0;

/// Display name of the sentinel bye player.
pub const BYE_PLAYER_NAME: &str = "Bye";

/// Returns true if `player_id` is the sentinel bye player.
pub fn is_bye(player_id: PlayerId) -> bool {
    player_id == BYE_PLAYER_ID
}

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID
    pub id: PlayerId,
    /// Display name (need not be unique)
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Tournament ID
    pub id: TournamentId,
    /// Tournament name
    pub name: String,
}

/// A stored match result.
///
/// A bye is recorded as a match whose loser is [`BYE_PLAYER_ID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Winning player
    pub winner: PlayerId,
    /// Losing player (or the bye sentinel)
    pub loser: PlayerId,
}

impl MatchRecord {
    pub fn new(winner: PlayerId, loser: PlayerId) -> Self {
        Self { winner, loser }
    }

    /// Whether this match is a bye
    pub fn is_bye(&self) -> bool {
        is_bye(self.loser)
    }

    /// The opponent of `player_id` in this match, if they took part.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.winner == player_id {
            Some(self.loser)
        } else if self.loser == player_id {
            Some(self.winner)
        } else {
            None
        }
    }

    /// Whether this match was played between `p1` and `p2`, in either order.
    pub fn is_between(&self, p1: PlayerId, p2: PlayerId) -> bool {
        (self.winner == p1 && self.loser == p2) || (self.winner == p2 && self.loser == p1)
    }
}

/// Raw win/match tally for one member, as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub wins: i64,
    pub matches: i64,
}

/// A player's derived ranking row for one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Player ID
    pub player_id: PlayerId,
    /// Player name
    pub name: String,
    /// Matches won (byes included)
    pub wins: i64,
    /// Matches played (byes included)
    pub matches: i64,
    /// Sum of the wins of every distinct opponent faced
    pub opponent_match_wins: i64,
}

/// One pairing for the next round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub player_a: PlayerId,
    pub name_a: String,
    pub player_b: PlayerId,
    pub name_b: String,
}

impl Pairing {
    /// Pair two standings rows
    pub fn between(a: &Standing, b: &Standing) -> Self {
        Self {
            player_a: a.player_id,
            name_a: a.name.clone(),
            player_b: b.player_id,
            name_b: b.name.clone(),
        }
    }

    /// Whether `player_id` is on either side of this pairing
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player_a == player_id || self.player_b == player_id
    }
}

/// The outcome of pairing one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Pairs in formation order, highest-ranked anchor first
    pub pairings: Vec<Pairing>,
    /// Player awarded this round's bye, if the field was odd
    pub bye: Option<Player>,
}

impl Round {
    /// Number of players placed this round, bye included
    pub fn player_count(&self) -> usize {
        self.pairings.len() * 2 + usize::from(self.bye.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_of() {
        let m = MatchRecord::new(3, 7);
        assert_eq!(m.opponent_of(3), Some(7));
        assert_eq!(m.opponent_of(7), Some(3));
        assert_eq!(m.opponent_of(5), None);
    }

    #[test]
    fn test_is_between_either_order() {
        let m = MatchRecord::new(3, 7);
        assert!(m.is_between(3, 7));
        assert!(m.is_between(7, 3));
        assert!(!m.is_between(3, 4));
    }

    #[test]
    fn test_bye_match() {
        assert!(MatchRecord::new(4, BYE_PLAYER_ID).is_bye());
        assert!(!MatchRecord::new(BYE_PLAYER_ID, 4).is_bye());
        assert!(is_bye(0));
        assert!(!is_bye(1));
    }

    #[test]
    fn test_pairing_involves() {
        let a = Standing {
            player_id: 1,
            name: "Ann".to_string(),
            wins: 0,
            matches: 0,
            opponent_match_wins: 0,
        };
        let b = Standing {
            player_id: 2,
            name: "Bob".to_string(),
            ..a.clone()
        };
        let pairing = Pairing::between(&a, &b);
        assert!(pairing.involves(1));
        assert!(pairing.involves(2));
        assert!(!pairing.involves(3));
        assert_eq!(pairing.name_b, "Bob");
    }
}
