//! Swiss-system standings and pairing.
//!
//! This module provides:
//! - Standings ranked by wins, then opponent match wins (OMW)
//! - Rematch and bye history lookups
//! - Greedy next-round pairing with at most one bye per player
//! - [`SwissEngine`], the validated entry point over a record store
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swiss_pairing::db::MemoryRecordStore;
//! use swiss_pairing::swiss::SwissEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SwissEngine::new(Arc::new(MemoryRecordStore::new()));
//!
//!     let tid = engine.create_tournament("Club Night").await?;
//!     let ann = engine.register_player(tid, "Ann").await?;
//!     let bob = engine.register_player(tid, "Bob").await?;
//!     engine.report_match(tid, ann, bob).await?;
//!
//!     for row in engine.player_standings(tid).await? {
//!         println!("{} {} {}", row.name, row.wins, row.matches);
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod errors;
pub mod history;
pub mod models;
pub mod pairing;
pub mod standings;

pub use engine::SwissEngine;
pub use errors::{InputError, PairingError, SwissError, SwissResult};
pub use history::MatchHistory;
pub use models::{
    BYE_PLAYER_ID, BYE_PLAYER_NAME, MatchRecord, Pairing, Player, PlayerId, Round, Standing,
    Tournament, TournamentId, WinRecord,
};
pub use pairing::{GreedyPairing, PairingGenerator, PairingStrategy};
pub use standings::StandingsCalculator;
