//! # Swiss Pairing
//!
//! Standings and next-round pairings for Swiss-system tournaments.
//!
//! Every player plays every round. Players are ranked by wins, with ties
//! broken by opponent match wins (the summed wins of everyone they have
//! faced), and each round pairs players with similar records who have not
//! met before. Odd fields hand one player a bye, which counts as a win and
//! is given to each player at most once.
//!
//! All tournament state lives in a [`RecordStore`]: PostgreSQL through
//! [`PgRecordStore`], or [`MemoryRecordStore`] for tests and embedding.
//! Standings are recomputed from the match records on every request.
//!
//! ## Core Modules
//!
//! - [`swiss`]: Standings, match history, pairing and the [`SwissEngine`] facade
//! - [`db`]: Record store trait, PostgreSQL and in-memory stores, pool configuration
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use swiss_pairing::{MemoryRecordStore, SwissEngine};
//!
//! # tokio_test_block(async {
//! let engine = SwissEngine::new(Arc::new(MemoryRecordStore::new()));
//! let tid = engine.create_tournament("Open").await.unwrap();
//! engine.register_player(tid, "Ann").await.unwrap();
//! engine.register_player(tid, "Bob").await.unwrap();
//!
//! let pairings = engine.swiss_pairings(tid).await.unwrap();
//! assert_eq!(pairings.len(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

/// Record stores and database configuration.
pub mod db;
pub use db::{
    Database, DatabaseConfig, MemoryRecordStore, PgRecordStore, RecordStore, StoreError,
    StoreResult,
};

/// Swiss standings, pairing and the engine facade.
pub mod swiss;
pub use swiss::{
    BYE_PLAYER_ID, GreedyPairing, InputError, Pairing, PairingError, PairingStrategy, Player,
    PlayerId, Round, Standing, SwissEngine, SwissError, SwissResult, Tournament, TournamentId,
};
