//! Subcommand parsing and execution.

use std::ffi::OsString;

use anyhow::Error;
use log::{error, info};
use pico_args::Arguments;
use serde::Serialize;
use swiss_pairing::{
    PgRecordStore, StoreError, SwissEngine,
    swiss::{Pairing, Player, PlayerId, Round, Standing, SwissError, TournamentId},
};
use thiserror::Error as ThisError;

/// Errors in the command line itself, as opposed to the engine
#[derive(Debug, ThisError)]
pub enum UsageError {
    #[error("missing subcommand (try --help)")]
    MissingCommand,

    #[error("unknown subcommand: {0}")]
    UnknownCommand(String),

    #[error("unknown reset target '{0}', expected matches, players or all")]
    UnknownResetTarget(String),

    #[error("unexpected arguments: {0:?}")]
    Unexpected(Vec<OsString>),

    #[error(transparent)]
    Args(#[from] pico_args::Error),
}

/// What `reset` clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    Matches,
    Players,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    CreateTournament { name: String },
    Tournaments,
    Register { tournament: TournamentId, name: String },
    Enroll { tournament: TournamentId, player: PlayerId },
    Report { tournament: TournamentId, winner: PlayerId, loser: PlayerId },
    Standings { tournament: TournamentId },
    Pairings { tournament: TournamentId },
    Count { tournament: Option<TournamentId> },
    Reset { target: ResetTarget, tournament: Option<TournamentId> },
}

impl Command {
    /// Parse the subcommand and its positional arguments. Options must
    /// already have been taken out of `pargs`.
    pub fn parse(mut pargs: Arguments) -> Result<Self, UsageError> {
        let Some(name) = pargs.subcommand()? else {
            return Err(UsageError::MissingCommand);
        };

        let command = match name.as_str() {
            "init" => Command::Init,
            "create-tournament" => Command::CreateTournament {
                name: pargs.free_from_str()?,
            },
            "tournaments" => Command::Tournaments,
            "register" => Command::Register {
                tournament: pargs.free_from_str()?,
                name: pargs.free_from_str()?,
            },
            "enroll" => Command::Enroll {
                tournament: pargs.free_from_str()?,
                player: pargs.free_from_str()?,
            },
            "report" => Command::Report {
                tournament: pargs.free_from_str()?,
                winner: pargs.free_from_str()?,
                loser: pargs.free_from_str()?,
            },
            "standings" => Command::Standings {
                tournament: pargs.free_from_str()?,
            },
            "pairings" => Command::Pairings {
                tournament: pargs.free_from_str()?,
            },
            "count" => Command::Count {
                tournament: pargs.opt_free_from_str()?,
            },
            "reset" => {
                let target = match pargs.opt_free_from_str::<String>()?.as_deref() {
                    None | Some("all") => ResetTarget::All,
                    Some("matches") => ResetTarget::Matches,
                    Some("players") => ResetTarget::Players,
                    Some(other) => return Err(UsageError::UnknownResetTarget(other.to_string())),
                };
                let tournament = if target == ResetTarget::Matches {
                    pargs.opt_free_from_str()?
                } else {
                    None
                };
                Command::Reset { target, tournament }
            }
            other => return Err(UsageError::UnknownCommand(other.to_string())),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(UsageError::Unexpected(remaining));
        }

        Ok(command)
    }
}

/// Execute a parsed command and print its result
pub async fn run(
    engine: &SwissEngine,
    store: &PgRecordStore,
    command: Command,
    json: bool,
) -> Result<(), Error> {
    match command {
        Command::Init => {
            store.init_schema().await?;
            info!("Schema ready");
            emit(json, &"ok", |_| println!("Schema initialized"))
        }
        Command::CreateTournament { name } => {
            let id = engine.create_tournament(&name).await?;
            emit(json, &id, |id| println!("{id}"))
        }
        Command::Tournaments => {
            let tournaments = engine.list_tournaments().await?;
            emit(json, &tournaments, |tournaments| {
                for t in tournaments {
                    println!("{:>6}  {}", t.id, t.name);
                }
            })
        }
        Command::Register { tournament, name } => {
            let id = engine.register_player(tournament, &name).await?;
            emit(json, &Player::new(id, name), |p| println!("{}", p.id))
        }
        Command::Enroll { tournament, player } => {
            engine.enroll_player(tournament, player).await?;
            emit(json, &"ok", |_| {
                println!("Player {player} enrolled in tournament {tournament}")
            })
        }
        Command::Report {
            tournament,
            winner,
            loser,
        } => {
            engine.report_match(tournament, winner, loser).await?;
            emit(json, &"ok", |_| println!("Recorded {winner} over {loser}"))
        }
        Command::Standings { tournament } => {
            let standings = engine.player_standings(tournament).await?;
            emit(json, &standings, |rows| print_standings(rows))
        }
        Command::Pairings { tournament } => {
            let round = engine.next_round(tournament).await?;
            emit(json, &round, print_round)
        }
        Command::Count { tournament } => {
            let count = engine.count_players(tournament).await?;
            emit(json, &count, |count| println!("{count}"))
        }
        Command::Reset { target, tournament } => {
            match target {
                ResetTarget::Matches => engine.delete_matches(tournament).await?,
                ResetTarget::Players => engine.delete_players().await?,
                ResetTarget::All => engine.delete_tournaments().await?,
            }
            emit(json, &"ok", |_| println!("Reset complete"))
        }
    }
}

/// Replace storage failures with a generic message, logging the details.
///
/// Input and pairing errors are shown as they are.
pub fn client_error(err: Error) -> Error {
    let swiss = match err.downcast::<SwissError>() {
        Ok(swiss) => swiss,
        Err(err) => match err.downcast::<StoreError>() {
            Ok(store) => SwissError::from(store),
            Err(err) => return err,
        },
    };
    if let SwissError::Store(store) = &swiss {
        error!("Store failure: {}", store);
    }
    anyhow::anyhow!(swiss.client_message())
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn print_standings(rows: &[Standing]) {
    println!(
        "{:>4}  {:>6}  {:<24} {:>4} {:>7} {:>4}",
        "#", "ID", "NAME", "W", "PLAYED", "OMW"
    );
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{:>4}  {:>6}  {:<24} {:>4} {:>7} {:>4}",
            rank + 1,
            row.player_id,
            row.name,
            row.wins,
            row.matches,
            row.opponent_match_wins
        );
    }
}

fn print_round(round: &Round) {
    for Pairing {
        player_a,
        name_a,
        player_b,
        name_b,
    } in &round.pairings
    {
        println!("{player_a:>6} {name_a:<24} vs {player_b:>6} {name_b}");
    }
    if let Some(bye) = &round.bye {
        println!("{:>6} {:<24} bye", bye.id, bye.name);
    }
}
