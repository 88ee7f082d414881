//! Command-line driver for Swiss tournaments stored in PostgreSQL.

mod commands;

use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use swiss_pairing::{
    SwissEngine,
    db::{ConfigError, Database, DatabaseConfig},
};

use commands::Command;

const HELP: &str = "\
Run Swiss-system tournaments: register players, report results, pair rounds

USAGE:
  swiss [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  init                          Create tables, the standings view and the bye player
  create-tournament NAME        Create a tournament and print its ID
  tournaments                   List tournaments
  register TID NAME             Register a new player in tournament TID
  enroll TID PID                Add an existing player to tournament TID
  report TID WINNER LOSER       Record a match result
  standings TID                 Print ranked standings
  pairings TID                  Pair the next round (records a bye for odd fields)
  count [TID]                   Count players, in one tournament or overall
  reset [matches [TID]|players|all]
                                Delete matches, players, or everything [default: all]

OPTIONS:
  --db-url     URL              Database connection string  [default: env DATABASE_URL]
  --json                        Print results as JSON

FLAGS:
  -h, --help                    Print help information

ENVIRONMENT:
  DATABASE_URL                  PostgreSQL connection string
  DB_MAX_CONNECTIONS            Maximum pool size [default: 10]
  DB_QUERY_TIMEOUT_SECS         Per-query timeout [default: 5]
  RUST_LOG                      Log filter (e.g. info, swiss_pairing=debug)
";

struct Args {
    database_url: Option<String>,
    json: bool,
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url = pargs.opt_value_from_str("--db-url")?;
    let json = pargs.contains("--json");
    let args = Args {
        database_url,
        json,
        command: Command::parse(pargs)?,
    };

    env_logger::builder().format_target(false).init();

    let db_config = match args.database_url {
        Some(url) => match DatabaseConfig::from_env() {
            Ok(config) => config.with_url(url),
            Err(ConfigError::MissingRequired { .. }) => DatabaseConfig::development().with_url(url),
            Err(e) => return Err(e.into()),
        },
        None => DatabaseConfig::from_env()?,
    };
    db_config.validate()?;

    info!("Connecting to database");
    let db = Database::new(&db_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    db.health_check()
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;

    let store = db.record_store();
    let engine = SwissEngine::new(Arc::new(store.clone()));

    let result = commands::run(&engine, &store, args.command, args.json)
        .await
        .map_err(commands::client_error);
    db.close().await;
    result
}
