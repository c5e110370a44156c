use clap::{Parser, Subcommand};
use almanac_db::storage::PostgresStorage;

use crate::commands::CreateUserParams;

mod commands;

/// Operator tooling for an Almanac database.
#[derive(Parser)]
#[command(version)]
pub struct Args {
    #[clap(subcommand)]
    command: Command,

    #[clap(
        short = 'D',
        long,
        env = "ALMANAC_API_DATABASE_URL",
        default_value = "postgres://localhost/almanac"
    )]
    db_url: String,
}

#[derive(Clone, Subcommand)]
pub enum Command {
    /// Register a user without going through the HTTP API.
    #[command(name = "create-user")]
    CreateUser(CreateUserParams),

    /// Check that the database is reachable.
    #[command(name = "ping")]
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let stg = PostgresStorage::new(&args.db_url, 1);

    match args.command {
        Command::CreateUser(params) => commands::create_user(&stg, params).await,
        Command::Ping => commands::ping(&stg).await,
    }
}
