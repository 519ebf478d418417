//! Taskboard CLI - a command-line front end for a server-backed task board.
//!
//! Commands:
//! - `taskboard tasks [--column ID]`: List tasks
//! - `taskboard show <id>`: Fetch and show one task
//! - `taskboard add <title> [--description] [--status] [--due]`: Create a task
//! - `taskboard update <id> [--title] [--description] [--status] [--due]`: Change a task
//! - `taskboard move <id> <column>`: Move a task to another column
//! - `taskboard delete <id>`: Delete a task
//! - `taskboard columns`: List columns
//! - `taskboard column add <title>` / `column remove <id>`: Edit the column layout
//! - `taskboard shell`: Interactive session with `undo`, `refresh` and `activity`
//!
//! Environment variables:
//! - TASKBOARD_OWNER_ID, TASKBOARD_REMOTE__ENDPOINT, TASKBOARD_REMOTE__TOKEN, ...:
//!   override config file values
//! - RUST_LOG: override the log filter
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

mod cli;
mod commands;
mod error;
mod logging;
mod shell;
mod table;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Output;
use error::{CliError, Result};
use taskboard_sync::{BoardStore, OwnerId, SyncConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::configure_logging(cli.verbose, cli.debug, cli.quiet);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = SyncConfig::load(cli.config.as_deref())?;
    let owner = cli
        .owner
        .or_else(|| config.owner_id.clone())
        .map(OwnerId::from)
        .ok_or(CliError::NoOwner)?;

    let store = BoardStore::from_config(&config)?;
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Board(command) => {
            store.initialize(owner).await?;
            commands::run(&store, command, &out).await
        }
        Commands::Shell => {
            // The shell stays usable offline; `refresh` retries the load
            if let Err(e) = store.initialize(owner.clone()).await {
                eprintln!("Warning: {}", e);
            }
            shell::run(&store, owner, &out).await
        }
    }
}
